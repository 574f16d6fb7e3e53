//! ThrowSet: the ordered throws currently used for triangulation

use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::core::event::{Disposable, Subject, Subscription};
use crate::core::lock::ModificationLock;
use crate::core::std_profile::StdProfile;
use crate::core::throw::Throw;

struct Entry {
    throw: Arc<Throw>,
    subscription: Subscription,
}

impl Entry {
    fn release(self) -> Arc<Throw> {
        self.subscription.dispose();
        self.throw.dispose();
        self.throw
    }
}

/// Ordered collection of throws.
///
/// `when_modified` fires on every membership change and whenever a member
/// throw reports a modification.
pub struct ThrowSet {
    entries: Mutex<Vec<Entry>>,
    modified: Subject<()>,
    std_profile: Option<Arc<dyn StdProfile>>,
    lock: ModificationLock,
}

impl ThrowSet {
    pub fn new(lock: &ModificationLock) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            modified: Subject::new(),
            std_profile: None,
            lock: lock.clone(),
        }
    }

    /// Set that binds every added throw to `profile`
    pub fn with_std_profile(lock: &ModificationLock, profile: Arc<dyn StdProfile>) -> Self {
        Self {
            std_profile: Some(profile),
            ..Self::new(lock)
        }
    }

    pub fn add(&self, throw: Arc<Throw>) {
        if let Some(profile) = &self.std_profile {
            throw.set_std_profile(Arc::clone(profile));
        }
        let subject = self.modified.clone();
        let lock = self.lock.clone();
        let subscription = throw.when_modified().subscribe(move |_| {
            let subject = subject.clone();
            lock.notify_when_released(move || subject.notify(&()));
        });

        let len = {
            let mut entries = self.entries.lock();
            entries.push(Entry {
                throw,
                subscription,
            });
            entries.len()
        };
        debug!(len, "throw added");
        self.notify_modified();
    }

    /// Remove and dispose the throw at `index`
    pub fn remove(&self, index: usize) -> Option<Arc<Throw>> {
        let entry = {
            let mut entries = self.entries.lock();
            if index >= entries.len() {
                return None;
            }
            entries.remove(index)
        };
        let throw = entry.release();
        debug!(index, "throw removed");
        self.notify_modified();
        Some(throw)
    }

    /// Remove and dispose the most recent throw
    pub fn pop(&self) -> Option<Arc<Throw>> {
        let entry = self.entries.lock().pop()?;
        let throw = entry.release();
        debug!("last throw removed");
        self.notify_modified();
        Some(throw)
    }

    /// Remove and dispose every throw; silent when already empty
    pub fn clear(&self) {
        let entries = std::mem::take(&mut *self.entries.lock());
        if entries.is_empty() {
            return;
        }
        let count = entries.len();
        for entry in entries {
            entry.release();
        }
        debug!(count, "throw set cleared");
        self.notify_modified();
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<Arc<Throw>> {
        self.entries
            .lock()
            .get(index)
            .map(|entry| Arc::clone(&entry.throw))
    }

    pub fn last(&self) -> Option<Arc<Throw>> {
        self.entries
            .lock()
            .last()
            .map(|entry| Arc::clone(&entry.throw))
    }

    /// Snapshot of the throws in insertion order
    pub fn throws(&self) -> Vec<Arc<Throw>> {
        self.entries
            .lock()
            .iter()
            .map(|entry| Arc::clone(&entry.throw))
            .collect()
    }

    pub fn when_modified(&self) -> &Subject<()> {
        &self.modified
    }

    fn notify_modified(&self) {
        let subject = self.modified.clone();
        self.lock.notify_when_released(move || subject.notify(&()));
    }
}

impl Disposable for ThrowSet {
    /// Release every member without notifying
    fn dispose(&self) {
        let entries = std::mem::take(&mut *self.entries.lock());
        for entry in entries {
            entry.release();
        }
    }
}

impl fmt::Debug for ThrowSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ThrowSet")
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! Shared modification lock and the fields that write through it
//!
//! One `ModificationLock` is created by whoever owns a group of fields and is
//! handed to each of them. A writer holds the lock for a whole batch of updates;
//! change notifications raised during the batch are queued and delivered, in
//! order, once the outermost guard is released. Readers that take the same lock
//! never see a batch half-written.

use parking_lot::{Mutex, ReentrantMutex, ReentrantMutexGuard};
use std::cell::RefCell;
use std::fmt;
use std::sync::Arc;

use crate::core::event::{Disposable, Observable, Subject, Subscription};

type Deferred = Box<dyn FnOnce() + Send>;

#[derive(Default)]
struct LockState {
    depth: usize,
    pending: Vec<Deferred>,
}

/// Cloneable handle to one shared, re-entrant write lock
#[derive(Clone, Default)]
pub struct ModificationLock {
    inner: Arc<ReentrantMutex<RefCell<LockState>>>,
}

impl ModificationLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter a batch. Nested calls on the same thread are allowed; other threads
    /// block until the outermost guard is dropped.
    pub fn acquire(&self) -> ModificationGuard<'_> {
        let guard = self.inner.lock();
        guard.borrow_mut().depth += 1;
        ModificationGuard { guard: Some(guard) }
    }

    /// Run `notify` now, or after the current batch if one is open
    pub fn notify_when_released<F: FnOnce() + Send + 'static>(&self, notify: F) {
        let guard = self.inner.lock();
        if guard.borrow().depth > 0 {
            guard.borrow_mut().pending.push(Box::new(notify));
            return;
        }
        drop(guard);
        notify();
    }

    /// Do both handles refer to the same lock?
    pub fn same_as(&self, other: &ModificationLock) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for ModificationLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModificationLock").finish_non_exhaustive()
    }
}

/// Scoped batch; queued notifications fire when the outermost guard drops
pub struct ModificationGuard<'a> {
    guard: Option<ReentrantMutexGuard<'a, RefCell<LockState>>>,
}

impl Drop for ModificationGuard<'_> {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        let pending = {
            let mut state = guard.borrow_mut();
            state.depth -= 1;
            if state.depth == 0 {
                std::mem::take(&mut state.pending)
            } else {
                Vec::new()
            }
        };
        drop(guard);
        for notify in pending {
            notify();
        }
    }
}

// =============================================================================
// LOCKABLE FIELD
// =============================================================================

/// A value-or-absent slot written under a shared `ModificationLock`
pub struct LockableField<T> {
    value: Mutex<Option<T>>,
    subject: Subject<Option<T>>,
    lock: ModificationLock,
}

impl<T> fmt::Debug for LockableField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LockableField")
            .field("present", &self.value.lock().is_some())
            .field("subscribers", &self.subject.subscriber_count())
            .finish()
    }
}

impl<T: Clone + Send + Sync + 'static> LockableField<T> {
    /// Empty field sharing `lock`
    pub fn new(lock: &ModificationLock) -> Self {
        Self {
            value: Mutex::new(None),
            subject: Subject::new(),
            lock: lock.clone(),
        }
    }

    pub fn get(&self) -> Option<T> {
        self.value.lock().clone()
    }

    pub fn is_present(&self) -> bool {
        self.value.lock().is_some()
    }

    /// Write under the lock, then notify subscribers. Notifies even when the
    /// value did not change.
    pub fn set(&self, value: Option<T>) {
        let _guard = self.lock.acquire();
        *self.value.lock() = value.clone();
        let subject = self.subject.clone();
        self.lock
            .notify_when_released(move || subject.notify(&value));
    }

    pub fn subscribe<F>(&self, callback: F) -> Subscription
    where
        F: Fn(&Option<T>) + Send + Sync + 'static,
    {
        self.subject.subscribe(callback)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subject.subscriber_count()
    }

    pub fn lock(&self) -> &ModificationLock {
        &self.lock
    }
}

impl<T: Disposable + Clone + Send + Sync + 'static> LockableField<T> {
    /// Dispose the current value (if any), then write `value`
    pub fn replace_disposing(&self, value: Option<T>) {
        if let Some(previous) = self.get() {
            previous.dispose();
        }
        self.set(value);
    }

    /// Dispose the current value without clearing or notifying
    pub fn dispose_value(&self) {
        if let Some(current) = self.get() {
            current.dispose();
        }
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> for LockableField<T> {
    fn get(&self) -> Option<T> {
        LockableField::get(self)
    }

    fn subscribe(&self, callback: Box<dyn Fn(&Option<T>) + Send + Sync>) -> Subscription {
        self.subject.subscribe(move |value| callback(value))
    }
}

// =============================================================================
// TESTS
// =============================================================================

//! Contextual clues available before any throw (currently: a fossil)

use tracing::debug;

use crate::core::event::Observable;
use crate::core::lock::{LockableField, ModificationLock};
use crate::types::Fossil;

/// Holder of the fossil clue
#[derive(Debug)]
pub struct DivineContext {
    fossil: LockableField<Fossil>,
}

impl DivineContext {
    pub fn new(lock: &ModificationLock) -> Self {
        Self {
            fossil: LockableField::new(lock),
        }
    }

    /// Fossil observable; fires on every set or clear
    pub fn fossil(&self) -> &dyn Observable<Fossil> {
        &self.fossil
    }

    pub fn current_fossil(&self) -> Option<Fossil> {
        self.fossil.get()
    }

    pub fn set_fossil(&self, fossil: Fossil) {
        debug!(x = fossil.x, "fossil set");
        self.fossil.set(Some(fossil));
    }

    pub fn clear_fossil(&self) {
        self.fossil.set(None);
    }
}

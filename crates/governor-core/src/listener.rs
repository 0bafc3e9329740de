//! Application listeners and the single-slot registration cell

use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

/// Receives characteristic value changes.
///
/// Errors returned here are logged by the relay and never reach the caller
/// of any governor operation.
pub trait ValueListener: Send + Sync {
    fn changed(&self, value: &[u8]) -> anyhow::Result<()>;
}

impl<F> ValueListener for F
where
    F: Fn(&[u8]) -> anyhow::Result<()> + Send + Sync,
{
    fn changed(&self, value: &[u8]) -> anyhow::Result<()> {
        self(value)
    }
}

/// At most one registered listener; last registration wins.
///
/// Reads hand out a clone of the current listener so the callback always
/// runs outside the lock.
#[derive(Default)]
pub struct ListenerSlot {
    listener: RwLock<Option<Arc<dyn ValueListener>>>,
}

impl ListenerSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `listener`, replacing any previous one
    pub fn set(&self, listener: Arc<dyn ValueListener>) {
        let mut slot = self.listener.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(listener);
    }

    /// Empty the slot; returns whether a listener was registered
    pub fn clear(&self) -> bool {
        let mut slot = self.listener.write().unwrap_or_else(PoisonError::into_inner);
        slot.take().is_some()
    }

    /// Snapshot of the registered listener
    pub fn current(&self) -> Option<Arc<dyn ValueListener>> {
        self.listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.listener
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_none()
    }
}

impl fmt::Debug for ListenerSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSlot")
            .field("registered", &!self.is_empty())
            .finish()
    }
}

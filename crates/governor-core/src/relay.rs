//! Fan-out of transport notifications to the registered listener

use crate::address::Address;
use crate::listener::ListenerSlot;
use crate::transport::Notification;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, trace};

/// Adapter installed on a bound characteristic while notifications are on.
///
/// A relay is created on every init and never reused across bindings. Once
/// closed it drops every delivery, even if a stale object still holds it.
/// Delivery is best-effort with no retry and no ordering against concurrent
/// reads or writes.
pub struct NotificationRelay {
    address: Address,
    listeners: Arc<ListenerSlot>,
    closed: AtomicBool,
}

impl NotificationRelay {
    pub(crate) fn new(address: Address, listeners: Arc<ListenerSlot>) -> Self {
        Self {
            address,
            listeners,
            closed: AtomicBool::new(false),
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    /// Stop delivering. Not reversible.
    pub(crate) fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Notification for NotificationRelay {
    fn notify(&self, value: &[u8]) {
        if self.is_closed() {
            trace!(address = %self.address, "Relay closed, dropping notification");
            return;
        }

        let Some(listener) = self.listeners.current() else {
            trace!(address = %self.address, "No listener registered, dropping notification");
            return;
        };

        match panic::catch_unwind(AssertUnwindSafe(|| listener.changed(value))) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(
                    address = %self.address,
                    error = %e,
                    "Execution error of a characteristic listener"
                );
            }
            Err(_) => {
                error!(address = %self.address, "Characteristic listener panicked");
            }
        }
    }
}

impl std::fmt::Debug for NotificationRelay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationRelay")
            .field("address", &self.address)
            .field("closed", &self.is_closed())
            .finish()
    }
}

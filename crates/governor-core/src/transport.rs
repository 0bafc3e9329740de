//! Boundary toward the external resolver and transport
//!
//! Nothing in this module talks to a radio. Implementations live with the
//! transport (BlueZ over D-Bus, a vendor stack, or the in-memory doubles in
//! [`crate::testing`]).

use crate::address::Address;
use crate::error::TransportError;
use crate::flags::CharacteristicFlags;
use async_trait::async_trait;
use std::sync::Arc;

/// Looks up the live remote object for an address.
///
/// Returning `None` means the object is not reachable right now. Resolvers
/// are not required to cache; the governor does that.
#[async_trait]
pub trait Resolver<O: ?Sized + Send + Sync>: Send + Sync {
    async fn resolve(&self, address: &Address) -> Option<Arc<O>>;
}

/// Sink for raw value-change events.
///
/// Called from the transport's own callback context, concurrently with any
/// governor operation.
pub trait Notification: Send + Sync {
    fn notify(&self, value: &[u8]);
}

/// A live characteristic handle.
///
/// The handle may become invalid at any time; every call may fail with a
/// [`TransportError`].
#[async_trait]
pub trait Characteristic: Send + Sync {
    /// Capabilities reported by the peripheral
    async fn flags(&self) -> Result<CharacteristicFlags, TransportError>;

    /// Whether value-change events are currently enabled on the peripheral
    async fn is_notifying(&self) -> Result<bool, TransportError>;

    /// Enable value-change events, delivering them to `notification`
    async fn enable_value_notifications(
        &self,
        notification: Arc<dyn Notification>,
    ) -> Result<(), TransportError>;

    /// Disable value-change events and drop the registered sink
    async fn disable_value_notifications(&self) -> Result<(), TransportError>;

    async fn read_value(&self) -> Result<Vec<u8>, TransportError>;

    /// Write a value; `Ok(false)` means the peripheral did not acknowledge it
    async fn write_value(&self, data: &[u8]) -> Result<bool, TransportError>;
}

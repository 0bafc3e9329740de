//! Gatt Governor Core: access lifecycle for intermittently available characteristics
//!
//! # Overview
//!
//! A peripheral on a low-energy link comes and goes. This crate gives callers
//! a stable handle (a *governor*) for one remote characteristic whose live
//! connection may vanish and reappear between any two calls. It provides:
//!
//! - **Lazy binding**: the live object is resolved on first use and cached
//!   until disposal or detected loss
//! - **Init/dispose lifecycle**: init runs once per binding, dispose undoes
//!   it and is safe to repeat
//! - **Notification relay**: value-change events are fanned out to a single
//!   application listener; listener failures are logged, never propagated
//! - **Capability queries and read/write** against whatever object is
//!   currently bound
//!
//! # Key Principles
//!
//! This crate is **pure logic**. Discovery, connection establishment and the
//! wire protocol belong to the transport, reached through the traits in
//! [`transport`]. Retry and backoff belong to the owning manager.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │         Your Application                │
//! └─────────────┬───────────────────────────┘
//!               │ read / write / flags / listener
//!               ▼
//! ┌─────────────────────────────────────────┐
//! │       Governor<B: Bindable>             │  ← Lazy binding, init/dispose
//! │  (one per Address, serialized binding)  │
//! └─────────────┬───────────────────────────┘
//!               │ resolve(Address)
//!               ▼
//! ┌─────────────────────────────────────────┐
//! │       Resolver / Characteristic         │  ← External transport
//! └─────────────┬───────────────────────────┘
//!               │ raw value events
//!               ▼
//! ┌─────────────────────────────────────────┐
//! │       NotificationRelay                 │  ← Best-effort fan-out
//! │  (fresh per init, single listener)      │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Usage Example
//!
//! ```
//! use gatt_governor_core::testing::{MockCharacteristic, MockResolver};
//! use gatt_governor_core::{Address, CharacteristicFlags, CharacteristicGovernor};
//! use std::sync::Arc;
//!
//! # async fn example() -> gatt_governor_core::Result<()> {
//! let address = Address::new("AA:BB:CC:DD:EE:FF", "180f", "2a19");
//! let resolver = Arc::new(MockResolver::new());
//! resolver.insert(
//!     address.clone(),
//!     Arc::new(MockCharacteristic::new(CharacteristicFlags::READ).with_value(vec![87])),
//! );
//!
//! let governor = CharacteristicGovernor::characteristic(address, resolver);
//! let level = governor.read().await?;
//! assert_eq!(level, vec![87]);
//! # Ok(())
//! # }
//! ```

pub mod address;
pub mod characteristic;
pub mod error;
pub mod flags;
pub mod governor;
pub mod listener;
pub mod relay;
pub mod testing;
pub mod transport;

// Re-export main types for convenience
pub use address::Address;
pub use characteristic::{CharacteristicBinding, CharacteristicGovernor};
pub use error::{GovernorError, Result, TransportError};
pub use flags::CharacteristicFlags;
pub use governor::{Bindable, Governor, ObjectKind};
pub use listener::{ListenerSlot, ValueListener};
pub use relay::NotificationRelay;
pub use transport::{Characteristic, Notification, Resolver};

/// Prelude module for convenient imports
///
/// # Example
/// ```
/// use gatt_governor_core::prelude::*;
/// ```
pub mod prelude {
    pub use super::address::Address;
    pub use super::characteristic::CharacteristicGovernor;
    pub use super::error::{GovernorError, TransportError};
    pub use super::flags::CharacteristicFlags;
    pub use super::governor::{Bindable, Governor, ObjectKind};
    pub use super::listener::ValueListener;
    pub use super::transport::{Characteristic, Notification, Resolver};
}

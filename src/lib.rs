/*!
 * Gatt Governor - stable handles for intermittently available BLE characteristics
 *
 * Wraps the pure lifecycle logic of `gatt-governor-core` with:
 * - TOML configuration
 * - Structured logging via `tracing`
 * - An owning manager that registers governors, detects lost bindings and
 *   refreshes them periodically
 */

pub mod config;
pub mod error;
pub mod logging;
pub mod manager;

// Re-export commonly used types
pub use config::{Config, LogLevel};
pub use error::{Error, Result};
pub use gatt_governor_core::{
    Address, Characteristic, CharacteristicFlags, CharacteristicGovernor, GovernorError,
    Resolver, TransportError, ValueListener,
};
pub use manager::{GovernorManager, RefreshSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
    }
}

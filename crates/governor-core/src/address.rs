//! Stable identity of a remote characteristic

use serde::{Deserialize, Serialize};
use std::fmt;

/// Immutable identifier of a characteristic exposed by a peripheral.
///
/// Used as governor identity and as the lookup key toward the resolver.
/// The components are opaque strings; this crate never interprets them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address {
    /// Peripheral identity (e.g. a MAC address)
    device: String,

    /// Service identity (e.g. a UUID)
    service: String,

    /// Characteristic identity (e.g. a UUID)
    characteristic: String,
}

impl Address {
    /// Create a new characteristic address
    pub fn new(
        device: impl Into<String>,
        service: impl Into<String>,
        characteristic: impl Into<String>,
    ) -> Self {
        Self {
            device: device.into(),
            service: service.into(),
            characteristic: characteristic.into(),
        }
    }

    pub fn device(&self) -> &str {
        &self.device
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    pub fn characteristic(&self) -> &str {
        &self.characteristic
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}/{}", self.device, self.service, self.characteristic)
    }
}

/*!
 * Error types for Gatt Governor
 */

use gatt_governor_core::{Address, GovernorError};
use std::io;
use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Invalid or inconsistent configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Logging could not be initialised
    #[error("Logging error: {0}")]
    Logging(String),

    /// No governor is registered for the address
    #[error("No governor registered for {0}")]
    GovernorNotFound(Address),

    /// Error surfaced by a governor operation
    #[error(transparent)]
    Governor(#[from] GovernorError),
}

impl Error {
    /// Check if this error is fatal (should not retry)
    pub fn is_fatal(&self) -> bool {
        match self {
            Error::Config(_) => true,
            Error::ConfigParse { .. } => true,
            Error::Logging(_) => true,
            Error::GovernorNotFound(_) => true,
            Error::Io(_) => false,
            Error::Governor(e) => !e.is_recoverable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_governor_errors_keep_recoverability() {
        let address = Address::new("00:11:22:33:44:55", "180a", "2a29");
        let not_ready: Error = GovernorError::NotReady(address.clone()).into();
        let not_bound: Error = GovernorError::NotBound(address.clone()).into();

        assert!(!not_ready.is_fatal());
        assert!(not_bound.is_fatal());
        assert!(Error::GovernorNotFound(address).is_fatal());
    }

    #[test]
    fn test_transparent_display() {
        let address = Address::new("00:11:22:33:44:55", "180a", "2a29");
        let err: Error = GovernorError::NotReady(address).into();
        assert_eq!(err.to_string(), "/00:11:22:33:44:55/180a/2a29 is not ready");
    }
}

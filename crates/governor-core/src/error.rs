//! Error types for governed access to remote characteristics

use crate::address::Address;
use thiserror::Error;

/// Failure reported by the external transport for a single call against a
/// bound object.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The link to the peripheral dropped while the call was in flight
    #[error("link to peripheral lost: {0}")]
    Disconnected(String),

    /// The transport gave up waiting for the peripheral
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// The peripheral answered but refused the operation
    #[error("operation rejected by peripheral: {0}")]
    Rejected(String),

    /// Any other wire-level failure
    #[error("transport failure: {0}")]
    Failed(String),
}

impl TransportError {
    /// Check if this error is transient (the same call may succeed later)
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Disconnected(_) => true,
            TransportError::Timeout(_) => true,
            TransportError::Failed(_) => true,
            TransportError::Rejected(_) => false,
        }
    }
}

/// Errors surfaced by governor operations
#[derive(Error, Debug)]
pub enum GovernorError {
    /// No binding can currently be established (peripheral unreachable)
    #[error("{0} is not ready")]
    NotReady(Address),

    /// An operation was attempted on a governor that was never bound
    #[error("governor for {0} is not initialized")]
    NotBound(Address),

    /// A call against the bound object failed at the wire level
    #[error("transport error on {address}: {source}")]
    Transport {
        address: Address,
        #[source]
        source: TransportError,
    },
}

impl GovernorError {
    /// Whether the caller may retry the same operation later.
    ///
    /// `NotBound` signals incorrect usage order and is never worth retrying.
    pub fn is_recoverable(&self) -> bool {
        match self {
            GovernorError::NotReady(_) => true,
            GovernorError::NotBound(_) => false,
            GovernorError::Transport { source, .. } => source.is_transient(),
        }
    }

    /// Address of the governor that produced this error
    pub fn address(&self) -> &Address {
        match self {
            GovernorError::NotReady(address)
            | GovernorError::NotBound(address)
            | GovernorError::Transport { address, .. } => address,
        }
    }
}

pub type Result<T> = std::result::Result<T, GovernorError>;

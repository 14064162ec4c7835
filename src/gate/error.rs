use std::time::Duration;

use thiserror::Error;

/// Errors returned by gate operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GateError {
    /// `publish` was called on a gate that already holds a value.
    #[error("gate has already been published")]
    AlreadyPublished,
    /// A bounded wait expired before anything was published.
    #[error("timed out after {waited:?} waiting for the gate to be published")]
    Timeout { waited: Duration },
}

impl GateError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, GateError::Timeout { .. })
    }
}

/// Result type for gate operations
pub type GateResult<T> = std::result::Result<T, GateError>;

//! Core error model.

use thiserror::Error;

/// Core-level error.
///
/// Keep this focused on deterministic value failures (blank ids). Authorization
/// outcomes are never errors; they are booleans.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// An identifier was invalid (e.g. blank).
    #[error("invalid identifier: {0}")]
    InvalidId(String),
}

impl CoreError {
    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }
}

//! Error types for the flowdex facade.
//!
//! This module provides a unified error type that wraps errors from the
//! underlying subsystems: the reducer kernel and the state store.

use thiserror::Error;

use flowdex_kernel::ReduceError;
use flowdex_store::StoreError;

/// Result type for flowdex operations.
pub type Result<T> = std::result::Result<T, FlowdexError>;

/// Errors that can occur during flowdex operations.
#[derive(Debug, Error)]
pub enum FlowdexError {
    /// Error from the reducer (validation, ordering, identity).
    #[error("reduce error: {0}")]
    Reduce(#[from] ReduceError),

    /// Error from the state store (journal I/O, corruption).
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Internal invariant failure (e.g. a poisoned lock).
    #[error("internal error: {0}")]
    Internal(String),
}

impl FlowdexError {
    /// Creates an internal error with the given message.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }
}

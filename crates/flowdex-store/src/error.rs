//! Storage error types.

use std::io;

/// Errors that can occur during state store operations.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// Filesystem I/O error.
    #[error("filesystem error: {0}")]
    Fs(#[from] io::Error),

    /// The journal data was truncated mid-record.
    #[error("unexpected end of journal")]
    UnexpectedEof,

    /// A journal record failed its integrity checks.
    #[error("corrupted journal record at sequence {seq}: {reason}")]
    Corrupted { seq: u64, reason: &'static str },

    /// Write set payload could not be encoded or decoded.
    #[error("journal payload codec error: {0}")]
    Codec(#[from] serde_json::Error),
}

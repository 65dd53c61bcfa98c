//! Error types for storage operations.

use std::io;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Keys must contain at least one byte.
    #[error("empty keys are not allowed")]
    EmptyKey,

    /// A key or value is too large to be framed.
    #[error("entry too large: {len} bytes (max {max})")]
    EntryTooLarge {
        /// The offending length.
        len: usize,
        /// The maximum supported length.
        max: usize,
    },

    /// The storage file is corrupted.
    #[error("storage corrupted: {0}")]
    Corrupted(String),

    /// Another process holds the storage lock.
    #[error("storage locked: another process has exclusive access")]
    Locked,
}

//! Error types for shelfdb core.

use crate::external::ConvertError;
use crate::query::QueryError;
use std::io;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in shelfdb core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] shelfdb_storage::StorageError),

    /// Record codec error.
    #[error("codec error: {0}")]
    Codec(#[from] shelfdb_codec::CodecError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid store configuration.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the problem.
        message: String,
    },

    /// Insert probing exhausted the probe bound without finding a slot.
    #[error("store full: no slot for key {key:?} within the probe bound")]
    StoreFull {
        /// The key that could not be placed.
        key: String,
    },

    /// A slot could not be restored while rolling back a failed flush.
    #[error("rollback failed: {message}")]
    RollbackFailed {
        /// Description of the failure.
        message: String,
    },

    /// Snapshot serialization or deserialization failed.
    #[error("snapshot error: {message}")]
    Snapshot {
        /// Description of the failure.
        message: String,
    },

    /// A store received a datum of the wrong variant.
    #[error("datum mismatch: store holds {expected}, got {actual}")]
    DatumMismatch {
        /// The variant the store holds.
        expected: &'static str,
        /// The variant that was offered.
        actual: &'static str,
    },

    /// No store is registered under the requested name.
    #[error("unknown store: {name:?}")]
    UnknownStore {
        /// The unresolved destination name.
        name: String,
    },

    /// External payload conversion failed.
    #[error("conversion error: {0}")]
    Convert(#[from] ConvertError),

    /// The textual query was malformed.
    #[error("query error: {0}")]
    Query(#[from] QueryError),
}

impl CoreError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Creates a rollback failure error.
    pub fn rollback_failed(message: impl Into<String>) -> Self {
        Self::RollbackFailed {
            message: message.into(),
        }
    }

    /// Creates a snapshot error.
    pub fn snapshot(message: impl Into<String>) -> Self {
        Self::Snapshot {
            message: message.into(),
        }
    }
}

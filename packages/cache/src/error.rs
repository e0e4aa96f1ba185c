// ABOUTME: Error types for snapshot persistence
// ABOUTME: Refresh failures are recorded on entries instead and never surface here

use cloudlens_storage::StorageError;
use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

#[derive(Error, Debug)]
pub enum CacheError {
    /// A persisted record could not be decoded; it is discarded, never fatal.
    #[error("Corrupt snapshot {key}: {reason}")]
    PersistenceCorrupt { key: String, reason: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl CacheError {
    pub(crate) fn corrupt(key: impl Into<String>, reason: impl ToString) -> Self {
        Self::PersistenceCorrupt {
            key: key.into(),
            reason: reason.to_string(),
        }
    }
}

//! Storage error types

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// RocksDB error
    #[cfg(feature = "rocksdb")]
    #[error("rocksdb error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    /// Referenced row missing
    #[error("not found: {0}")]
    NotFound(String),

    /// Row with the same identity already present
    #[error("duplicate: {0}")]
    Duplicate(String),

    /// Stored row cannot be decoded
    #[error("corrupt row: {0}")]
    Corrupt(String),

    /// Invalid column family
    #[error("invalid column family: {0}")]
    InvalidColumnFamily(String),
}

impl From<rlp::DecoderError> for StorageError {
    fn from(e: rlp::DecoderError) -> Self {
        StorageError::Corrupt(e.to_string())
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

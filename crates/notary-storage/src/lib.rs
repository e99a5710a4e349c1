//! # notary-storage
//!
//! State repository for the certificate notary.
//!
//! This crate provides:
//! - The repository contract ([`RepositoryReader`], [`RepositoryWriter`], [`Repository`])
//! - Staged batches committed atomically ([`StagedBatch`])
//! - An in-memory backend ([`MemoryRepository`])
//! - A RocksDB backend (`RocksRepository`, behind the `rocksdb` feature)

#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(feature = "rocksdb")]
pub mod db;
pub mod error;
pub mod keys;
pub mod memory;
pub mod rows;
pub mod staged;
pub mod traits;

#[cfg(feature = "rocksdb")]
pub use db::{DbConfig, RocksRepository};
pub use error::{StorageError, StorageResult};
pub use keys::{BootstrapKey, CertificateKey, HistoryKey};
pub use memory::{MemoryRepository, Tables};
pub use staged::{Changes, StagedBatch};
pub use traits::{Repository, RepositoryReader, RepositoryWriter};

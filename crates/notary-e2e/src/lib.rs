//! # notary-e2e
//!
//! End-to-end testing framework for the certificate notary.
//!
//! Transactions assembled by the operation API are confirmed on a
//! [`SimulatedLedger`], turned into feed outputs and ingested by the
//! indexer, closing the loop between assembly and the mirror.
//!
//! ## Usage
//!
//! ```ignore
//! cargo test -p notary-e2e
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod builder;
mod harness;
mod ledger;
mod scenarios;

pub use builder::{certificate, ChannelBuilder};
pub use harness::{test_scripts, TestHarness, TestUser, FUNDED_LOVELACE, GENESIS_SLOT, TEST_NETWORK_ID};
pub use ledger::SimulatedLedger;

/// Test result
pub type E2EResult<T> = Result<T, E2EError>;

/// E2E test errors
#[derive(Debug, thiserror::Error)]
pub enum E2EError {
    /// Setup failed
    #[error("setup failed: {0}")]
    Setup(String),

    /// The simulated ledger rejected a transaction
    #[error("transaction rejected: {0}")]
    Rejected(String),

    /// Assertion failed
    #[error("assertion failed: {0}")]
    Assertion(String),

    /// Assembly error
    #[error("assembly error: {0}")]
    Tx(#[from] notary_tx::TxError),

    /// Ingestion error
    #[error("ingest error: {0}")]
    Ingest(#[from] notary_core::IngestError),

    /// Storage error
    #[error("storage error: {0}")]
    Storage(#[from] notary_storage::StorageError),
}

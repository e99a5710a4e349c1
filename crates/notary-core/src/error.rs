//! Ingestion and rollback error types

use notary_primitives::PolicyId;
use notary_storage::StorageError;
use thiserror::Error;

/// Errors that abort an ingestion or rollback batch.
///
/// Undecodable datums are not errors: the output is logged, counted and skipped.
#[derive(Debug, Error)]
pub enum IngestError {
    /// A token policy moved by something other than +1 or -1
    #[error("protocol violation: policy {policy} asset {asset} quantity {quantity}")]
    ProtocolViolation {
        /// Token policy
        policy: PolicyId,
        /// Asset name (hex)
        asset: String,
        /// Observed quantity
        quantity: i64,
    },

    /// A state token was minted under a channel the mirror does not know
    #[error("missing bootstrap channel: {0}")]
    MissingBootstrap(String),

    /// A registered extension rejected the batch
    #[error("extension {name} failed: {reason}")]
    Extension {
        /// Extension name
        name: String,
        /// Failure description
        reason: String,
    },

    /// Repository failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for ingestion and rollback
pub type IngestResult<T> = Result<T, IngestError>;

//! Transaction assembly error types

use notary_datum::EncodeError;
use notary_primitives::AddressError;
use notary_storage::StorageError;
use thiserror::Error;

/// Errors returned by the operation API
#[derive(Debug, Error)]
pub enum TxError {
    /// Referenced channel, state record or spendable input does not exist
    #[error("not found: {0}")]
    NotFound(String),

    /// No payment credential could be extracted from an address
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// Channel name already held by a live channel
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Request rejected before touching the ledger
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Ledger client I/O failure
    #[error("ledger unavailable: {0}")]
    Transient(String),

    /// Repository failure
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Payload encoding failure
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),
}

impl TxError {
    /// Whether the caller may retry the same request unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, TxError::Transient(_))
    }
}

impl From<AddressError> for TxError {
    fn from(e: AddressError) -> Self {
        TxError::InvalidAddress(e.to_string())
    }
}

/// Result type for transaction assembly
pub type TxResult<T> = Result<T, TxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(TxError::Transient("timeout".into()).is_retryable());
        assert!(!TxError::NotFound("state".into()).is_retryable());
        assert!(!TxError::AlreadyExists("main".into()).is_retryable());
    }

    #[test]
    fn test_address_error_maps_to_invalid_address() {
        let err: TxError = AddressError::NoPaymentCredential(0xe).into();
        assert!(matches!(err, TxError::InvalidAddress(_)));
    }
}

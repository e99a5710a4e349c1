//! Datum codec error types

use thiserror::Error;

/// Malformed datum payload. Never retried: the payload will not change.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// CBOR syntax error
    #[error("cbor error: {0}")]
    Cbor(String),

    /// CBOR value outside the constructor-tagged data model
    #[error("unsupported cbor value: {0}")]
    Unsupported(&'static str),

    /// Unexpected constructor index
    #[error("unexpected constructor: expected {expected}, got {got}")]
    Constructor {
        /// Expected index
        expected: u64,
        /// Actual index
        got: u64,
    },

    /// Unexpected number of fields for a record
    #[error("{record}: unexpected field count {got}")]
    FieldCount {
        /// Record being decoded
        record: &'static str,
        /// Actual count
        got: usize,
    },

    /// Field of the wrong kind
    #[error("field {field}: expected {expected}")]
    FieldKind {
        /// Field name
        field: &'static str,
        /// Expected kind
        expected: &'static str,
    },

    /// Integer does not fit the target type
    #[error("field {field}: integer {value} out of range")]
    IntegerRange {
        /// Field name
        field: &'static str,
        /// Decoded value
        value: i128,
    },

    /// Byte string has the wrong length
    #[error("field {field}: expected {expected} bytes, got {got}")]
    Length {
        /// Field name
        field: &'static str,
        /// Expected length
        expected: usize,
        /// Actual length
        got: usize,
    },

    /// Byte string is not valid UTF-8
    #[error("field {0}: invalid utf-8")]
    InvalidUtf8(&'static str),
}

/// Encoding error
#[derive(Debug, Error)]
#[error("cbor encode error: {0}")]
pub struct EncodeError(pub String);

/// Result type for decoding
pub type DecodeResult<T> = Result<T, DecodeError>;

//! Constructor-tagged data model over CBOR
//!
//! ## Encoding rules
//!
//! - Constructor `i < 7`: tag `121 + i` wrapping the field array
//! - Constructor `7 <= i < 128`: tag `1280 + (i - 7)` wrapping the field array
//! - Any other constructor: tag `102` wrapping `[i, fields]`
//! - Integers, byte strings, arrays and maps map to their CBOR counterparts

use crate::error::{DecodeError, DecodeResult, EncodeError};
use serde_cbor::Value;
use std::collections::BTreeMap;

const TAG_SMALL_BASE: u64 = 121;
const TAG_MEDIUM_BASE: u64 = 1280;
const TAG_GENERAL: u64 = 102;

/// A node of the constructor-tagged data model
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlutusData {
    /// Alternative `index` with positional fields
    Constr {
        /// Constructor index
        index: u64,
        /// Positional fields
        fields: Vec<PlutusData>,
    },
    /// Key/value pairs in encoding order
    Map(Vec<(PlutusData, PlutusData)>),
    /// Signed integer
    Int(i128),
    /// Byte string
    Bytes(Vec<u8>),
    /// List
    List(Vec<PlutusData>),
}

impl PlutusData {
    /// Build a constructor node
    pub fn constr(index: u64, fields: Vec<PlutusData>) -> Self {
        PlutusData::Constr { index, fields }
    }

    /// Build a byte-string node
    pub fn bytes(bytes: impl AsRef<[u8]>) -> Self {
        PlutusData::Bytes(bytes.as_ref().to_vec())
    }

    /// Build an integer node
    pub fn int(value: u64) -> Self {
        PlutusData::Int(value as i128)
    }

    /// Decode from CBOR bytes
    pub fn from_cbor(bytes: &[u8]) -> DecodeResult<Self> {
        let value: Value =
            serde_cbor::from_slice(bytes).map_err(|e| DecodeError::Cbor(e.to_string()))?;
        Self::from_value(value)
    }

    /// Encode to CBOR bytes
    pub fn to_cbor(&self) -> Result<Vec<u8>, EncodeError> {
        serde_cbor::to_vec(&self.to_value()).map_err(|e| EncodeError(e.to_string()))
    }

    fn from_value(value: Value) -> DecodeResult<Self> {
        match value {
            Value::Tag(tag, inner) => Self::from_tagged(tag, *inner),
            Value::Integer(i) => Ok(PlutusData::Int(i)),
            Value::Bytes(b) => Ok(PlutusData::Bytes(b)),
            Value::Array(items) => Ok(PlutusData::List(Self::from_values(items)?)),
            Value::Map(entries) => entries
                .into_iter()
                .map(|(k, v)| Ok((Self::from_value(k)?, Self::from_value(v)?)))
                .collect::<DecodeResult<Vec<_>>>()
                .map(PlutusData::Map),
            Value::Null => Err(DecodeError::Unsupported("null")),
            Value::Bool(_) => Err(DecodeError::Unsupported("bool")),
            Value::Float(_) => Err(DecodeError::Unsupported("float")),
            Value::Text(_) => Err(DecodeError::Unsupported("text")),
            _ => Err(DecodeError::Unsupported("unknown value")),
        }
    }

    fn from_values(items: Vec<Value>) -> DecodeResult<Vec<PlutusData>> {
        items.into_iter().map(Self::from_value).collect()
    }

    fn from_tagged(tag: u64, inner: Value) -> DecodeResult<Self> {
        let index = match tag {
            t @ TAG_SMALL_BASE..=127 => t - TAG_SMALL_BASE,
            t @ TAG_MEDIUM_BASE..=1400 => t - TAG_MEDIUM_BASE + 7,
            TAG_GENERAL => {
                let mut parts = match inner {
                    Value::Array(parts) if parts.len() == 2 => parts,
                    _ => return Err(DecodeError::Unsupported("malformed general constructor")),
                };
                let fields = parts.pop();
                let index = parts.pop();
                return match (index, fields) {
                    (Some(Value::Integer(i)), Some(Value::Array(fields))) if i >= 0 => {
                        let index = u64::try_from(i)
                            .map_err(|_| DecodeError::IntegerRange { field: "constructor", value: i })?;
                        Ok(PlutusData::constr(index, Self::from_values(fields)?))
                    }
                    _ => Err(DecodeError::Unsupported("malformed general constructor")),
                };
            }
            _ => return Err(DecodeError::Unsupported("unknown tag")),
        };
        match inner {
            Value::Array(fields) => Ok(PlutusData::constr(index, Self::from_values(fields)?)),
            _ => Err(DecodeError::Unsupported("constructor without field array")),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            PlutusData::Constr { index, fields } => {
                let fields = Value::Array(fields.iter().map(Self::to_value).collect());
                match *index {
                    i if i < 7 => Value::Tag(TAG_SMALL_BASE + i, Box::new(fields)),
                    i if i < 128 => Value::Tag(TAG_MEDIUM_BASE + i - 7, Box::new(fields)),
                    i => Value::Tag(
                        TAG_GENERAL,
                        Box::new(Value::Array(vec![Value::Integer(i as i128), fields])),
                    ),
                }
            }
            PlutusData::Map(entries) => Value::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.to_value(), v.to_value()))
                    .collect::<BTreeMap<_, _>>(),
            ),
            PlutusData::Int(i) => Value::Integer(*i),
            PlutusData::Bytes(b) => Value::Bytes(b.clone()),
            PlutusData::List(items) => Value::Array(items.iter().map(Self::to_value).collect()),
        }
    }

    // ==================== Field accessors ====================

    /// Fields of a constructor node with the expected index
    pub fn expect_constr(&self, record: &'static str, index: u64) -> DecodeResult<&[PlutusData]> {
        match self {
            PlutusData::Constr { index: got, fields } if *got == index => Ok(fields),
            PlutusData::Constr { index: got, .. } => Err(DecodeError::Constructor {
                expected: index,
                got: *got,
            }),
            _ => Err(DecodeError::FieldKind {
                field: record,
                expected: "constructor",
            }),
        }
    }

    /// Constructor index and fields of any constructor node
    pub fn as_constr(&self, field: &'static str) -> DecodeResult<(u64, &[PlutusData])> {
        match self {
            PlutusData::Constr { index, fields } => Ok((*index, fields)),
            _ => Err(DecodeError::FieldKind {
                field,
                expected: "constructor",
            }),
        }
    }

    /// Byte-string field
    pub fn as_bytes(&self, field: &'static str) -> DecodeResult<&[u8]> {
        match self {
            PlutusData::Bytes(b) => Ok(b),
            _ => Err(DecodeError::FieldKind {
                field,
                expected: "bytes",
            }),
        }
    }

    /// List field
    pub fn as_list(&self, field: &'static str) -> DecodeResult<&[PlutusData]> {
        match self {
            PlutusData::List(items) => Ok(items),
            _ => Err(DecodeError::FieldKind {
                field,
                expected: "list",
            }),
        }
    }

    /// Non-negative integer field
    pub fn as_u64(&self, field: &'static str) -> DecodeResult<u64> {
        match self {
            PlutusData::Int(i) => {
                u64::try_from(*i).map_err(|_| DecodeError::IntegerRange { field, value: *i })
            }
            _ => Err(DecodeError::FieldKind {
                field,
                expected: "integer",
            }),
        }
    }

    /// UTF-8 text carried as a byte string
    pub fn as_text(&self, field: &'static str) -> DecodeResult<String> {
        String::from_utf8(self.as_bytes(field)?.to_vec()).map_err(|_| DecodeError::InvalidUtf8(field))
    }
}

//! # notary-primitives
//!
//! Primitive types for the certificate notary.
//!
//! This crate provides the fundamental data types used throughout the system:
//! fixed-size hashes, credentials, ledger addresses and output references.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod error;
mod hash;
mod output;

pub use address::{Address, AddressError, Credential, PaymentCredential, PolicyId, ScriptHash};
pub use error::PrimitiveError;
pub use hash::{Hash, HashError, H224, H256};
pub use output::{OutputRef, TxHash};

/// Ledger slot (monotonic time unit)
pub type Slot = u64;

/// Block height type
pub type BlockHeight = u64;

/// Amount of the smallest currency unit
pub type Lovelace = u64;

/// Hex (de)serialization for raw byte fields
#[cfg(feature = "serde")]
pub mod hex_bytes {
    use serde::{de, Deserialize, Deserializer, Serializer};

    /// Serialize bytes as a hex string
    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    /// Deserialize bytes from a hex string (optional `0x` prefix)
    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        hex::decode(s).map_err(de::Error::custom)
    }
}

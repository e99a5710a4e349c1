//! # notary-crypto
//!
//! Cryptographic helpers for the certificate notary.
//!
//! - SHA-256 hashing
//! - State record identity derivation from a spent output

#![warn(missing_docs)]
#![warn(clippy::all)]

mod hash;
mod identity;

pub use hash::{sha256, Sha256Hasher};
pub use identity::derive_state_id;

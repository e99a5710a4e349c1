//! # notary-datum
//!
//! Binary datum codec for the certificate notary.
//!
//! Ledger payloads are positional, constructor-tagged records encoded as CBOR.
//! This crate provides:
//! - [`PlutusData`] - the generic data model and its CBOR mapping
//! - [`BootstrapDatum`] - channel parameters in the legacy and current layouts
//! - [`StateDatum`] - state record payloads with embedded certificates
//! - Redeemers for the bootstrap policy, state policy and state validator
//! - Metadata chunking and the rolling certificate hash

#![warn(missing_docs)]
#![warn(clippy::all)]

mod bootstrap;
mod cert_hash;
mod chunk;
mod error;
mod plutus;
mod redeemer;
mod state;

pub use bootstrap::BootstrapDatum;
pub use cert_hash::{certificate_bytes, rolling_hash};
pub use chunk::{chunk_metadata, METADATA_CHUNK_LEN};
pub use error::{DecodeError, DecodeResult, EncodeError};
pub use plutus::PlutusData;
pub use redeemer::{BootstrapPolicyRedeemer, StatePolicyRedeemer, StateValidatorRedeemer, ToPlutus};
pub use state::StateDatum;

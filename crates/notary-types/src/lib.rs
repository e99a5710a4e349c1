//! # notary-types
//!
//! Core record types for the certificate notary.
//!
//! This crate provides:
//! - [`BootstrapRecord`](records::BootstrapRecord) - shared-fee channels
//! - [`StateRecord`](records::StateRecord) - per-user forks of a channel, with
//!   their [`UpdateHistoryEntry`](records::UpdateHistoryEntry) log
//! - [`Certificate`](certificate::Certificate) - notarized hashes with provenance
//! - [`LedgerOutput`](chain::LedgerOutput) - the ingestion feed model
//! - [`ScriptSet`](scripts::ScriptSet) - the on-chain script identities of a network

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod certificate;
pub mod chain;
pub mod records;
pub mod scripts;

// Re-export commonly used types
pub use certificate::{Certificate, CertificateData, Provenance};
pub use chain::{ChainEvent, ChainPoint, LedgerOutput, PolicyAmount};
pub use records::{
    amortized_cost, BootstrapParams, BootstrapRecord, SchemaVersion, StateId, StateRecord,
    UpdateHistoryEntry,
};
pub use scripts::ScriptSet;

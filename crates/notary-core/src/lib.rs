//! # notary-core
//!
//! Core logic of the certificate notary mirror.
//!
//! This crate provides:
//! - The fee/selection engine ([`selection`])
//! - Ledger ingestion ([`ingest_outputs`]) and rollback ([`rollback_to`])
//! - Extension fan-out ([`LedgerExtension`], [`ExtensionRegistry`])
//! - The single-writer [`Indexer`] that applies feed events atomically

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod extension;
pub mod indexer;
pub mod ingest;
pub mod rollback;
pub mod selection;

pub use error::{IngestError, IngestResult};
pub use extension::{ExtensionRegistry, LedgerExtension};
pub use indexer::{EventOutcome, Indexer};
pub use ingest::{ingest_outputs, IngestSummary};
pub use rollback::{rollback_to, RollbackSummary};
pub use selection::{decide, select_cheapest_bootstrap, select_cheapest_state, Decision, StateCandidate};

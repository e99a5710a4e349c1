//! # notary-tx
//!
//! Transaction assembly for the certificate notary.
//!
//! ## Features
//!
//! - **NotaryService**: the operation API (`persist_certificates`, `fork`,
//!   `invalidate`, `invalidate_all`, `init_channel`)
//! - **Assembler**: pure construction of fork, update, invalidate and channel
//!   init transactions
//! - **TxBuilder**: fluent API for unsigned transactions
//! - **LedgerClient**: the UTXO queries assembly depends on, with a `MockLedger`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use notary_storage::MemoryRepository;
//! use notary_tx::{AssemblyConfig, MockLedger, NotaryService};
//! use notary_types::ScriptSet;
//! use notary_primitives::{Address, Credential, PolicyId};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let scripts = ScriptSet {
//!         bootstrap_policy: PolicyId::from_bytes([1; 28]),
//!         state_policy: PolicyId::from_bytes([2; 28]),
//!         bootstrap_validator: PolicyId::from_bytes([3; 28]),
//!         state_validator: PolicyId::from_bytes([4; 28]),
//!     };
//!     let service = NotaryService::new(
//!         Arc::new(MemoryRepository::new()),
//!         Arc::new(MockLedger::new()),
//!         AssemblyConfig::new(0, scripts),
//!     );
//!
//!     let user = Address::from_key_credential(0, &Credential::from_bytes([9; 28]));
//!     let tx = service.invalidate_all(&user).await?;
//!     println!("{}", tx.to_json()?);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod assembly;
mod builder;
mod config;
mod error;
mod ledger;
mod service;
pub mod types;

pub use assembly::{Assembler, Payer, StateHead};
pub use builder::TxBuilder;
pub use config::AssemblyConfig;
pub use error::{TxError, TxResult};
pub use ledger::{LedgerClient, MockLedger};
pub use service::NotaryService;
pub use types::{MintEntry, TxInput, TxOutput, UnsignedTransaction, UnspentOutput, ValidityInterval};

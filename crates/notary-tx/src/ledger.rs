//! Ledger client interface
//!
//! The notary never talks to the network itself; UTXO lookups go through a
//! [`LedgerClient`]. Implementations are expected to impose their own
//! timeouts and report I/O failures as [`TxError::Transient`].

use crate::error::{TxError, TxResult};
use crate::types::UnspentOutput;
use async_trait::async_trait;
use notary_primitives::{Address, OutputRef, Slot};
use parking_lot::Mutex;
use std::collections::BTreeMap;

/// Ledger queries needed by transaction assembly (object-safe)
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Unspent output at `output`, if it still exists
    async fn get_output(&self, output: &OutputRef) -> TxResult<Option<UnspentOutput>>;

    /// Unspent outputs locked at `address`
    async fn list_unspent(&self, address: &Address) -> TxResult<Vec<UnspentOutput>>;

    /// Slot of the ledger tip
    async fn latest_slot(&self) -> TxResult<Slot>;
}

#[derive(Debug, Default)]
struct MockState {
    utxos: BTreeMap<OutputRef, UnspentOutput>,
    slot: Slot,
    offline: bool,
}

/// In-memory ledger for testing
#[derive(Debug, Default)]
pub struct MockLedger {
    state: Mutex<MockState>,
}

impl MockLedger {
    /// Create an empty ledger at slot 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an unspent output
    pub fn add_output(&self, utxo: UnspentOutput) {
        self.state.lock().utxos.insert(utxo.output, utxo);
    }

    /// Remove an output (spend it)
    pub fn remove_output(&self, output: &OutputRef) -> Option<UnspentOutput> {
        self.state.lock().utxos.remove(output)
    }

    /// Move the tip
    pub fn set_slot(&self, slot: Slot) {
        self.state.lock().slot = slot;
    }

    /// Make every query fail with a transient error
    pub fn set_offline(&self, offline: bool) {
        self.state.lock().offline = offline;
    }

    /// Number of unspent outputs
    pub fn len(&self) -> usize {
        self.state.lock().utxos.len()
    }

    /// Whether the ledger holds no outputs
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn online(&self) -> TxResult<parking_lot::MutexGuard<'_, MockState>> {
        let state = self.state.lock();
        if state.offline {
            return Err(TxError::Transient("mock ledger offline".to_string()));
        }
        Ok(state)
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn get_output(&self, output: &OutputRef) -> TxResult<Option<UnspentOutput>> {
        Ok(self.online()?.utxos.get(output).cloned())
    }

    async fn list_unspent(&self, address: &Address) -> TxResult<Vec<UnspentOutput>> {
        Ok(self
            .online()?
            .utxos
            .values()
            .filter(|u| &u.address == address)
            .cloned()
            .collect())
    }

    async fn latest_slot(&self) -> TxResult<Slot> {
        Ok(self.online()?.slot)
    }
}

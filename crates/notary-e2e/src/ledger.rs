//! Simulated ledger
//!
//! Confirms one transaction per block. Each confirmation spends the inputs,
//! creates the outputs plus a change output, and reports the created outputs
//! in feed form. Burns show up as `-1` amounts on the change output.

use crate::{E2EError, E2EResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use notary_crypto::{sha256, Sha256Hasher};
use notary_primitives::{Address, Lovelace, OutputRef, Slot};
use notary_tx::{LedgerClient, TxResult, UnsignedTransaction, UnspentOutput};
use notary_types::{LedgerOutput, PolicyAmount};
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::debug;

/// Block time of slot 0 (unix seconds)
const GENESIS_TIME: i64 = 1_700_000_000;

#[derive(Debug)]
struct Confirmed {
    slot: Slot,
    spent: Vec<UnspentOutput>,
    created: Vec<OutputRef>,
}

#[derive(Debug, Default)]
struct LedgerState {
    utxos: BTreeMap<OutputRef, UnspentOutput>,
    slot: Slot,
    block_number: u64,
    confirmed: Vec<Confirmed>,
    faucet: u32,
}

/// In-memory UTXO ledger that produces a feed
#[derive(Debug, Default)]
pub struct SimulatedLedger {
    state: Mutex<LedgerState>,
}

impl SimulatedLedger {
    /// Ledger with its tip at `slot`
    pub fn new(slot: Slot) -> Self {
        let ledger = Self::default();
        ledger.state.lock().slot = slot;
        ledger
    }

    /// Slot of the tip
    pub fn tip(&self) -> Slot {
        self.state.lock().slot
    }

    /// Number of unspent outputs
    pub fn len(&self) -> usize {
        self.state.lock().utxos.len()
    }

    /// Whether the ledger holds no outputs
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Unspent output at `output`
    pub fn output(&self, output: &OutputRef) -> Option<UnspentOutput> {
        self.state.lock().utxos.get(output).cloned()
    }

    /// Create a plain output at `address` outside any block
    pub fn fund(&self, address: &Address, lovelace: Lovelace) -> OutputRef {
        let mut state = self.state.lock();
        state.faucet += 1;
        let output = OutputRef::new(sha256(b"faucet"), state.faucet);
        state.utxos.insert(
            output,
            UnspentOutput {
                output,
                address: address.clone(),
                lovelace,
                assets: vec![],
                datum: None,
            },
        );
        output
    }

    /// Confirm `tx` in a new block at the next slot
    pub fn confirm(&self, tx: &UnsignedTransaction) -> E2EResult<Vec<LedgerOutput>> {
        let mut state = self.state.lock();
        let slot = state.slot + 1;
        if !tx.validity.contains(slot) {
            return Err(E2EError::Rejected(format!(
                "slot {} outside validity [{}, {}]",
                slot, tx.validity.invalid_before, tx.validity.invalid_hereafter
            )));
        }
        for input in tx.inputs.iter().map(|i| &i.output).chain(&tx.reference_inputs) {
            if !state.utxos.contains_key(input) {
                return Err(E2EError::Rejected(format!("input {} is not unspent", input)));
            }
        }

        let json = tx.to_json().map_err(|e| E2EError::Setup(e.to_string()))?;
        let mut hasher = Sha256Hasher::new();
        hasher.update(json.as_bytes()).update(slot.to_be_bytes());
        let tx_hash = hasher.finalize();
        let block_hash = sha256(tx_hash.as_bytes());
        let block_number = state.block_number + 1;
        let block_time = block_time(slot)?;

        let spent: Vec<UnspentOutput> = tx
            .inputs
            .iter()
            .filter_map(|i| state.utxos.remove(&i.output))
            .collect();
        let spent_value: Lovelace = spent.iter().map(|u| u.lovelace).sum();
        let paid: Lovelace = tx.outputs.iter().map(|o| o.lovelace).sum();

        let mut created = Vec::with_capacity(tx.outputs.len() + 1);
        let mut feed = Vec::with_capacity(tx.outputs.len() + 1);
        for (index, out) in tx.outputs.iter().enumerate() {
            let output = OutputRef::new(tx_hash, index as u32);
            state.utxos.insert(
                output,
                UnspentOutput {
                    output,
                    address: out.address.clone(),
                    lovelace: out.lovelace,
                    assets: out.assets.clone(),
                    datum: out.datum.clone(),
                },
            );
            created.push(output);
            feed.push(LedgerOutput {
                output,
                amounts: out.assets.clone(),
                datum: out.datum.clone(),
                slot,
                block_hash,
                block_number,
                block_time,
            });
        }

        let change = OutputRef::new(tx_hash, tx.outputs.len() as u32);
        state.utxos.insert(
            change,
            UnspentOutput {
                output: change,
                address: tx.change_address.clone(),
                lovelace: spent_value.saturating_sub(paid),
                assets: vec![],
                datum: None,
            },
        );
        created.push(change);
        feed.push(LedgerOutput {
            output: change,
            amounts: tx
                .mint
                .iter()
                .filter(|m| m.quantity < 0)
                .map(|m| PolicyAmount {
                    policy: m.policy,
                    asset_name: m.asset_name.clone(),
                    quantity: m.quantity,
                })
                .collect(),
            datum: None,
            slot,
            block_hash,
            block_number,
            block_time,
        });

        debug!(slot, tx = %tx_hash, outputs = feed.len(), "block confirmed");
        state.slot = slot;
        state.block_number = block_number;
        state.confirmed.push(Confirmed { slot, spent, created });
        Ok(feed)
    }

    /// Undo every block after `slot` and move the tip back to it
    pub fn rollback_to(&self, slot: Slot) -> usize {
        let mut state = self.state.lock();
        let mut undone = 0;
        while state.confirmed.last().map_or(false, |c| c.slot > slot) {
            let Some(block) = state.confirmed.pop() else {
                break;
            };
            for output in &block.created {
                state.utxos.remove(output);
            }
            for utxo in block.spent {
                state.utxos.insert(utxo.output, utxo);
            }
            state.block_number -= 1;
            undone += 1;
        }
        if state.slot > slot {
            state.slot = slot;
        }
        undone
    }
}

fn block_time(slot: Slot) -> E2EResult<DateTime<Utc>> {
    DateTime::from_timestamp(GENESIS_TIME + slot as i64, 0)
        .ok_or_else(|| E2EError::Setup(format!("slot {} has no block time", slot)))
}

#[async_trait]
impl LedgerClient for SimulatedLedger {
    async fn get_output(&self, output: &OutputRef) -> TxResult<Option<UnspentOutput>> {
        Ok(self.output(output))
    }

    async fn list_unspent(&self, address: &Address) -> TxResult<Vec<UnspentOutput>> {
        Ok(self
            .state
            .lock()
            .utxos
            .values()
            .filter(|u| &u.address == address)
            .cloned()
            .collect())
    }

    async fn latest_slot(&self) -> TxResult<Slot> {
        Ok(self.tip())
    }
}

//! Ingestion feed model: confirmed outputs and chain positions

use chrono::{DateTime, Utc};
use notary_primitives::{hex_bytes, BlockHeight, OutputRef, PolicyId, Slot, H256};
use serde::{Deserialize, Serialize};

/// Signed token quantity carried (or burned) by an output for one asset
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyAmount {
    /// Token policy
    pub policy: PolicyId,
    /// Asset name under the policy
    #[serde(with = "hex_bytes")]
    pub asset_name: Vec<u8>,
    /// Signed quantity; burns are negative
    pub quantity: i64,
}

/// A newly confirmed ledger output
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerOutput {
    /// Location of the output
    pub output: OutputRef,
    /// Token amounts relevant to the output
    #[serde(default)]
    pub amounts: Vec<PolicyAmount>,
    /// Inline datum payload
    #[serde(default, with = "hex_opt")]
    pub datum: Option<Vec<u8>>,
    /// Slot of the block
    pub slot: Slot,
    /// Block hash
    pub block_hash: H256,
    /// Block height
    pub block_number: BlockHeight,
    /// Block time
    pub block_time: DateTime<Utc>,
}

impl LedgerOutput {
    /// Chain position of the output's block
    pub fn point(&self) -> ChainPoint {
        ChainPoint {
            slot: self.slot,
            block_hash: self.block_hash,
        }
    }
}

/// A block position on the chain
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainPoint {
    /// Slot
    pub slot: Slot,
    /// Block hash at that slot
    pub block_hash: H256,
}

/// An event delivered by the chain follower
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainEvent {
    /// New confirmed outputs, in ledger order
    RollForward {
        /// Outputs to ingest
        outputs: Vec<LedgerOutput>,
    },
    /// Discard everything after `slot`
    RollBackward {
        /// Target slot
        slot: Slot,
    },
}

mod hex_opt {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match bytes {
            Some(b) => serializer.serialize_some(&hex::encode(b)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let s: Option<String> = Option::deserialize(deserializer)?;
        s.map(|s| hex::decode(s.strip_prefix("0x").unwrap_or(&s)).map_err(de::Error::custom))
            .transpose()
    }
}

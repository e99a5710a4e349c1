//! Unsigned transaction model
//!
//! Transactions are returned unsigned and unbalanced beyond the notary's own
//! outputs; signing, fee estimation and submission belong to the caller.

use notary_primitives::{hex_bytes, Address, Credential, Lovelace, OutputRef, PolicyId, Slot};
use notary_types::PolicyAmount;
use serde::{Deserialize, Serialize};

/// An unspent output as reported by the ledger client
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnspentOutput {
    /// Location
    pub output: OutputRef,
    /// Owning address
    pub address: Address,
    /// Locked currency
    pub lovelace: Lovelace,
    /// Native assets held (quantities are positive)
    #[serde(default)]
    pub assets: Vec<PolicyAmount>,
    /// Inline datum
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datum: Option<Vec<u8>>,
}

impl UnspentOutput {
    /// Whether the output holds at least one unit of `policy`/`asset_name`
    pub fn holds(&self, policy: &PolicyId, asset_name: &[u8]) -> bool {
        self.assets
            .iter()
            .any(|a| &a.policy == policy && a.asset_name == asset_name && a.quantity > 0)
    }
}

/// A transaction input
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxInput {
    /// Spent output
    pub output: OutputRef,
    /// Redeemer when the output is locked by a script
    #[serde(default, skip_serializing_if = "Option::is_none", with = "hex_opt")]
    pub redeemer: Option<Vec<u8>>,
}

/// A transaction output
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TxOutput {
    /// Receiving address
    pub address: Address,
    /// Currency sent
    pub lovelace: Lovelace,
    /// Native assets sent
    #[serde(default)]
    pub assets: Vec<PolicyAmount>,
    /// Inline datum
    #[serde(default, skip_serializing_if = "Option::is_none", with = "hex_opt")]
    pub datum: Option<Vec<u8>>,
}

impl TxOutput {
    /// Plain payment
    pub fn payment(address: Address, lovelace: Lovelace) -> Self {
        Self {
            address,
            lovelace,
            assets: Vec::new(),
            datum: None,
        }
    }
}

/// A mint (positive) or burn (negative) of one asset
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MintEntry {
    /// Token policy
    pub policy: PolicyId,
    /// Asset name
    #[serde(with = "hex_bytes")]
    pub asset_name: Vec<u8>,
    /// Signed quantity
    pub quantity: i64,
    /// Policy redeemer
    #[serde(with = "hex_bytes")]
    pub redeemer: Vec<u8>,
}

/// Slot window in which the transaction may be included
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidityInterval {
    /// First valid slot
    pub invalid_before: Slot,
    /// First slot at which the transaction is no longer valid
    pub invalid_hereafter: Slot,
}

impl ValidityInterval {
    /// Window `[latest - before, latest + after]`
    pub fn around(latest: Slot, before: u64, after: u64) -> Self {
        Self {
            invalid_before: latest.saturating_sub(before),
            invalid_hereafter: latest.saturating_add(after),
        }
    }

    /// Whether `slot` falls inside the window
    pub fn contains(&self, slot: Slot) -> bool {
        self.invalid_before <= slot && slot <= self.invalid_hereafter
    }
}

/// An assembled, unsigned transaction
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsignedTransaction {
    /// Spent outputs
    pub inputs: Vec<TxInput>,
    /// Outputs read but not spent
    #[serde(default)]
    pub reference_inputs: Vec<OutputRef>,
    /// Created outputs
    pub outputs: Vec<TxOutput>,
    /// Mints and burns
    #[serde(default)]
    pub mint: Vec<MintEntry>,
    /// Validity window
    pub validity: ValidityInterval,
    /// Credentials that must sign
    #[serde(default)]
    pub required_signers: Vec<Credential>,
    /// Where leftover value returns
    pub change_address: Address,
}

impl UnsignedTransaction {
    /// Total currency sent to `address`
    pub fn paid_to(&self, address: &Address) -> Lovelace {
        self.outputs
            .iter()
            .filter(|o| &o.address == address)
            .map(|o| o.lovelace)
            .sum()
    }

    /// JSON rendering for callers
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
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
        s.map(|s| hex::decode(s).map_err(de::Error::custom)).transpose()
    }
}

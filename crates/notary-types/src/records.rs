//! Bootstrap channels, state records and their update history

use notary_primitives::{Credential, OutputRef, Slot, H256};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// State record id: `sha256(tx_hash || le_u16(index))` of the output spent to fork it
pub type StateId = H256;

/// Expected fee per 100 uses of a channel: `(100.0 / fee_interval) * fee`
///
/// Lower is cheaper. `fee_interval` is validated positive on every path that
/// creates a channel; a zero interval yields `+inf` rather than panicking.
pub fn amortized_cost(fee: u64, fee_interval: u64) -> f64 {
    (100.0 / fee_interval as f64) * fee as f64
}

/// Unknown schema version tag
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("unknown schema version: {0}")]
pub struct UnknownSchemaVersion(pub u8);

/// On-chain layout a bootstrap record was decoded from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum SchemaVersion {
    /// 10-field layout with script hashes baked into the payload
    Legacy = 1,
    /// 8-field layout, script hashes derived from the network's script set
    Current = 2,
}

impl SchemaVersion {
    /// Numeric tag
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Whether records of this version may be used for new certificates
    pub fn is_current(self) -> bool {
        self > SchemaVersion::Legacy
    }
}

impl From<SchemaVersion> for u8 {
    fn from(v: SchemaVersion) -> u8 {
        v.as_u8()
    }
}

impl TryFrom<u8> for SchemaVersion {
    type Error = UnknownSchemaVersion;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            1 => Ok(SchemaVersion::Legacy),
            2 => Ok(SchemaVersion::Current),
            other => Err(UnknownSchemaVersion(other)),
        }
    }
}

/// Channel parameters as carried by the bootstrap datum
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapParams {
    /// Unique channel name (also the bootstrap token's asset name)
    pub token_name: String,
    /// Credentials allowed to fork; empty means public
    pub allowed_credentials: Vec<Credential>,
    /// Fee in the smallest currency unit
    pub fee: u64,
    /// Every `fee_interval`-th use of a fork pays `fee`
    pub fee_interval: u64,
    /// Fee recipients; the fee is split evenly, remainder dropped
    pub fee_receivers: Vec<Credential>,
    /// Channel time-to-live
    pub ttl: u64,
    /// Countdown budget granted to each fork
    pub transaction_limit: u64,
    /// Maximum certificates per use
    pub batch_size: u64,
}

impl BootstrapParams {
    /// Amortized cost of this channel
    pub fn amortized_cost(&self) -> f64 {
        amortized_cost(self.fee, self.fee_interval)
    }

    /// Per-receiver share of the fee (`fee / receivers`, remainder dropped)
    pub fn fee_share(&self) -> u64 {
        match self.fee_receivers.len() as u64 {
            0 => 0,
            n => self.fee / n,
        }
    }

    /// Whether a use at `countdown` (before decrement) pays the fee
    pub fn is_fee_due(&self, countdown: u64) -> bool {
        self.fee_interval != 0 && countdown % self.fee_interval == 0
    }
}

/// Mirror of an on-chain bootstrap channel
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapRecord {
    /// Channel parameters
    pub params: BootstrapParams,
    /// Layout the datum was decoded from
    pub schema_version: SchemaVersion,
    /// Slot of the mint
    pub creation_slot: Slot,
    /// Output created by the mint
    pub origin: OutputRef,
    /// Slot of the burn, if observed
    pub invalidation_slot: Option<Slot>,
}

impl BootstrapRecord {
    /// Channel name
    pub fn token_name(&self) -> &str {
        &self.params.token_name
    }

    /// Restricted to an explicit credential list
    pub fn is_custom(&self) -> bool {
        !self.params.allowed_credentials.is_empty()
    }

    /// Open to everyone and on the current layout
    pub fn is_public(&self) -> bool {
        self.params.allowed_credentials.is_empty() && self.schema_version.is_current()
    }

    /// Not yet burned
    pub fn is_live(&self) -> bool {
        self.invalidation_slot.is_none()
    }

    /// Whether `credential` may fork this channel
    pub fn allows(&self, credential: &Credential) -> bool {
        self.params.allowed_credentials.is_empty()
            || self.params.allowed_credentials.contains(credential)
    }

    /// Amortized cost of this channel
    pub fn amortized_cost(&self) -> f64 {
        self.params.amortized_cost()
    }
}

/// Mirror of a user's fork of a channel; the head pointer moves on every use
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateRecord {
    /// Derived id (also the state token's asset name)
    pub id: StateId,
    /// Owning credential
    pub owner: Credential,
    /// Remaining uses
    pub countdown: u64,
    /// Slot of the fork
    pub creation_slot: Slot,
    /// Live output currently holding the state token
    pub current_output: OutputRef,
    /// Rolling hash over every certificate folded into the record
    pub certificate_data_hash: H256,
    /// Maximum certificates per use
    pub batch_size: u64,
    /// Parent channel
    pub bootstrap_token_name: String,
    /// Slot of the burn, if observed
    pub invalidation_slot: Option<Slot>,
}

impl StateRecord {
    /// Not yet burned
    pub fn is_live(&self) -> bool {
        self.invalidation_slot.is_none()
    }

    /// Usable for new certificates under a channel of `schema_version`
    pub fn is_usable(&self, schema_version: SchemaVersion) -> bool {
        self.is_live() && self.countdown > 0 && schema_version.is_current()
    }

    /// Move the head pointer to a newer output
    pub fn advance(&mut self, entry: &UpdateHistoryEntry) {
        self.countdown = entry.countdown;
        self.current_output = entry.output;
        self.certificate_data_hash = entry.certificate_data_hash;
    }

    /// History entry describing the current head
    pub fn head_entry(&self, slot: Slot) -> UpdateHistoryEntry {
        UpdateHistoryEntry {
            state_id: self.id,
            slot,
            countdown: self.countdown,
            output: self.current_output,
            certificate_data_hash: self.certificate_data_hash,
        }
    }
}

/// One head-pointer value of a state record, kept for rollback replay
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateHistoryEntry {
    /// Owning state record
    pub state_id: StateId,
    /// Slot at which this head was observed
    pub slot: Slot,
    /// Countdown at that slot
    pub countdown: u64,
    /// Output holding the token at that slot
    pub output: OutputRef,
    /// Rolling certificate hash at that slot
    pub certificate_data_hash: H256,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(fee: u64, interval: u64) -> BootstrapParams {
        BootstrapParams {
            token_name: "channel".to_string(),
            allowed_credentials: vec![],
            fee,
            fee_interval: interval,
            fee_receivers: vec![Credential::from_bytes([1; 28]), Credential::from_bytes([2; 28])],
            ttl: 0,
            transaction_limit: 1000,
            batch_size: 10,
        }
    }

    fn record(allowed: Vec<Credential>, version: SchemaVersion) -> BootstrapRecord {
        let mut p = params(2_000_000, 10);
        p.allowed_credentials = allowed;
        BootstrapRecord {
            params: p,
            schema_version: version,
            creation_slot: 100,
            origin: OutputRef::default(),
            invalidation_slot: None,
        }
    }

    // ==================== Amortized cost ====================

    #[test]
    fn test_amortized_cost_formula() {
        assert_eq!(amortized_cost(2_000_000, 10), 20_000_000.0);
        assert_eq!(amortized_cost(3, 4), 75.0);
        assert_eq!(amortized_cost(0, 7), 0.0);
    }

    #[test]
    fn test_amortized_cost_matches_float_semantics() {
        for (fee, interval) in [(1u64, 3u64), (7, 9), (1_000_001, 13)] {
            assert_eq!(
                amortized_cost(fee, interval),
                (100.0 / interval as f64) * fee as f64
            );
        }
    }

    // ==================== Fee split ====================

    #[test]
    fn test_fee_share_drops_remainder() {
        let mut p = params(10, 5);
        p.fee_receivers.push(Credential::from_bytes([3; 28]));
        assert_eq!(p.fee_share(), 3);
    }

    #[test]
    fn test_fee_share_without_receivers() {
        let mut p = params(10, 5);
        p.fee_receivers.clear();
        assert_eq!(p.fee_share(), 0);
    }

    #[test]
    fn test_fee_due_on_multiples() {
        let p = params(10, 10);
        assert!(p.is_fee_due(990));
        assert!(!p.is_fee_due(999));
        assert!(p.is_fee_due(0));
    }

    // ==================== Channel classification ====================

    #[test]
    fn test_public_and_custom() {
        let public = record(vec![], SchemaVersion::Current);
        assert!(public.is_public());
        assert!(!public.is_custom());

        let legacy_open = record(vec![], SchemaVersion::Legacy);
        assert!(!legacy_open.is_public());

        let cred = Credential::from_bytes([9; 28]);
        let custom = record(vec![cred], SchemaVersion::Current);
        assert!(custom.is_custom());
        assert!(custom.allows(&cred));
        assert!(!custom.allows(&Credential::from_bytes([8; 28])));
    }

    // ==================== State usability ====================

    #[test]
    fn test_state_usability() {
        let mut state = StateRecord {
            id: StateId::from_bytes([1; 32]),
            owner: Credential::from_bytes([2; 28]),
            countdown: 1,
            creation_slot: 5,
            current_output: OutputRef::default(),
            certificate_data_hash: H256::ZERO,
            batch_size: 10,
            bootstrap_token_name: "channel".to_string(),
            invalidation_slot: None,
        };
        assert!(state.is_usable(SchemaVersion::Current));
        assert!(!state.is_usable(SchemaVersion::Legacy));

        state.countdown = 0;
        assert!(!state.is_usable(SchemaVersion::Current));

        state.countdown = 3;
        state.invalidation_slot = Some(9);
        assert!(!state.is_usable(SchemaVersion::Current));
    }

    #[test]
    fn test_schema_version_serde_as_number() {
        let json = serde_json::to_string(&SchemaVersion::Current).unwrap();
        assert_eq!(json, "2");
        let parsed: SchemaVersion = serde_json::from_str("1").unwrap();
        assert_eq!(parsed, SchemaVersion::Legacy);
        assert!(serde_json::from_str::<SchemaVersion>("3").is_err());
    }
}

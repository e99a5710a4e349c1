//! On-chain script identities of a network
//!
//! The script bytecode is an external artifact; only the hashes matter here.

use notary_primitives::{Address, PolicyId, ScriptHash};
use serde::{Deserialize, Serialize};

/// Script hashes that identify the notary contracts on a network
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptSet {
    /// Policy of the bootstrap authorization token
    pub bootstrap_policy: PolicyId,
    /// Policy of state tokens
    pub state_policy: PolicyId,
    /// Script holding bootstrap outputs
    pub bootstrap_validator: ScriptHash,
    /// Script holding state outputs
    pub state_validator: ScriptHash,
}

impl ScriptSet {
    /// Address bootstrap outputs are locked at
    pub fn bootstrap_address(&self, network_id: u8) -> Address {
        Address::from_script_hash(network_id, &self.bootstrap_validator)
    }

    /// Address state outputs are locked at
    pub fn state_address(&self, network_id: u8) -> Address {
        Address::from_script_hash(network_id, &self.state_validator)
    }
}

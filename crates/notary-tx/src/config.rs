//! Assembly configuration

use notary_primitives::{Address, Lovelace};
use notary_types::ScriptSet;
use serde::{Deserialize, Serialize};

fn default_min_output_lovelace() -> Lovelace {
    2_000_000
}

fn default_validity_before() -> u64 {
    10
}

fn default_validity_after() -> u64 {
    600
}

/// Network parameters used when building transactions
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssemblyConfig {
    /// Address network nibble
    pub network_id: u8,
    /// Notary scripts on this network
    pub scripts: ScriptSet,
    /// Currency locked with every script output
    #[serde(default = "default_min_output_lovelace")]
    pub min_output_lovelace: Lovelace,
    /// Slots before the ledger tip the validity window opens
    #[serde(default = "default_validity_before")]
    pub validity_before: u64,
    /// Slots after the ledger tip the validity window closes
    #[serde(default = "default_validity_after")]
    pub validity_after: u64,
}

impl AssemblyConfig {
    /// Configuration with default limits
    pub fn new(network_id: u8, scripts: ScriptSet) -> Self {
        Self {
            network_id,
            scripts,
            min_output_lovelace: default_min_output_lovelace(),
            validity_before: default_validity_before(),
            validity_after: default_validity_after(),
        }
    }

    /// Address holding bootstrap outputs
    pub fn bootstrap_address(&self) -> Address {
        self.scripts.bootstrap_address(self.network_id)
    }

    /// Address holding state outputs
    pub fn state_address(&self) -> Address {
        self.scripts.state_address(self.network_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notary_primitives::PolicyId;

    #[test]
    fn test_defaults_apply_when_omitted() {
        let scripts = ScriptSet {
            bootstrap_policy: PolicyId::from_bytes([1; 28]),
            state_policy: PolicyId::from_bytes([2; 28]),
            bootstrap_validator: PolicyId::from_bytes([3; 28]),
            state_validator: PolicyId::from_bytes([4; 28]),
        };
        let json = serde_json::json!({ "network_id": 1, "scripts": scripts.clone() });
        let config: AssemblyConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config, AssemblyConfig::new(1, scripts));
        assert_eq!(config.state_address().network_id(), 1);
        assert!(config.bootstrap_address().payment_credential().unwrap().is_script());
    }
}

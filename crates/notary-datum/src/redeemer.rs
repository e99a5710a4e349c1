//! Redeemers passed to the notary scripts

use crate::error::{DecodeError, DecodeResult, EncodeError};
use crate::plutus::PlutusData;
use notary_primitives::{OutputRef, H256};

/// Redeemer of the bootstrap authorization policy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BootstrapPolicyRedeemer {
    /// Create a channel
    Mint,
    /// Close a channel
    Burn,
}

/// Redeemer of the state token policy
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StatePolicyRedeemer {
    /// Fork a state record, consuming `input`
    Fork {
        /// Input the new state id is derived from
        input: OutputRef,
    },
    /// Burn a state token
    Burn,
}

/// Redeemer of the state validator
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StateValidatorRedeemer {
    /// Spend the head output to append certificates
    Update,
    /// Spend the head output to burn the record
    Invalidate,
}

/// Conversion into the constructor-tagged data model
pub trait ToPlutus {
    /// Data node
    fn to_plutus(&self) -> PlutusData;

    /// CBOR bytes of [`ToPlutus::to_plutus`]
    fn encode(&self) -> Result<Vec<u8>, EncodeError> {
        self.to_plutus().to_cbor()
    }
}

impl ToPlutus for BootstrapPolicyRedeemer {
    fn to_plutus(&self) -> PlutusData {
        match self {
            BootstrapPolicyRedeemer::Mint => PlutusData::constr(0, vec![]),
            BootstrapPolicyRedeemer::Burn => PlutusData::constr(1, vec![]),
        }
    }
}

impl ToPlutus for StatePolicyRedeemer {
    fn to_plutus(&self) -> PlutusData {
        match self {
            StatePolicyRedeemer::Fork { input } => PlutusData::constr(
                0,
                vec![
                    PlutusData::bytes(input.tx_hash),
                    PlutusData::int(input.index as u64),
                ],
            ),
            StatePolicyRedeemer::Burn => PlutusData::constr(1, vec![]),
        }
    }
}

impl ToPlutus for StateValidatorRedeemer {
    fn to_plutus(&self) -> PlutusData {
        match self {
            StateValidatorRedeemer::Update => PlutusData::constr(0, vec![]),
            StateValidatorRedeemer::Invalidate => PlutusData::constr(1, vec![]),
        }
    }
}

impl StatePolicyRedeemer {
    /// Decode from CBOR bytes
    pub fn decode(bytes: &[u8]) -> DecodeResult<Self> {
        let data = PlutusData::from_cbor(bytes)?;
        match data.as_constr("state policy redeemer")? {
            (0, [hash, index]) => {
                let raw = hash.as_bytes("input_tx_hash")?;
                let tx_hash = H256::from_slice(raw).map_err(|_| DecodeError::Length {
                    field: "input_tx_hash",
                    expected: H256::LEN,
                    got: raw.len(),
                })?;
                let index = index.as_u64("input_index")?;
                let index = u32::try_from(index).map_err(|_| DecodeError::IntegerRange {
                    field: "input_index",
                    value: index as i128,
                })?;
                Ok(StatePolicyRedeemer::Fork {
                    input: OutputRef::new(tx_hash, index),
                })
            }
            (1, []) => Ok(StatePolicyRedeemer::Burn),
            (0, fields) | (1, fields) => Err(DecodeError::FieldCount {
                record: "state policy redeemer",
                got: fields.len(),
            }),
            (got, _) => Err(DecodeError::Constructor { expected: 0, got }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_redeemers() {
        assert_eq!(BootstrapPolicyRedeemer::Mint.encode().unwrap(), vec![0xd8, 0x79, 0x80]);
        assert_eq!(BootstrapPolicyRedeemer::Burn.encode().unwrap(), vec![0xd8, 0x7a, 0x80]);
        assert_eq!(StateValidatorRedeemer::Update.encode().unwrap(), vec![0xd8, 0x79, 0x80]);
        assert_eq!(StateValidatorRedeemer::Invalidate.encode().unwrap(), vec![0xd8, 0x7a, 0x80]);
    }

    #[test]
    fn test_fork_redeemer_roundtrip() {
        let fork = StatePolicyRedeemer::Fork {
            input: OutputRef::new(H256::from_bytes([9; 32]), 3),
        };
        assert_eq!(StatePolicyRedeemer::decode(&fork.encode().unwrap()).unwrap(), fork);
        let burn = StatePolicyRedeemer::Burn;
        assert_eq!(StatePolicyRedeemer::decode(&burn.encode().unwrap()).unwrap(), burn);
    }

    #[test]
    fn test_fork_redeemer_rejects_extra_fields() {
        let bytes = PlutusData::constr(1, vec![PlutusData::int(1)]).to_cbor().unwrap();
        assert!(matches!(
            StatePolicyRedeemer::decode(&bytes),
            Err(DecodeError::FieldCount { got: 1, .. })
        ));
    }
}

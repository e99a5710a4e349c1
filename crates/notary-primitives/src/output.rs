//! Output references (`tx_hash#index`)

use crate::error::PrimitiveError;
use crate::hash::H256;
use std::fmt;
use std::str::FromStr;

/// Transaction id
pub type TxHash = H256;

/// Location of a ledger output: the transaction that produced it and its index
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OutputRef {
    /// Producing transaction
    pub tx_hash: TxHash,
    /// Output index within the transaction
    pub index: u32,
}

impl OutputRef {
    /// Create a new output reference
    pub const fn new(tx_hash: TxHash, index: u32) -> Self {
        Self { tx_hash, index }
    }
}

impl fmt::Debug for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputRef({}#{})", self.tx_hash, self.index)
    }
}

impl fmt::Display for OutputRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.tx_hash, self.index)
    }
}

impl FromStr for OutputRef {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (hash, index) = s
            .split_once('#')
            .ok_or_else(|| PrimitiveError::OutputRef(s.to_string()))?;
        let index = index
            .parse::<u32>()
            .map_err(|e| PrimitiveError::OutputRef(e.to_string()))?;
        Ok(Self::new(H256::from_hex(hash)?, index))
    }
}

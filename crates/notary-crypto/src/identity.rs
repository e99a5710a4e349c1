//! State record identity
//!
//! A state record is named after the output spent to fork it:
//! `sha256(tx_hash || le_u16(output_index))`. The ledger consumes that output,
//! so an id can never be minted twice.

use crate::hash::Sha256Hasher;
use notary_primitives::{OutputRef, H256};

/// Derive the state id for a fork spending `input`
///
/// The ledger caps output indices well below `u16::MAX`; only the low 16 bits
/// of the index take part in the hash.
pub fn derive_state_id(input: &OutputRef) -> H256 {
    let index = (input.index & 0xffff) as u16;
    let mut hasher = Sha256Hasher::new();
    hasher
        .update(input.tx_hash.as_bytes())
        .update(index.to_le_bytes());
    hasher.finalize()
}

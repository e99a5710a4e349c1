//! Row identities

use notary_primitives::{OutputRef, Slot, H256};
use notary_types::{BootstrapRecord, Certificate, StateId, UpdateHistoryEntry};
use std::ops::RangeInclusive;

/// Identity of a bootstrap row: a name may be reused once the previous
/// holder has been burned, so the creation slot is part of the key
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BootstrapKey {
    /// Channel name
    pub token_name: String,
    /// Slot of the mint
    pub creation_slot: Slot,
}

impl From<&BootstrapRecord> for BootstrapKey {
    fn from(record: &BootstrapRecord) -> Self {
        Self {
            token_name: record.params.token_name.clone(),
            creation_slot: record.creation_slot,
        }
    }
}

/// Identity of a history row. A record can move more than once within a
/// slot, so the output is part of the key.
pub type HistoryKey = (StateId, Slot, OutputRef);

/// History key of an entry
pub fn history_key(entry: &UpdateHistoryEntry) -> HistoryKey {
    (entry.state_id, entry.slot, entry.output)
}

/// Every history key of one record
pub fn history_range(id: &StateId) -> RangeInclusive<HistoryKey> {
    let first = OutputRef::new(H256::ZERO, 0);
    let last = OutputRef::new(H256::from_bytes([0xff; 32]), u32::MAX);
    (*id, 0, first)..=(*id, Slot::MAX, last)
}

/// Identity of a certificate row, ordered by owner then ledger position
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CertificateKey {
    /// Owning state record
    pub state_id: StateId,
    /// Slot observed at
    pub slot: Slot,
    /// Output holding the datum
    pub output: OutputRef,
    /// Position within the datum
    pub position: u32,
}

impl From<&Certificate> for CertificateKey {
    fn from(cert: &Certificate) -> Self {
        Self {
            state_id: cert.state_id,
            slot: cert.provenance.slot,
            output: cert.provenance.output,
            position: cert.provenance.position,
        }
    }
}

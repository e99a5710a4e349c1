//! Rollback to an earlier slot
//!
//! The steps run in a fixed order so head recomputation only ever sees history
//! entries that survive the rollback. Applying the same target twice, or an
//! earlier target after a later one, leaves the repository as a single
//! rollback to the earliest target would.

use crate::error::IngestResult;
use notary_primitives::{Slot, H256};
use notary_storage::{RepositoryReader, RepositoryWriter};
use notary_types::ChainPoint;
use tracing::info;

/// What a rollback changed
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RollbackSummary {
    /// Target slot
    pub slot: Slot,
    /// Certificates deleted
    pub certificates_deleted: usize,
    /// Bootstrap and state records deleted
    pub records_deleted: usize,
    /// Bootstrap and state records whose burn was undone
    pub invalidations_undone: usize,
    /// State records whose head pointer moved back
    pub heads_restored: usize,
}

impl RollbackSummary {
    /// Whether the rollback changed nothing
    pub fn is_noop(&self) -> bool {
        self.certificates_deleted == 0
            && self.records_deleted == 0
            && self.invalidations_undone == 0
            && self.heads_restored == 0
    }
}

/// Discard every effect of blocks after `slot`.
///
/// The caller owns atomicity, as with ingestion.
pub fn rollback_to<W>(repo: &mut W, slot: Slot) -> IngestResult<RollbackSummary>
where
    W: RepositoryReader + RepositoryWriter,
{
    let summary = RollbackSummary {
        slot,
        certificates_deleted: repo.delete_certificates_after(slot)?,
        records_deleted: repo.delete_created_after(slot)?,
        invalidations_undone: repo.undo_invalidations_after(slot)?,
        heads_restored: repo.restore_heads(slot)?,
    };

    // The hash of the block at `slot` is not known here; a zero hash marks a
    // rewound cursor.
    if let Some(cursor) = repo.cursor()? {
        if cursor.slot > slot {
            repo.set_cursor(Some(ChainPoint {
                slot,
                block_hash: H256::ZERO,
            }))?;
        }
    }

    info!(
        slot,
        certificates = summary.certificates_deleted,
        records = summary.records_deleted,
        resurrected = summary.invalidations_undone,
        heads = summary.heads_restored,
        "rolled back"
    );
    Ok(summary)
}

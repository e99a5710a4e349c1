//! Repository contract
//!
//! Row-level reads and writes are what a backend implements; the record
//! lifecycle operations used by ingestion and rollback are provided on top of
//! them, so every backend shares one definition of their semantics.

use crate::error::{StorageError, StorageResult};
use crate::keys::{history_key, BootstrapKey, CertificateKey, HistoryKey};
use crate::staged::StagedBatch;
use notary_primitives::{Credential, Slot};
use notary_types::{
    BootstrapRecord, Certificate, ChainPoint, StateId, StateRecord, UpdateHistoryEntry,
};
use tracing::debug;

/// Read access to the repository
pub trait RepositoryReader {
    /// All bootstrap rows, including invalidated ones
    fn bootstraps(&self) -> StorageResult<Vec<BootstrapRecord>>;

    /// State record by id
    fn state(&self, id: &StateId) -> StorageResult<Option<StateRecord>>;

    /// All state rows, including invalidated ones
    fn states(&self) -> StorageResult<Vec<StateRecord>>;

    /// Update history of a state record, slot ascending
    fn history_of(&self, id: &StateId) -> StorageResult<Vec<UpdateHistoryEntry>>;

    /// Certificates owned by a state record, in ledger order
    fn certificates_of(&self, id: &StateId) -> StorageResult<Vec<Certificate>>;

    /// Keys of every stored certificate
    fn certificate_keys(&self) -> StorageResult<Vec<CertificateKey>>;

    /// Last applied chain position
    fn cursor(&self) -> StorageResult<Option<ChainPoint>>;

    /// Bootstrap record by name: the live holder of the name, otherwise the
    /// most recently created one
    fn bootstrap(&self, name: &str) -> StorageResult<Option<BootstrapRecord>> {
        let mut named: Vec<BootstrapRecord> = self
            .bootstraps()?
            .into_iter()
            .filter(|b| b.token_name() == name)
            .collect();
        named.sort_by_key(|b| (b.is_live(), b.creation_slot));
        Ok(named.pop())
    }

    /// Bootstrap records not yet burned
    fn live_bootstraps(&self) -> StorageResult<Vec<BootstrapRecord>> {
        Ok(self.bootstraps()?.into_iter().filter(|b| b.is_live()).collect())
    }

    /// State records owned by `owner`, including invalidated ones
    fn state_records_of(&self, owner: &Credential) -> StorageResult<Vec<StateRecord>> {
        Ok(self
            .states()?
            .into_iter()
            .filter(|s| &s.owner == owner)
            .collect())
    }
}

/// Row-level write access, plus the record lifecycle operations
pub trait RepositoryWriter {
    /// Insert or replace a bootstrap row
    fn put_bootstrap(&mut self, record: BootstrapRecord) -> StorageResult<()>;

    /// Delete a bootstrap row
    fn delete_bootstrap(&mut self, key: &BootstrapKey) -> StorageResult<()>;

    /// Insert or replace a state row
    fn put_state(&mut self, record: StateRecord) -> StorageResult<()>;

    /// Delete a state row
    fn delete_state(&mut self, id: &StateId) -> StorageResult<()>;

    /// Insert or replace a history row
    fn put_history(&mut self, entry: UpdateHistoryEntry) -> StorageResult<()>;

    /// Delete a history row
    fn delete_history(&mut self, key: &HistoryKey) -> StorageResult<()>;

    /// Insert or replace a certificate row
    fn put_certificate(&mut self, cert: Certificate) -> StorageResult<()>;

    /// Delete a certificate row
    fn delete_certificate(&mut self, key: &CertificateKey) -> StorageResult<()>;

    /// Record the last applied chain position
    fn set_cursor(&mut self, point: Option<ChainPoint>) -> StorageResult<()>;

    // ==================== Lifecycle operations ====================

    /// Insert a new bootstrap record; its name must not be held by a live record
    fn insert_bootstrap(&mut self, record: BootstrapRecord) -> StorageResult<()>
    where
        Self: RepositoryReader,
    {
        if let Some(existing) = self.bootstrap(record.token_name())? {
            if existing.is_live() {
                return Err(StorageError::Duplicate(format!(
                    "bootstrap {}",
                    record.token_name()
                )));
            }
        }
        self.put_bootstrap(record)
    }

    /// Mark the live bootstrap named `name` invalid at `slot`
    fn invalidate_bootstrap(&mut self, name: &str, slot: Slot) -> StorageResult<Option<BootstrapRecord>>
    where
        Self: RepositoryReader,
    {
        match self.bootstrap(name)? {
            Some(mut record) if record.is_live() => {
                record.invalidation_slot = Some(slot);
                self.put_bootstrap(record.clone())?;
                Ok(Some(record))
            }
            _ => Ok(None),
        }
    }

    /// Insert a new state record together with its first history entry
    fn insert_state(&mut self, record: StateRecord) -> StorageResult<()>
    where
        Self: RepositoryReader,
    {
        if self.state(&record.id)?.is_some() {
            return Err(StorageError::Duplicate(format!("state {}", record.id)));
        }
        self.put_history(record.head_entry(record.creation_slot))?;
        self.put_state(record)
    }

    /// Append a history entry and move the record's head pointer to it
    fn append_update(&mut self, entry: UpdateHistoryEntry) -> StorageResult<StateRecord>
    where
        Self: RepositoryReader,
    {
        let mut record = self
            .state(&entry.state_id)?
            .ok_or_else(|| StorageError::NotFound(format!("state {}", entry.state_id)))?;
        record.advance(&entry);
        self.put_history(entry)?;
        self.put_state(record.clone())?;
        Ok(record)
    }

    /// Mark a live state record invalid at `slot`
    fn invalidate_state(&mut self, id: &StateId, slot: Slot) -> StorageResult<Option<StateRecord>>
    where
        Self: RepositoryReader,
    {
        match self.state(id)? {
            Some(mut record) if record.is_live() => {
                record.invalidation_slot = Some(slot);
                self.put_state(record.clone())?;
                Ok(Some(record))
            }
            _ => Ok(None),
        }
    }

    /// Store certificates
    fn insert_certificates(&mut self, certs: Vec<Certificate>) -> StorageResult<usize> {
        let count = certs.len();
        for cert in certs {
            self.put_certificate(cert)?;
        }
        Ok(count)
    }

    /// Delete certificates observed after `slot`
    fn delete_certificates_after(&mut self, slot: Slot) -> StorageResult<usize>
    where
        Self: RepositoryReader,
    {
        let doomed: Vec<CertificateKey> = self
            .certificate_keys()?
            .into_iter()
            .filter(|k| k.slot > slot)
            .collect();
        for key in &doomed {
            self.delete_certificate(key)?;
        }
        Ok(doomed.len())
    }

    /// Hard-delete records created after `slot`, with their history and certificates
    fn delete_created_after(&mut self, slot: Slot) -> StorageResult<usize>
    where
        Self: RepositoryReader,
    {
        let mut deleted = 0;
        for record in self.bootstraps()? {
            if record.creation_slot > slot {
                debug!(name = %record.token_name(), "deleting bootstrap");
                self.delete_bootstrap(&BootstrapKey::from(&record))?;
                deleted += 1;
            }
        }
        for record in self.states()? {
            if record.creation_slot > slot {
                debug!(id = %record.id, "deleting state");
                for entry in self.history_of(&record.id)? {
                    self.delete_history(&history_key(&entry))?;
                }
                for cert in self.certificates_of(&record.id)? {
                    self.delete_certificate(&CertificateKey::from(&cert))?;
                }
                self.delete_state(&record.id)?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Clear invalidation slots later than `slot`
    fn undo_invalidations_after(&mut self, slot: Slot) -> StorageResult<usize>
    where
        Self: RepositoryReader,
    {
        let mut restored = 0;
        for mut record in self.bootstraps()? {
            if record.invalidation_slot.map_or(false, |s| s > slot) {
                record.invalidation_slot = None;
                self.put_bootstrap(record)?;
                restored += 1;
            }
        }
        for mut record in self.states()? {
            if record.invalidation_slot.map_or(false, |s| s > slot) {
                record.invalidation_slot = None;
                self.put_state(record)?;
                restored += 1;
            }
        }
        Ok(restored)
    }

    /// Recompute every head pointer from the latest history entry at or
    /// before `slot`, then prune history after `slot`
    fn restore_heads(&mut self, slot: Slot) -> StorageResult<usize>
    where
        Self: RepositoryReader,
    {
        let mut moved = 0;
        for mut record in self.states()? {
            let history = self.history_of(&record.id)?;
            let (retained, pruned): (Vec<_>, Vec<_>) =
                history.into_iter().partition(|e| e.slot <= slot);
            // Within one slot the later move carries the lower countdown
            let head = retained
                .iter()
                .max_by_key(|e| (e.slot, std::cmp::Reverse(e.countdown)));
            let current_retained = retained.iter().any(|e| e.output == record.current_output);
            if let Some(head) = head.filter(|_| !current_retained) {
                record.advance(head);
                self.put_state(record)?;
                moved += 1;
            }
            for entry in &pruned {
                self.delete_history(&history_key(entry))?;
            }
        }
        Ok(moved)
    }
}

/// A repository that applies writes in atomic batches
pub trait Repository: RepositoryReader + Send + Sync {
    /// Run `f` against a staged batch and commit its writes only if it succeeds.
    ///
    /// Batches are serialized; readers see either none or all of a batch.
    fn apply<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut StagedBatch<'_>) -> Result<T, E>,
        E: From<StorageError>;
}

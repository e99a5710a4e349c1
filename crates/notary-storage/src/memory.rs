//! In-memory repository

use crate::error::{StorageError, StorageResult};
use crate::keys::{history_key, history_range, BootstrapKey, CertificateKey, HistoryKey};
use crate::staged::StagedBatch;
use crate::traits::{Repository, RepositoryReader, RepositoryWriter};
use notary_types::{
    BootstrapRecord, Certificate, ChainPoint, StateId, StateRecord, UpdateHistoryEntry,
};
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::collections::BTreeMap;

/// Plain in-memory tables, one map per entity
#[derive(Clone, Debug, Default)]
pub struct Tables {
    bootstraps: BTreeMap<BootstrapKey, BootstrapRecord>,
    states: BTreeMap<StateId, StateRecord>,
    history: BTreeMap<HistoryKey, UpdateHistoryEntry>,
    certificates: BTreeMap<CertificateKey, Certificate>,
    cursor: Option<ChainPoint>,
}

impl Tables {
    /// Create empty tables
    pub fn new() -> Self {
        Self::default()
    }

    /// Row counts: (bootstraps, states, history, certificates)
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        (
            self.bootstraps.len(),
            self.states.len(),
            self.history.len(),
            self.certificates.len(),
        )
    }
}

impl RepositoryReader for Tables {
    fn bootstraps(&self) -> StorageResult<Vec<BootstrapRecord>> {
        Ok(self.bootstraps.values().cloned().collect())
    }

    fn state(&self, id: &StateId) -> StorageResult<Option<StateRecord>> {
        Ok(self.states.get(id).cloned())
    }

    fn states(&self) -> StorageResult<Vec<StateRecord>> {
        Ok(self.states.values().cloned().collect())
    }

    fn history_of(&self, id: &StateId) -> StorageResult<Vec<UpdateHistoryEntry>> {
        Ok(self
            .history
            .range(history_range(id))
            .map(|(_, e)| e.clone())
            .collect())
    }

    fn certificates_of(&self, id: &StateId) -> StorageResult<Vec<Certificate>> {
        Ok(self
            .certificates
            .iter()
            .filter(|(k, _)| k.state_id == *id)
            .map(|(_, c)| c.clone())
            .collect())
    }

    fn certificate_keys(&self) -> StorageResult<Vec<CertificateKey>> {
        Ok(self.certificates.keys().copied().collect())
    }

    fn cursor(&self) -> StorageResult<Option<ChainPoint>> {
        Ok(self.cursor)
    }
}

impl RepositoryWriter for Tables {
    fn put_bootstrap(&mut self, record: BootstrapRecord) -> StorageResult<()> {
        self.bootstraps.insert(BootstrapKey::from(&record), record);
        Ok(())
    }

    fn delete_bootstrap(&mut self, key: &BootstrapKey) -> StorageResult<()> {
        self.bootstraps.remove(key);
        Ok(())
    }

    fn put_state(&mut self, record: StateRecord) -> StorageResult<()> {
        self.states.insert(record.id, record);
        Ok(())
    }

    fn delete_state(&mut self, id: &StateId) -> StorageResult<()> {
        self.states.remove(id);
        Ok(())
    }

    fn put_history(&mut self, entry: UpdateHistoryEntry) -> StorageResult<()> {
        self.history.insert(history_key(&entry), entry);
        Ok(())
    }

    fn delete_history(&mut self, key: &HistoryKey) -> StorageResult<()> {
        self.history.remove(key);
        Ok(())
    }

    fn put_certificate(&mut self, cert: Certificate) -> StorageResult<()> {
        self.certificates.insert(CertificateKey::from(&cert), cert);
        Ok(())
    }

    fn delete_certificate(&mut self, key: &CertificateKey) -> StorageResult<()> {
        self.certificates.remove(key);
        Ok(())
    }

    fn set_cursor(&mut self, point: Option<ChainPoint>) -> StorageResult<()> {
        self.cursor = point;
        Ok(())
    }
}

/// Thread-safe in-memory repository.
///
/// Readers proceed while a batch is being staged; they are only excluded for
/// the moment its changes are committed.
#[derive(Debug, Default)]
pub struct MemoryRepository {
    tables: RwLock<Tables>,
}

impl MemoryRepository {
    /// Create an empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current tables
    pub fn snapshot(&self) -> Tables {
        self.tables.read().clone()
    }
}

impl RepositoryReader for MemoryRepository {
    fn bootstraps(&self) -> StorageResult<Vec<BootstrapRecord>> {
        self.tables.read().bootstraps()
    }

    fn state(&self, id: &StateId) -> StorageResult<Option<StateRecord>> {
        self.tables.read().state(id)
    }

    fn states(&self) -> StorageResult<Vec<StateRecord>> {
        self.tables.read().states()
    }

    fn history_of(&self, id: &StateId) -> StorageResult<Vec<UpdateHistoryEntry>> {
        self.tables.read().history_of(id)
    }

    fn certificates_of(&self, id: &StateId) -> StorageResult<Vec<Certificate>> {
        self.tables.read().certificates_of(id)
    }

    fn certificate_keys(&self) -> StorageResult<Vec<CertificateKey>> {
        self.tables.read().certificate_keys()
    }

    fn cursor(&self) -> StorageResult<Option<ChainPoint>> {
        self.tables.read().cursor()
    }
}

impl Repository for MemoryRepository {
    fn apply<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut StagedBatch<'_>) -> Result<T, E>,
        E: From<StorageError>,
    {
        // Upgradable reads exclude each other, which serializes batches
        let guard = self.tables.upgradable_read();
        let (out, changes) = {
            let mut batch = StagedBatch::new(&*guard);
            let out = f(&mut batch)?;
            (out, batch.into_changes())
        };
        if !changes.is_empty() {
            let mut tables = RwLockUpgradableReadGuard::upgrade(guard);
            changes.write_to(&mut *tables)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notary_primitives::{Credential, OutputRef, H256};
    use notary_types::{BootstrapParams, SchemaVersion};

    fn bootstrap(name: &str, slot: u64) -> BootstrapRecord {
        BootstrapRecord {
            params: BootstrapParams {
                token_name: name.to_string(),
                allowed_credentials: vec![],
                fee: 10,
                fee_interval: 5,
                fee_receivers: vec![],
                ttl: 0,
                transaction_limit: 100,
                batch_size: 5,
            },
            schema_version: SchemaVersion::Current,
            creation_slot: slot,
            origin: OutputRef::new(H256::from_bytes([slot as u8; 32]), 0),
            invalidation_slot: None,
        }
    }

    #[test]
    fn test_failed_batch_leaves_no_trace() {
        let repo = MemoryRepository::new();
        let result: Result<(), StorageError> = repo.apply(|batch| {
            batch.insert_bootstrap(bootstrap("a", 1))?;
            Err(StorageError::Corrupt("boom".into()))
        });
        assert!(result.is_err());
        assert!(repo.bootstraps().unwrap().is_empty());
    }

    #[test]
    fn test_committed_batch_is_visible() {
        let repo = MemoryRepository::new();
        repo.apply(|batch| batch.insert_bootstrap(bootstrap("a", 1)))
            .unwrap();
        assert_eq!(repo.bootstrap("a").unwrap().unwrap().creation_slot, 1);
        assert_eq!(repo.snapshot().counts(), (1, 0, 0, 0));
    }

    #[test]
    fn test_batch_reads_its_own_writes() {
        let repo = MemoryRepository::new();
        repo.apply(|batch| {
            batch.insert_bootstrap(bootstrap("a", 1))?;
            assert!(batch.bootstrap("a")?.is_some());
            let dup = batch.insert_bootstrap(bootstrap("a", 2));
            assert!(matches!(dup, Err(StorageError::Duplicate(_))));
            Ok::<_, StorageError>(())
        })
        .unwrap();
        assert_eq!(repo.bootstraps().unwrap().len(), 1);
    }

    #[test]
    fn test_name_reusable_after_burn() {
        let repo = MemoryRepository::new();
        repo.apply(|batch| {
            batch.insert_bootstrap(bootstrap("a", 1))?;
            batch.invalidate_bootstrap("a", 5)?;
            batch.insert_bootstrap(bootstrap("a", 6))
        })
        .unwrap();
        let live = repo.bootstrap("a").unwrap().unwrap();
        assert_eq!(live.creation_slot, 6);
        assert!(live.is_live());
        assert_eq!(repo.live_bootstraps().unwrap().len(), 1);
    }

    #[test]
    fn test_state_owner_query() {
        let repo = MemoryRepository::new();
        let owner = Credential::from_bytes([1; 28]);
        let state = StateRecord {
            id: H256::from_bytes([2; 32]),
            owner,
            countdown: 9,
            creation_slot: 3,
            current_output: OutputRef::default(),
            certificate_data_hash: H256::ZERO,
            batch_size: 5,
            bootstrap_token_name: "a".into(),
            invalidation_slot: None,
        };
        repo.apply(|batch| batch.insert_state(state.clone())).unwrap();
        assert_eq!(repo.state_records_of(&owner).unwrap(), vec![state.clone()]);
        assert!(repo
            .state_records_of(&Credential::from_bytes([9; 28]))
            .unwrap()
            .is_empty());
        assert_eq!(repo.history_of(&state.id).unwrap(), vec![state.head_entry(3)]);
    }
}

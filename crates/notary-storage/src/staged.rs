//! Staged batches: writes buffered over a read-only base until commit

use crate::error::StorageResult;
use crate::keys::{history_key, history_range, BootstrapKey, CertificateKey, HistoryKey};
use crate::traits::{RepositoryReader, RepositoryWriter};
use notary_types::{
    BootstrapRecord, Certificate, ChainPoint, StateId, StateRecord, UpdateHistoryEntry,
};
use std::collections::BTreeMap;

/// Buffered row changes (`None` = deleted)
#[derive(Clone, Debug, Default)]
pub struct Changes {
    pub(crate) bootstraps: BTreeMap<BootstrapKey, Option<BootstrapRecord>>,
    pub(crate) states: BTreeMap<StateId, Option<StateRecord>>,
    pub(crate) history: BTreeMap<HistoryKey, Option<UpdateHistoryEntry>>,
    pub(crate) certificates: BTreeMap<CertificateKey, Option<Certificate>>,
    pub(crate) cursor: Option<Option<ChainPoint>>,
}

impl Changes {
    /// Number of changed rows
    pub fn len(&self) -> usize {
        self.bootstraps.len()
            + self.states.len()
            + self.history.len()
            + self.certificates.len()
            + usize::from(self.cursor.is_some())
    }

    /// Check if nothing changed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replay the changes onto a writer
    pub fn write_to<W: RepositoryWriter + ?Sized>(self, writer: &mut W) -> StorageResult<()> {
        for (key, row) in self.bootstraps {
            match row {
                Some(record) => writer.put_bootstrap(record)?,
                None => writer.delete_bootstrap(&key)?,
            }
        }
        for (id, row) in self.states {
            match row {
                Some(record) => writer.put_state(record)?,
                None => writer.delete_state(&id)?,
            }
        }
        for (key, row) in self.history {
            match row {
                Some(entry) => writer.put_history(entry)?,
                None => writer.delete_history(&key)?,
            }
        }
        for (key, row) in self.certificates {
            match row {
                Some(cert) => writer.put_certificate(cert)?,
                None => writer.delete_certificate(&key)?,
            }
        }
        if let Some(point) = self.cursor {
            writer.set_cursor(point)?;
        }
        Ok(())
    }
}

/// Layered repository view: buffered writes over an underlying reader
pub struct StagedBatch<'a> {
    base: &'a dyn RepositoryReader,
    changes: Changes,
}

impl<'a> StagedBatch<'a> {
    /// Create a new staged batch over `base`
    pub fn new(base: &'a dyn RepositoryReader) -> Self {
        Self {
            base,
            changes: Changes::default(),
        }
    }

    /// Buffered changes
    pub fn changes(&self) -> &Changes {
        &self.changes
    }

    /// Take the buffered changes
    pub fn into_changes(self) -> Changes {
        self.changes
    }
}

fn overlay<'c, K, V, I>(rows: &mut BTreeMap<K, V>, changes: I)
where
    K: Ord + Clone + 'c,
    V: Clone + 'c,
    I: Iterator<Item = (&'c K, &'c Option<V>)>,
{
    for (key, row) in changes {
        match row {
            Some(value) => {
                rows.insert(key.clone(), value.clone());
            }
            None => {
                rows.remove(key);
            }
        }
    }
}

impl RepositoryReader for StagedBatch<'_> {
    fn bootstraps(&self) -> StorageResult<Vec<BootstrapRecord>> {
        let mut rows: BTreeMap<BootstrapKey, BootstrapRecord> = self
            .base
            .bootstraps()?
            .into_iter()
            .map(|r| (BootstrapKey::from(&r), r))
            .collect();
        overlay(&mut rows, self.changes.bootstraps.iter());
        Ok(rows.into_values().collect())
    }

    fn state(&self, id: &StateId) -> StorageResult<Option<StateRecord>> {
        match self.changes.states.get(id) {
            Some(row) => Ok(row.clone()),
            None => self.base.state(id),
        }
    }

    fn states(&self) -> StorageResult<Vec<StateRecord>> {
        let mut rows: BTreeMap<StateId, StateRecord> = self
            .base
            .states()?
            .into_iter()
            .map(|r| (r.id, r))
            .collect();
        overlay(&mut rows, self.changes.states.iter());
        Ok(rows.into_values().collect())
    }

    fn history_of(&self, id: &StateId) -> StorageResult<Vec<UpdateHistoryEntry>> {
        let mut rows: BTreeMap<HistoryKey, UpdateHistoryEntry> = self
            .base
            .history_of(id)?
            .into_iter()
            .map(|e| (history_key(&e), e))
            .collect();
        overlay(
            &mut rows,
            self.changes.history.range(history_range(id)),
        );
        Ok(rows.into_values().collect())
    }

    fn certificates_of(&self, id: &StateId) -> StorageResult<Vec<Certificate>> {
        let mut rows: BTreeMap<CertificateKey, Certificate> = self
            .base
            .certificates_of(id)?
            .into_iter()
            .map(|c| (CertificateKey::from(&c), c))
            .collect();
        overlay(
            &mut rows,
            self.changes.certificates.iter().filter(|(k, _)| k.state_id == *id),
        );
        Ok(rows.into_values().collect())
    }

    fn certificate_keys(&self) -> StorageResult<Vec<CertificateKey>> {
        let mut keys: BTreeMap<CertificateKey, ()> = self
            .base
            .certificate_keys()?
            .into_iter()
            .map(|k| (k, ()))
            .collect();
        for (key, row) in &self.changes.certificates {
            match row {
                Some(_) => keys.insert(*key, ()),
                None => keys.remove(key),
            };
        }
        Ok(keys.into_keys().collect())
    }

    fn cursor(&self) -> StorageResult<Option<ChainPoint>> {
        match self.changes.cursor {
            Some(point) => Ok(point),
            None => self.base.cursor(),
        }
    }
}

impl RepositoryWriter for StagedBatch<'_> {
    fn put_bootstrap(&mut self, record: BootstrapRecord) -> StorageResult<()> {
        self.changes
            .bootstraps
            .insert(BootstrapKey::from(&record), Some(record));
        Ok(())
    }

    fn delete_bootstrap(&mut self, key: &BootstrapKey) -> StorageResult<()> {
        self.changes.bootstraps.insert(key.clone(), None);
        Ok(())
    }

    fn put_state(&mut self, record: StateRecord) -> StorageResult<()> {
        self.changes.states.insert(record.id, Some(record));
        Ok(())
    }

    fn delete_state(&mut self, id: &StateId) -> StorageResult<()> {
        self.changes.states.insert(*id, None);
        Ok(())
    }

    fn put_history(&mut self, entry: UpdateHistoryEntry) -> StorageResult<()> {
        self.changes.history.insert(history_key(&entry), Some(entry));
        Ok(())
    }

    fn delete_history(&mut self, key: &HistoryKey) -> StorageResult<()> {
        self.changes.history.insert(*key, None);
        Ok(())
    }

    fn put_certificate(&mut self, cert: Certificate) -> StorageResult<()> {
        self.changes
            .certificates
            .insert(CertificateKey::from(&cert), Some(cert));
        Ok(())
    }

    fn delete_certificate(&mut self, key: &CertificateKey) -> StorageResult<()> {
        self.changes.certificates.insert(*key, None);
        Ok(())
    }

    fn set_cursor(&mut self, point: Option<ChainPoint>) -> StorageResult<()> {
        self.changes.cursor = Some(point);
        Ok(())
    }
}

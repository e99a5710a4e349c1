//! RocksDB-backed repository

use crate::error::{StorageError, StorageResult};
use crate::keys::{self, BootstrapKey, CertificateKey, HistoryKey};
use crate::rows;
use crate::staged::StagedBatch;
use crate::traits::{Repository, RepositoryReader, RepositoryWriter};
use notary_types::{
    BootstrapRecord, Certificate, ChainPoint, StateId, StateRecord, UpdateHistoryEntry,
};
use parking_lot::{Mutex, RwLock};
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Column family names
pub mod cf {
    /// Bootstrap channels
    pub const BOOTSTRAPS: &str = "bootstraps";
    /// State records
    pub const STATES: &str = "states";
    /// Update history
    pub const HISTORY: &str = "history";
    /// Certificates
    pub const CERTIFICATES: &str = "certificates";
    /// Metadata (chain cursor)
    pub const META: &str = "meta";
}

/// All column family names
pub const ALL_CFS: &[&str] = &[
    cf::BOOTSTRAPS,
    cf::STATES,
    cf::HISTORY,
    cf::CERTIFICATES,
    cf::META,
];

const CURSOR_KEY: &[u8] = b"cursor";

type RocksDB = DBWithThreadMode<MultiThreaded>;

/// Database configuration
#[derive(Clone, Debug)]
pub struct DbConfig {
    /// Create database if missing
    pub create_if_missing: bool,
    /// Maximum number of open files
    pub max_open_files: i32,
    /// Write buffer size
    pub write_buffer_size: usize,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
            max_open_files: 512,
            write_buffer_size: 32 * 1024 * 1024, // 32MB
        }
    }
}

/// RocksDB wrapper with column family support
pub struct Database {
    db: Arc<RwLock<Option<RocksDB>>>,
    path: String,
}

impl Database {
    /// Create a new database instance (not yet opened)
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            db: Arc::new(RwLock::new(None)),
            path: path.as_ref().to_string_lossy().to_string(),
        }
    }

    /// Open the database with custom config
    pub fn open_with_config(&self, config: DbConfig) -> StorageResult<()> {
        let mut db_guard = self.db.write();
        if db_guard.is_some() {
            return Ok(());
        }

        let mut opts = Options::default();
        opts.create_if_missing(config.create_if_missing);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(config.max_open_files);
        opts.set_write_buffer_size(config.write_buffer_size);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = RocksDB::open_cf_descriptors(&opts, &self.path, cf_descriptors)?;
        *db_guard = Some(db);
        info!(path = %self.path, "repository opened");
        Ok(())
    }

    /// Close the database
    pub fn close(&self) {
        *self.db.write() = None;
    }

    /// Get a value from a column family
    pub fn get(&self, cf_name: &str, key: &[u8]) -> StorageResult<Option<Vec<u8>>> {
        let db_guard = self.db.read();
        let db = db_guard.as_ref().ok_or_else(not_open)?;
        let cf = self.get_cf(db, cf_name)?;
        Ok(db.get_cf(&cf, key)?)
    }

    /// All values whose key starts with `prefix`, in key order
    pub fn scan(&self, cf_name: &str, prefix: &[u8]) -> StorageResult<Vec<(Vec<u8>, Vec<u8>)>> {
        let db_guard = self.db.read();
        let db = db_guard.as_ref().ok_or_else(not_open)?;
        let cf = self.get_cf(db, cf_name)?;
        let mut out = Vec::new();
        for item in db.iterator_cf(&cf, IteratorMode::From(prefix, Direction::Forward)) {
            let (key, value) = item?;
            if !key.starts_with(prefix) {
                break;
            }
            out.push((key.to_vec(), value.to_vec()));
        }
        Ok(out)
    }

    /// Execute a write batch
    pub fn write_batch(&self, batch: WriteBatchWrapper) -> StorageResult<()> {
        let db_guard = self.db.read();
        let db = db_guard.as_ref().ok_or_else(not_open)?;

        let mut rocks_batch = WriteBatch::default();
        for op in batch.operations {
            match op {
                BatchOp::Put { cf_name, key, value } => {
                    let cf = self.get_cf(db, cf_name)?;
                    rocks_batch.put_cf(&cf, &key, &value);
                }
                BatchOp::Delete { cf_name, key } => {
                    let cf = self.get_cf(db, cf_name)?;
                    rocks_batch.delete_cf(&cf, &key);
                }
            }
        }

        db.write(rocks_batch)?;
        Ok(())
    }

    fn get_cf<'a>(&self, db: &'a RocksDB, name: &str) -> StorageResult<Arc<BoundColumnFamily<'a>>> {
        db.cf_handle(name)
            .ok_or_else(|| StorageError::InvalidColumnFamily(name.to_string()))
    }

    /// Get database path
    pub fn path(&self) -> &str {
        &self.path
    }
}

fn not_open() -> StorageError {
    StorageError::NotFound("database not open".into())
}

enum BatchOp {
    Put { cf_name: &'static str, key: Vec<u8>, value: Vec<u8> },
    Delete { cf_name: &'static str, key: Vec<u8> },
}

/// Write batch wrapper
#[derive(Default)]
pub struct WriteBatchWrapper {
    operations: Vec<BatchOp>,
}

impl WriteBatchWrapper {
    /// Add a put operation
    pub fn put(&mut self, cf_name: &'static str, key: Vec<u8>, value: Vec<u8>) {
        self.operations.push(BatchOp::Put { cf_name, key, value });
    }

    /// Add a delete operation
    pub fn delete(&mut self, cf_name: &'static str, key: Vec<u8>) {
        self.operations.push(BatchOp::Delete { cf_name, key });
    }

    /// Get number of operations
    pub fn len(&self) -> usize {
        self.operations.len()
    }

    /// Check if batch is empty
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl RepositoryWriter for WriteBatchWrapper {
    fn put_bootstrap(&mut self, record: BootstrapRecord) -> StorageResult<()> {
        let key = rows::bootstrap_key(&BootstrapKey::from(&record));
        self.put(cf::BOOTSTRAPS, key, rows::encode_bootstrap(&record));
        Ok(())
    }

    fn delete_bootstrap(&mut self, key: &BootstrapKey) -> StorageResult<()> {
        self.delete(cf::BOOTSTRAPS, rows::bootstrap_key(key));
        Ok(())
    }

    fn put_state(&mut self, record: StateRecord) -> StorageResult<()> {
        self.put(cf::STATES, rows::state_key(&record.id), rows::encode_state(&record));
        Ok(())
    }

    fn delete_state(&mut self, id: &StateId) -> StorageResult<()> {
        self.delete(cf::STATES, rows::state_key(id));
        Ok(())
    }

    fn put_history(&mut self, entry: UpdateHistoryEntry) -> StorageResult<()> {
        let key = rows::history_key(&keys::history_key(&entry));
        self.put(cf::HISTORY, key, rows::encode_history(&entry));
        Ok(())
    }

    fn delete_history(&mut self, key: &HistoryKey) -> StorageResult<()> {
        self.delete(cf::HISTORY, rows::history_key(key));
        Ok(())
    }

    fn put_certificate(&mut self, cert: Certificate) -> StorageResult<()> {
        let key = rows::certificate_key(&CertificateKey::from(&cert));
        self.put(cf::CERTIFICATES, key, rows::encode_certificate(&cert));
        Ok(())
    }

    fn delete_certificate(&mut self, key: &CertificateKey) -> StorageResult<()> {
        self.delete(cf::CERTIFICATES, rows::certificate_key(key));
        Ok(())
    }

    fn set_cursor(&mut self, point: Option<ChainPoint>) -> StorageResult<()> {
        match point {
            Some(point) => self.put(cf::META, CURSOR_KEY.to_vec(), rows::encode_point(&point)),
            None => self.delete(cf::META, CURSOR_KEY.to_vec()),
        }
        Ok(())
    }
}

/// Repository persisted in RocksDB, one column family per table
pub struct RocksRepository {
    db: Database,
    writer: Mutex<()>,
}

impl RocksRepository {
    /// Open (or create) a repository at `path`
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with_config(path, DbConfig::default())
    }

    /// Open with custom database options
    pub fn open_with_config(path: impl AsRef<Path>, config: DbConfig) -> StorageResult<Self> {
        let db = Database::new(path);
        db.open_with_config(config)?;
        Ok(Self {
            db,
            writer: Mutex::new(()),
        })
    }

    /// Underlying database
    pub fn database(&self) -> &Database {
        &self.db
    }

    fn decode_all<T>(
        &self,
        cf_name: &str,
        prefix: &[u8],
        decode: fn(&[u8]) -> StorageResult<T>,
    ) -> StorageResult<Vec<T>> {
        self.db
            .scan(cf_name, prefix)?
            .into_iter()
            .map(|(_, value)| decode(&value))
            .collect()
    }
}

impl RepositoryReader for RocksRepository {
    fn bootstraps(&self) -> StorageResult<Vec<BootstrapRecord>> {
        self.decode_all(cf::BOOTSTRAPS, &[], rows::decode_bootstrap)
    }

    fn state(&self, id: &StateId) -> StorageResult<Option<StateRecord>> {
        self.db
            .get(cf::STATES, &rows::state_key(id))?
            .map(|bytes| rows::decode_state(&bytes))
            .transpose()
    }

    fn states(&self) -> StorageResult<Vec<StateRecord>> {
        self.decode_all(cf::STATES, &[], rows::decode_state)
    }

    fn history_of(&self, id: &StateId) -> StorageResult<Vec<UpdateHistoryEntry>> {
        self.decode_all(cf::HISTORY, id.as_bytes(), rows::decode_history)
    }

    fn certificates_of(&self, id: &StateId) -> StorageResult<Vec<Certificate>> {
        self.decode_all(cf::CERTIFICATES, id.as_bytes(), rows::decode_certificate)
    }

    fn certificate_keys(&self) -> StorageResult<Vec<CertificateKey>> {
        Ok(self
            .decode_all(cf::CERTIFICATES, &[], rows::decode_certificate)?
            .iter()
            .map(CertificateKey::from)
            .collect())
    }

    fn cursor(&self) -> StorageResult<Option<ChainPoint>> {
        self.db
            .get(cf::META, CURSOR_KEY)?
            .map(|bytes| rows::decode_point(&bytes))
            .transpose()
    }
}

impl Repository for RocksRepository {
    fn apply<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut StagedBatch<'_>) -> Result<T, E>,
        E: From<StorageError>,
    {
        let _writer = self.writer.lock();
        let mut batch = StagedBatch::new(self);
        let out = f(&mut batch)?;
        let changes = batch.into_changes();
        if !changes.is_empty() {
            let mut write = WriteBatchWrapper::default();
            changes.write_to(&mut write)?;
            debug!(ops = write.len(), "committing batch");
            self.db.write_batch(write)?;
        }
        Ok(out)
    }
}

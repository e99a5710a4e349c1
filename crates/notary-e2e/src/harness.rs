//! Test harness for E2E testing
//!
//! Wires the operation API, a [`SimulatedLedger`] and an indexer over one
//! in-memory repository. Every helper that submits a transaction confirms it
//! on the ledger and ingests the resulting outputs before returning.

use crate::ledger::SimulatedLedger;
use crate::{E2EError, E2EResult};
use notary_core::{ExtensionRegistry, Indexer, IngestSummary, RollbackSummary};
use notary_metrics::Metrics;
use notary_primitives::{Address, Credential, PolicyId, Slot};
use notary_storage::{MemoryRepository, RepositoryReader};
use notary_tx::{AssemblyConfig, NotaryService, UnsignedTransaction};
use notary_types::{BootstrapParams, CertificateData, ScriptSet, StateId, StateRecord};
use std::sync::Arc;

/// Network id used by the harness
pub const TEST_NETWORK_ID: u8 = 0;

/// Ledger tip when a harness starts
pub const GENESIS_SLOT: Slot = 1_000;

/// Funding given to each test user (100k ADA)
pub const FUNDED_LOVELACE: u64 = 100_000_000_000;

/// Script hashes of the simulated deployment
pub fn test_scripts() -> ScriptSet {
    ScriptSet {
        bootstrap_policy: PolicyId::from_bytes([0xb0; 28]),
        state_policy: PolicyId::from_bytes([0x50; 28]),
        bootstrap_validator: PolicyId::from_bytes([0xb1; 28]),
        state_validator: PolicyId::from_bytes([0x51; 28]),
    }
}

/// A key-holding user of the notary
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TestUser {
    /// Payment credential
    pub credential: Credential,
    /// Enterprise address of `credential`
    pub address: Address,
}

impl TestUser {
    /// User whose credential is `tag` repeated
    pub fn new(tag: u8) -> Self {
        let credential = Credential::from_bytes([tag; 28]);
        Self {
            credential,
            address: Address::from_key_credential(TEST_NETWORK_ID, &credential),
        }
    }
}

/// End-to-end harness
pub struct TestHarness {
    ledger: Arc<SimulatedLedger>,
    indexer: Indexer<MemoryRepository>,
    service: NotaryService<MemoryRepository>,
    metrics: Arc<Metrics>,
}

impl TestHarness {
    /// Harness without extensions
    pub fn new() -> Self {
        Self::with_extensions(ExtensionRegistry::new())
    }

    /// Harness whose indexer fans out to `extensions`
    pub fn with_extensions(extensions: ExtensionRegistry) -> Self {
        let repo = Arc::new(MemoryRepository::new());
        let ledger = Arc::new(SimulatedLedger::new(GENESIS_SLOT));
        let metrics = Arc::new(Metrics::new());
        let indexer = Indexer::new(Arc::clone(&repo), test_scripts())
            .with_extensions(extensions)
            .with_metrics(Arc::clone(&metrics));
        let service = NotaryService::new(
            repo,
            Arc::clone(&ledger) as Arc<dyn notary_tx::LedgerClient>,
            AssemblyConfig::new(TEST_NETWORK_ID, test_scripts()),
        )
        .with_metrics(Arc::clone(&metrics));
        Self {
            ledger,
            indexer,
            service,
            metrics,
        }
    }

    /// Create a user and give it one funding output
    pub fn create_user(&self, tag: u8) -> TestUser {
        let user = TestUser::new(tag);
        self.ledger.fund(&user.address, FUNDED_LOVELACE);
        user
    }

    /// Operation API
    pub fn service(&self) -> &NotaryService<MemoryRepository> {
        &self.service
    }

    /// Mirror repository
    pub fn repository(&self) -> &Arc<MemoryRepository> {
        self.indexer.repository()
    }

    /// Simulated ledger
    pub fn ledger(&self) -> &Arc<SimulatedLedger> {
        &self.ledger
    }

    /// Indexer feeding the repository
    pub fn indexer(&self) -> &Indexer<MemoryRepository> {
        &self.indexer
    }

    /// Shared metrics of the indexer and the service
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    // ==================== Submission ====================

    /// Confirm `tx` on the ledger and ingest its outputs
    pub fn submit(&self, tx: &UnsignedTransaction) -> E2EResult<IngestSummary> {
        let outputs = self.ledger.confirm(tx)?;
        Ok(self.indexer.apply_outputs(&outputs)?)
    }

    /// Open a channel and wait for it to be mirrored
    pub async fn init_channel(&self, user: &TestUser, params: BootstrapParams) -> E2EResult<IngestSummary> {
        let tx = self.service.init_channel(&user.address, params).await?;
        self.submit(&tx)
    }

    /// Persist certificates through the cheapest path and ingest the result
    pub async fn persist(&self, user: &TestUser, certificates: Vec<CertificateData>) -> E2EResult<IngestSummary> {
        let tx = self.service.persist_certificates(&user.address, certificates).await?;
        self.submit(&tx)
    }

    /// Fork a named channel and ingest the result
    pub async fn fork(
        &self,
        user: &TestUser,
        certificates: Vec<CertificateData>,
        channel: &str,
    ) -> E2EResult<IngestSummary> {
        let tx = self.service.fork(&user.address, certificates, Some(channel)).await?;
        self.submit(&tx)
    }

    /// Burn every usable state of `user` and ingest the result
    pub async fn invalidate_all(&self, user: &TestUser) -> E2EResult<IngestSummary> {
        let tx = self.service.invalidate_all(&user.address).await?;
        self.submit(&tx)
    }

    /// Roll both the ledger and the mirror back to `slot`
    pub fn rollback_to(&self, slot: Slot) -> E2EResult<RollbackSummary> {
        self.ledger.rollback_to(slot);
        Ok(self.indexer.rollback_to(slot)?)
    }

    // ==================== Queries ====================

    /// State records owned by `user`
    pub fn states_of(&self, user: &TestUser) -> E2EResult<Vec<StateRecord>> {
        Ok(self.repository().state_records_of(&user.credential)?)
    }

    /// The only state record owned by `user`
    pub fn single_state(&self, user: &TestUser) -> E2EResult<StateRecord> {
        let mut states = self.states_of(user)?;
        match states.len() {
            1 => Ok(states.remove(0)),
            n => Err(E2EError::Assertion(format!("expected one state, found {}", n))),
        }
    }

    /// Number of certificates mirrored for `id`
    pub fn certificate_count(&self, id: &StateId) -> E2EResult<usize> {
        Ok(self.repository().certificates_of(id)?.len())
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

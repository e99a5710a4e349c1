//! Single-writer indexer
//!
//! All repository mutations go through one [`Indexer`]. A batch of outputs or
//! a rollback is staged, fanned out to extensions and committed as a unit;
//! the writer lock keeps ingestion and rollback from interleaving.

use crate::error::IngestResult;
use crate::extension::ExtensionRegistry;
use crate::ingest::{ingest_outputs, IngestSummary};
use crate::rollback::{rollback_to, RollbackSummary};
use notary_metrics::{names, timed, Metrics};
use notary_primitives::Slot;
use notary_storage::{Repository, RepositoryReader};
use notary_types::{ChainEvent, ChainPoint, LedgerOutput, ScriptSet};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{error, info};

/// Result of applying one feed event
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventOutcome {
    /// A batch of outputs was ingested
    Ingested(IngestSummary),
    /// A rollback was applied
    RolledBack(RollbackSummary),
}

/// Applies the ingestion feed to a repository
pub struct Indexer<R: Repository> {
    repo: Arc<R>,
    scripts: ScriptSet,
    extensions: ExtensionRegistry,
    metrics: Arc<Metrics>,
    writer: Mutex<()>,
}

impl<R: Repository> Indexer<R> {
    /// Create an indexer without extensions
    pub fn new(repo: Arc<R>, scripts: ScriptSet) -> Self {
        Self {
            repo,
            scripts,
            extensions: ExtensionRegistry::new(),
            metrics: Arc::new(Metrics::new()),
            writer: Mutex::new(()),
        }
    }

    /// Use `extensions` for fan-out
    pub fn with_extensions(mut self, extensions: ExtensionRegistry) -> Self {
        self.extensions = extensions;
        self
    }

    /// Record into a shared metrics collector
    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// The repository being written
    pub fn repository(&self) -> &Arc<R> {
        &self.repo
    }

    /// Script set outputs are classified against
    pub fn scripts(&self) -> &ScriptSet {
        &self.scripts
    }

    /// Metrics collector
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }

    /// Last applied chain position
    pub fn cursor(&self) -> IngestResult<Option<ChainPoint>> {
        Ok(self.repo.cursor()?)
    }

    /// Ingest a batch of confirmed outputs, in order, as one atomic unit
    pub fn apply_outputs(&self, outputs: &[LedgerOutput]) -> IngestResult<IngestSummary> {
        let _writer = self.writer.lock();
        let result: IngestResult<IngestSummary> = timed!(self.metrics, names::INGEST_BATCH_US, {
            self.repo.apply(|batch| {
                let summary = ingest_outputs(batch, &self.scripts, outputs)?;
                self.extensions.notify_outputs(&*batch, outputs)?;
                Ok(summary)
            })
        });

        match &result {
            Ok(summary) => {
                self.record_ingest(summary);
                info!(
                    outputs = summary.outputs,
                    certificates = summary.certificates,
                    skipped = summary.decode_errors,
                    "batch applied"
                );
            }
            Err(err) => {
                self.metrics.counter(names::INGEST_ABORTED, 1);
                error!(outputs = outputs.len(), error = %err, "batch aborted");
            }
        }
        result
    }

    /// Roll the repository back to `slot` as one atomic unit
    pub fn rollback_to(&self, slot: Slot) -> IngestResult<RollbackSummary> {
        let _writer = self.writer.lock();
        let result: IngestResult<RollbackSummary> = self.repo.apply(|batch| {
            let summary = rollback_to(batch, slot)?;
            self.extensions.notify_rollback(&*batch, slot)?;
            Ok(summary)
        });

        match &result {
            Ok(_) => {
                self.metrics.counter(names::ROLLBACK_COUNT, 1);
                self.record_cursor();
            }
            Err(err) => error!(slot, error = %err, "rollback aborted"),
        }
        result
    }

    /// Apply one feed event
    pub fn apply_event(&self, event: &ChainEvent) -> IngestResult<EventOutcome> {
        match event {
            ChainEvent::RollForward { outputs } => self.apply_outputs(outputs).map(EventOutcome::Ingested),
            ChainEvent::RollBackward { slot } => self.rollback_to(*slot).map(EventOutcome::RolledBack),
        }
    }

    fn record_ingest(&self, summary: &IngestSummary) {
        let m = &self.metrics;
        m.counter(names::INGEST_OUTPUTS, summary.outputs as u64);
        m.counter(names::INGEST_DECODE_ERRORS, summary.decode_errors as u64);
        m.counter(names::INGEST_BOOTSTRAP_MINTS, summary.bootstrap_mints as u64);
        m.counter(names::INGEST_BOOTSTRAP_BURNS, summary.bootstrap_burns as u64);
        m.counter(
            names::INGEST_STATE_UPDATES,
            (summary.state_forks + summary.state_updates) as u64,
        );
        m.counter(names::INGEST_STATE_BURNS, summary.state_burns as u64);
        m.counter(names::INGEST_CERTIFICATES, summary.certificates as u64);
        self.record_cursor();
    }

    fn record_cursor(&self) {
        if let Ok(Some(cursor)) = self.repo.cursor() {
            self.metrics.gauge(names::CURSOR_SLOT, cursor.slot as i64);
        }
    }
}

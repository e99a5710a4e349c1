//! Node orchestration for notary-node
//!
//! One task reads the feed; the run loop is the single writer and applies
//! events in order through the [`Indexer`]. A batch that aborts or a
//! malformed feed line stops the node, leaving the cursor at the last
//! committed event.

use crate::feed::{read_feed, FeedError, FeedStats};
use notary_core::{EventOutcome, IngestError, Indexer};
use notary_storage::Repository;
use notary_types::ChainEvent;
use std::sync::Arc;
use thiserror::Error;
use tokio::io::AsyncBufRead;
use tokio::sync::mpsc;
use tracing::{error, info};

/// Node error types
#[derive(Debug, Error)]
pub enum NodeError {
    /// A feed event could not be applied
    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),
    /// The feed ended on a line that is not an event
    #[error("feed error: {0}")]
    Feed(#[from] FeedError),
    /// Storage error
    #[error("storage error: {0}")]
    Storage(#[from] notary_storage::StorageError),
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Internal error
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for node operations
pub type NodeResult<T> = Result<T, NodeError>;

/// Totals for one run of the node
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RunStats {
    /// Feed reader counters
    pub feed: FeedStats,
    /// Roll-forward batches committed
    pub batches: usize,
    /// Rollbacks committed
    pub rollbacks: usize,
    /// Certificates persisted
    pub certificates: usize,
}

/// Certificate notary mirror node
pub struct Node<R: Repository> {
    indexer: Arc<Indexer<R>>,
    queue_depth: usize,
}

impl<R: Repository + 'static> Node<R> {
    /// Create a node writing through `indexer`
    pub fn new(indexer: Indexer<R>, queue_depth: usize) -> Self {
        Self {
            indexer: Arc::new(indexer),
            queue_depth: queue_depth.max(1),
        }
    }

    /// The indexer
    pub fn indexer(&self) -> &Arc<Indexer<R>> {
        &self.indexer
    }

    /// Consume the feed in `reader` until it ends or an event aborts
    pub async fn run<Rd>(&self, reader: Rd) -> NodeResult<RunStats>
    where
        Rd: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::channel::<ChainEvent>(self.queue_depth);
        let feed = tokio::spawn(read_feed(reader, tx));
        let mut stats = RunStats::default();

        while let Some(event) = rx.recv().await {
            let indexer = Arc::clone(&self.indexer);
            let applied = tokio::task::spawn_blocking(move || indexer.apply_event(&event))
                .await
                .map_err(|e| NodeError::Internal(format!("writer task failed: {}", e)))?;

            match applied {
                Ok(EventOutcome::Ingested(summary)) => {
                    stats.batches += 1;
                    stats.certificates += summary.certificates;
                }
                Ok(EventOutcome::RolledBack(summary)) => {
                    stats.rollbacks += 1;
                    info!(
                        slot = summary.slot,
                        certificates = summary.certificates_deleted,
                        records = summary.records_deleted,
                        "rolled back"
                    );
                }
                Err(e) => {
                    error!(error = %e, "stopping on aborted event");
                    drop(rx);
                    feed.abort();
                    return Err(e.into());
                }
            }
        }

        let fed = feed
            .await
            .map_err(|e| NodeError::Internal(format!("feed task failed: {}", e)))?;
        stats.feed = match fed {
            Ok(feed_stats) => feed_stats,
            Err(e) => {
                error!(error = %e, batches = stats.batches, "stopping on bad feed");
                return Err(e.into());
            }
        };
        info!(batches = stats.batches, rollbacks = stats.rollbacks, "feed drained");
        Ok(stats)
    }
}

//! # notary-metrics
//!
//! Counters, gauges and latency histograms for the certificate notary.
//!
//! Metric names used by the pipeline live in [`names`]; snapshots export as JSON.

#![warn(missing_docs)]
#![warn(clippy::all)]

mod collector;
mod export;
mod histogram;

pub use collector::Metrics;
pub use export::{HistogramSummary, MetricsSnapshot};
pub use histogram::Histogram;

/// Metric names
pub mod names {
    /// Outputs seen by ingestion
    pub const INGEST_OUTPUTS: &str = "ingest.outputs";
    /// Outputs skipped because their datum did not decode
    pub const INGEST_DECODE_ERRORS: &str = "ingest.decode_errors";
    /// Bootstrap channels created
    pub const INGEST_BOOTSTRAP_MINTS: &str = "ingest.bootstrap_mints";
    /// Bootstrap channels burned
    pub const INGEST_BOOTSTRAP_BURNS: &str = "ingest.bootstrap_burns";
    /// State records created or advanced
    pub const INGEST_STATE_UPDATES: &str = "ingest.state_updates";
    /// State records burned
    pub const INGEST_STATE_BURNS: &str = "ingest.state_burns";
    /// Certificates persisted
    pub const INGEST_CERTIFICATES: &str = "ingest.certificates";
    /// Batches aborted
    pub const INGEST_ABORTED: &str = "ingest.aborted";
    /// Batch latency (microseconds)
    pub const INGEST_BATCH_US: &str = "ingest.batch_us";
    /// Rollbacks applied
    pub const ROLLBACK_COUNT: &str = "rollback.count";
    /// Slot of the chain cursor
    pub const CURSOR_SLOT: &str = "cursor.slot";

    /// Counter name for an assembled transaction of `operation`
    pub fn assembly(operation: &str) -> String {
        format!("assembly.{}", operation)
    }
}

/// Macro for timing a block of code into a histogram (microseconds)
#[macro_export]
macro_rules! timed {
    ($metrics:expr, $name:expr, $block:block) => {{
        let start = std::time::Instant::now();
        let result = $block;
        $metrics.histogram($name, start.elapsed().as_micros() as f64);
        result
    }};
}

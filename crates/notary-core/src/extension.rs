//! Extension fan-out
//!
//! Extensions observe every ingested batch and every rollback, in
//! registration order, before the batch commits. An extension error aborts
//! the batch.

use crate::error::{IngestError, IngestResult};
use notary_primitives::Slot;
use notary_storage::RepositoryReader;
use notary_types::LedgerOutput;
use std::sync::Arc;
use tracing::debug;

/// A module reacting to the ingestion feed
pub trait LedgerExtension: Send + Sync {
    /// Name used in logs and errors
    fn name(&self) -> &str;

    /// Called with each batch of outputs after the core has staged it.
    ///
    /// `view` reflects the staged batch.
    fn on_outputs(&self, view: &dyn RepositoryReader, outputs: &[LedgerOutput]) -> anyhow::Result<()>;

    /// Called after a rollback to `slot` has been staged
    fn on_rollback(&self, view: &dyn RepositoryReader, slot: Slot) -> anyhow::Result<()> {
        let _ = (view, slot);
        Ok(())
    }
}

/// Ordered list of registered extensions
#[derive(Clone, Default)]
pub struct ExtensionRegistry {
    extensions: Vec<Arc<dyn LedgerExtension>>,
}

impl ExtensionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an extension; it runs after every earlier one
    pub fn register(&mut self, extension: Arc<dyn LedgerExtension>) {
        self.extensions.push(extension);
    }

    /// Registered names, in order
    pub fn names(&self) -> Vec<&str> {
        self.extensions.iter().map(|e| e.name()).collect()
    }

    /// Number of registered extensions
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Whether no extension is registered
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Fan a batch of outputs out, stopping at the first failure
    pub fn notify_outputs(&self, view: &dyn RepositoryReader, outputs: &[LedgerOutput]) -> IngestResult<()> {
        for extension in &self.extensions {
            debug!(extension = extension.name(), outputs = outputs.len(), "notifying extension");
            extension
                .on_outputs(view, outputs)
                .map_err(|e| failed(extension.as_ref(), e))?;
        }
        Ok(())
    }

    /// Fan a rollback out, stopping at the first failure
    pub fn notify_rollback(&self, view: &dyn RepositoryReader, slot: Slot) -> IngestResult<()> {
        for extension in &self.extensions {
            debug!(extension = extension.name(), slot, "notifying extension of rollback");
            extension
                .on_rollback(view, slot)
                .map_err(|e| failed(extension.as_ref(), e))?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("extensions", &self.names())
            .finish()
    }
}

fn failed(extension: &dyn LedgerExtension, err: anyhow::Error) -> IngestError {
    IngestError::Extension {
        name: extension.name().to_string(),
        reason: format!("{:#}", err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notary_storage::Tables;
    use parking_lot::Mutex;

    struct Recorder {
        name: &'static str,
        log: Arc<Mutex<Vec<String>>>,
        fail: bool,
    }

    impl LedgerExtension for Recorder {
        fn name(&self) -> &str {
            self.name
        }

        fn on_outputs(&self, _view: &dyn RepositoryReader, outputs: &[LedgerOutput]) -> anyhow::Result<()> {
            self.log.lock().push(format!("{}:{}", self.name, outputs.len()));
            if self.fail {
                anyhow::bail!("refused");
            }
            Ok(())
        }

        fn on_rollback(&self, _view: &dyn RepositoryReader, slot: Slot) -> anyhow::Result<()> {
            self.log.lock().push(format!("{}@{}", self.name, slot));
            Ok(())
        }
    }

    fn recorder(name: &'static str, log: &Arc<Mutex<Vec<String>>>, fail: bool) -> Arc<dyn LedgerExtension> {
        Arc::new(Recorder { name, log: log.clone(), fail })
    }

    #[test]
    fn test_notified_in_registration_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ExtensionRegistry::new();
        registry.register(recorder("first", &log, false));
        registry.register(recorder("second", &log, false));
        assert_eq!(registry.names(), vec!["first", "second"]);

        let tables = Tables::new();
        registry.notify_outputs(&tables, &[]).unwrap();
        registry.notify_rollback(&tables, 7).unwrap();
        assert_eq!(*log.lock(), vec!["first:0", "second:0", "first@7", "second@7"]);
    }

    #[test]
    fn test_failure_stops_fan_out() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut registry = ExtensionRegistry::new();
        registry.register(recorder("picky", &log, true));
        registry.register(recorder("never", &log, false));

        match registry.notify_outputs(&Tables::new(), &[]) {
            Err(IngestError::Extension { name, reason }) => {
                assert_eq!(name, "picky");
                assert_eq!(reason, "refused");
            }
            other => panic!("expected extension error, got {:?}", other),
        }
        assert_eq!(*log.lock(), vec!["picky:0"]);
    }
}

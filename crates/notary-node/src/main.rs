//! Certificate notary mirror node binary
//!
//! Follows a JSON-lines ledger feed and keeps the notary repository in sync.

mod cli;
mod config;
mod feed;
mod node;

use anyhow::{Context, Result};
use cli::Cli;
use config::NodeConfig;
use node::{Node, NodeResult};
use notary_core::Indexer;
use notary_metrics::{Metrics, MetricsSnapshot};
use notary_storage::Repository;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse_args();

    // RUST_LOG wins over --log-level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::registry()
        .with(cli.log_json.then(|| fmt::layer().json()))
        .with((!cli.log_json).then(|| fmt::layer()))
        .with(filter)
        .init();

    let config = NodeConfig::load(&cli.config)
        .and_then(|c| c.apply_cli(&cli))
        .with_context(|| format!("loading {}", cli.config.display()))?;
    tracing::info!(
        network_id = config.network_id,
        data_dir = %config.data_dir.display(),
        "certificate notary node starting"
    );

    let repo = Arc::new(open_repository(&config)?);
    let metrics = Arc::new(Metrics::new());
    let indexer = Indexer::new(repo, config.scripts.clone()).with_metrics(Arc::clone(&metrics));
    let node = Node::new(indexer, config.queue_depth);

    match node.indexer().cursor()? {
        Some(cursor) => tracing::info!(slot = cursor.slot, block = %cursor.block_hash, "resuming"),
        None => tracing::info!("empty repository, starting from the first feed event"),
    }

    let reader = open_feed(&config).await?;
    tokio::select! {
        result = node.run(reader) => {
            let stats = result?;
            tracing::info!(
                events = stats.feed.events,
                certificates = stats.certificates,
                "certificate notary node stopped"
            );
        }
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutdown signal received");
        }
    }

    if cli.metrics {
        println!("{}", MetricsSnapshot::from_metrics(&metrics).to_json()?);
    }
    Ok(())
}

#[cfg(feature = "rocksdb")]
fn open_repository(config: &NodeConfig) -> NodeResult<impl Repository + 'static> {
    std::fs::create_dir_all(&config.data_dir)?;
    Ok(notary_storage::RocksRepository::open(config.data_dir.join("db"))?)
}

#[cfg(not(feature = "rocksdb"))]
fn open_repository(_config: &NodeConfig) -> NodeResult<impl Repository + 'static> {
    tracing::warn!("built without the rocksdb feature, repository is not persisted");
    Ok(notary_storage::MemoryRepository::new())
}

/// Feed file from the config, or stdin
async fn open_feed(config: &NodeConfig) -> Result<Box<dyn AsyncBufRead + Unpin + Send>> {
    match &config.feed {
        Some(path) => {
            tracing::info!("Reading feed from {:?}", path);
            let file = tokio::fs::File::open(path)
                .await
                .with_context(|| format!("opening feed {}", path.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        None => {
            tracing::info!("Reading feed from stdin");
            Ok(Box::new(BufReader::new(tokio::io::stdin())))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use tokio::io::AsyncBufReadExt;

    fn config(feed: Option<std::path::PathBuf>) -> NodeConfig {
        let mut config = NodeConfig::from_toml(
            r#"
[scripts]
bootstrap_policy = "b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0b0"
state_policy = "50505050505050505050505050505050505050505050505050505050"
bootstrap_validator = "b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1b1"
state_validator = "51515151515151515151515151515151515151515151515151515151"
"#,
        )
        .unwrap();
        config.feed = feed;
        config
    }

    #[tokio::test]
    async fn test_open_feed_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"{\"roll_backward\":{\"slot\":3}}\n").unwrap();

        let reader = open_feed(&config(Some(file.path().to_path_buf()))).await.unwrap();
        let mut lines = reader.lines();
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("{\"roll_backward\":{\"slot\":3}}"));
    }

    #[tokio::test]
    async fn test_open_feed_missing_file() {
        let missing = config(Some("/nonexistent/feed.jsonl".into()));
        assert!(open_feed(&missing).await.is_err());
    }
}

//! CLI argument parsing for notary-node

use clap::Parser;
use std::path::PathBuf;

/// Certificate notary mirror node
#[derive(Parser, Debug, Clone)]
#[command(name = "certnotary")]
#[command(about = "Mirrors certificate notary state from a ledger feed")]
#[command(version)]
pub struct Cli {
    /// Configuration file (TOML)
    #[arg(long, short = 'c', default_value = "notary.toml")]
    pub config: PathBuf,

    /// Data directory, overrides the config file
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    /// Feed file (JSON lines), overrides the config file; stdin when neither is set
    #[arg(long)]
    pub feed: Option<PathBuf>,

    /// Address network id, overrides the config file
    #[arg(long)]
    pub network_id: Option<u8>,

    /// Event queue depth, overrides the config file
    #[arg(long)]
    pub queue_depth: Option<usize>,

    /// Log level (trace, debug, info, warn, error); RUST_LOG takes precedence
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Emit logs as JSON
    #[arg(long, default_value_t = false)]
    pub log_json: bool,

    /// Print a metrics snapshot on exit
    #[arg(long, default_value_t = false)]
    pub metrics: bool,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::parse_from(["certnotary"]);
        assert_eq!(cli.config, PathBuf::from("notary.toml"));
        assert!(cli.data_dir.is_none());
        assert!(cli.feed.is_none());
        assert!(cli.network_id.is_none());
        assert_eq!(cli.log_level, "info");
        assert!(!cli.log_json);
        assert!(!cli.metrics);
    }

    #[test]
    fn test_cli_custom_values() {
        let cli = Cli::parse_from([
            "certnotary",
            "-c", "/etc/notary.toml",
            "--data-dir", "/var/lib/notary",
            "--feed", "blocks.jsonl",
            "--network-id", "1",
            "--queue-depth", "16",
            "--log-level", "debug",
            "--log-json",
            "--metrics",
        ]);
        assert_eq!(cli.config, PathBuf::from("/etc/notary.toml"));
        assert_eq!(cli.data_dir, Some(PathBuf::from("/var/lib/notary")));
        assert_eq!(cli.feed, Some(PathBuf::from("blocks.jsonl")));
        assert_eq!(cli.network_id, Some(1));
        assert_eq!(cli.queue_depth, Some(16));
        assert_eq!(cli.log_level, "debug");
        assert!(cli.log_json);
        assert!(cli.metrics);
    }
}

//! Configuration types for notary-node

use crate::cli::Cli;
use notary_types::ScriptSet;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// File path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },
    /// Config file is not valid TOML for [`NodeConfig`]
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    /// A value is out of range
    #[error("invalid config value: {0}")]
    Invalid(String),
}

/// Node configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeConfig {
    /// Network id used to derive script addresses
    #[serde(default)]
    pub network_id: u8,
    /// Data directory
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Feed file; stdin when unset
    #[serde(default)]
    pub feed: Option<PathBuf>,
    /// Events buffered between the feed reader and the writer
    #[serde(default = "default_queue_depth")]
    pub queue_depth: usize,
    /// Notary script hashes
    pub scripts: ScriptSet,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_queue_depth() -> usize {
    1024
}

impl NodeConfig {
    /// Load a config file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: NodeConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides
    pub fn apply_cli(mut self, cli: &Cli) -> Result<Self, ConfigError> {
        if let Some(dir) = &cli.data_dir {
            self.data_dir = dir.clone();
        }
        if let Some(feed) = &cli.feed {
            self.feed = Some(feed.clone());
        }
        if let Some(id) = cli.network_id {
            self.network_id = id;
        }
        if let Some(depth) = cli.queue_depth {
            self.queue_depth = depth;
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_depth == 0 {
            return Err(ConfigError::Invalid("queue_depth must be positive".to_string()));
        }
        if self.network_id > 15 {
            return Err(ConfigError::Invalid(format!(
                "network_id {} does not fit an address header",
                self.network_id
            )));
        }
        Ok(())
    }
}

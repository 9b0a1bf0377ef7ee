//! Configuration management for memdump.
//!
//! Configuration is optional. It is read from the file given with
//! `--config`, or from `memdump.yaml` in the working directory when that
//! file exists. Missing keys take their default value.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::fs;

/// Name of the configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "memdump.yaml";

/// Tracing filter used when neither `RUST_LOG` nor the configuration sets one
pub const DEFAULT_LOG_FILTER: &str = "memdump=info,memdump_jsonl=info";

/// Tunables of the analyses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Record types collapsed by `common_cleanup`
    pub collapse_types: Vec<String>,

    /// Classes collapsed by `common_cleanup`
    pub collapse_classes: Vec<String>,

    /// Default tracing filter of the binary (e.g. `memdump=debug`)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_filter: Option<String>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            collapse_types: ["IMEMO", "HASH", "ARRAY"].map(String::from).to_vec(),
            collapse_classes: ["Set", "RubyVM::Env"].map(String::from).to_vec(),
            log_filter: None,
        }
    }
}

impl AnalysisConfig {
    /// Load configuration from a file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse configuration from YAML text.
    ///
    /// An empty document yields the defaults.
    pub fn parse(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Load `memdump.yaml` from `dir`, or the defaults if there is none.
    pub async fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        if !fs::try_exists(&path).await? {
            tracing::debug!(dir = %dir.display(), "no configuration file, using defaults");
            return Ok(Self::default());
        }
        tracing::debug!(path = %path.display(), "loading configuration");
        Self::load(&path).await
    }

    /// Save configuration to a file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content =
            serde_yaml::to_string(self).map_err(|e| Error::Config(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }

    /// The tracing filter to fall back on when `RUST_LOG` is unset.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        self.log_filter.as_deref().unwrap_or(DEFAULT_LOG_FILTER)
    }
}

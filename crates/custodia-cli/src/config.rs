use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// CLI-side configuration, read from a TOML file.
///
/// Every field has a default, so a missing file means defaults across the
/// board. Command-line flags override file values.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Directory holding keys, catalog, payloads, and the ledger journal.
    pub data_dir: PathBuf,
    /// Acting identity used when `--actor` is not passed.
    pub default_actor: Option<String>,
    /// Fsync the journal after every append.
    pub sync_every_write: bool,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".custodia"),
            default_actor: None,
            sync_every_write: true,
        }
    }
}

impl CliConfig {
    /// Load the configuration at `path`; a missing file yields the defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config =
            toml::from_str(&text).with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }
}

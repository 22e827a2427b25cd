//! Service configuration: a TOML file overridden by `TTV_` environment
//! variables (`TTV_BATCH__THRESHOLD=...`).

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const ENV_PREFIX: &str = "TTV_";

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    /// JSON export of the transfer-item catalog.
    pub catalog:  PathBuf,
    pub inboxes:  Vec<InboxConfig>,
    pub batch:    BatchConfig,
    pub archiver: ArchiverConfig,
    pub vault:    VaultConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct InboxConfig {
    pub name: String,
    pub path: PathBuf,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct BatchConfig {
    pub current:   PathBuf,
    pub outbox:    PathBuf,
    pub rejects:   PathBuf,
    /// Bytes; the batch is sealed once it grows larger than this.
    pub threshold: u64,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ArchiverConfig {
    #[serde(default = "default_archiver_program")]
    pub program:      String,
    /// Prefix the batch name is appended to, e.g. `archive@tape:/vault/`.
    pub target_root:  String,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    /// Extra environment for the archive program.
    #[serde(default)]
    pub env:          BTreeMap<String, String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct VaultConfig {
    pub url:           String,
    #[serde(default = "default_single_object")]
    pub single_object: bool,
    #[serde(default = "default_vault_timeout")]
    pub timeout_secs:  u64,
}

fn default_archiver_program() -> String { "dmftar".to_string() }

/// Batches hold many objects unless configured otherwise.
fn default_single_object() -> bool { false }

fn default_vault_timeout() -> u64 { 30 }

impl ArchiverConfig {
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

impl VaultConfig {
    pub fn timeout(&self) -> Duration { Duration::from_secs(self.timeout_secs) }
}

impl Config {
    /// Load `path`, apply environment overrides and validate.
    pub fn load(path: &Path) -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::extract(figment)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        Self::extract(Figment::new().merge(Toml::string(content)))
    }

    fn extract(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract().map_err(Box::new)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.inboxes.is_empty() {
            return Err(Error::InvalidConfig("at least one inbox is required".to_string()));
        }

        let mut seen: BTreeMap<&str, usize> = BTreeMap::new();
        for inbox in &self.inboxes {
            *seen.entry(inbox.name.as_str()).or_default() += 1;
        }
        let duplicates: Vec<String> = seen
            .into_iter()
            .filter(|(_, count)| *count > 1)
            .map(|(name, _)| name.to_string())
            .collect();
        if !duplicates.is_empty() {
            return Err(Error::DuplicateInboxNames(duplicates));
        }

        if self.batch.threshold == 0 {
            return Err(Error::InvalidConfig("batch.threshold must be greater than zero".to_string()));
        }
        if self.archiver.program.trim().is_empty() {
            return Err(Error::InvalidConfig("archiver.program must not be empty".to_string()));
        }
        ttv_vault::parse_base_url(&self.vault.url)?;
        Ok(())
    }

    /// The effective configuration, for `ttv check`.
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| Error::InvalidConfig(e.to_string()))
    }
}

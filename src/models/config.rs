//! Application configuration structures.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::Target;

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// HTTP behavior settings
    #[serde(default)]
    pub checker: CheckerConfig,

    /// State file location; relative paths resolve against the storage dir
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_file: Option<PathBuf>,

    /// Watched pages by display name
    #[serde(default, alias = "comic_config")]
    pub targets: BTreeMap<String, TargetConfig>,
}

impl Config {
    /// Load configuration from a TOML file, or JSON when the extension is `.json`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        if is_json {
            Ok(serde_json::from_str(&content)?)
        } else {
            Ok(toml::from_str(&content)?)
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.checker.user_agent.trim().is_empty() {
            return Err(AppError::config("checker.user_agent is empty"));
        }
        if self.checker.timeout_secs == 0 {
            return Err(AppError::config("checker.timeout_secs must be > 0"));
        }
        if self.checker.max_concurrent == 0 {
            return Err(AppError::config("checker.max_concurrent must be > 0"));
        }
        Ok(())
    }

    /// Validate every configured target.
    pub fn targets(&self) -> Result<Vec<Target>> {
        self.targets
            .iter()
            .map(|(name, raw)| Target::from_config(name, raw))
            .collect()
    }

    /// Where the state file lives.
    pub fn data_path(&self, storage_dir: &Path) -> PathBuf {
        match &self.data_file {
            Some(path) => storage_dir.join(path),
            None => storage_dir.join(defaults::DATA_FILE),
        }
    }
}

/// HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckerConfig {
    /// User-Agent header; pages should look the way they do in a browser
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Per-request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Maximum concurrent fetches
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for CheckerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// One target as written in the config file, before validation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TargetConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub criteria: Option<CriteriaConfig>,

    #[serde(
        default,
        rename = "override-last-modified",
        alias = "override_last_modified"
    )]
    pub override_last_modified: bool,
}

/// Element selection as written in the config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CriteriaConfig {
    /// Tag name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Required attribute values
    #[serde(default)]
    pub attrs: BTreeMap<String, String>,
}

mod defaults {
    pub const DATA_FILE: &str = "data.json";

    pub fn user_agent() -> String {
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/88.0.4324.192 Safari/537.36".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_concurrent() -> usize {
        4
    }
}

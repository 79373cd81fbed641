//! Engine configuration via `gramdex.toml`
//!
//! A single config file carries the scoring knobs plus per-backend
//! settings. On first open, callers can write a commented default file; to
//! change settings, edit the file and restart.

use gramdex_core::{Error, Result, SearchConfig};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Config file name placed in the application's data directory
pub const CONFIG_FILE_NAME: &str = "gramdex.toml";

// ============================================================================
// Backend settings
// ============================================================================

/// Settings for the in-memory backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySettings {
    /// Maximum stored documents before LRU eviction kicks in
    #[serde(default = "default_max_documents")]
    pub max_documents: usize,

    /// Session time-to-live in seconds
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

fn default_max_documents() -> usize {
    10_000
}

fn default_session_ttl_secs() -> u64 {
    3_600
}

impl Default for MemorySettings {
    fn default() -> Self {
        MemorySettings {
            max_documents: default_max_documents(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

impl MemorySettings {
    /// Session TTL as a `Duration`
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

/// Settings for the remote key-value-store backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// Namespace prefix for every key written to the store
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Overall search deadline in milliseconds
    ///
    /// A search exceeding this fails with `Error::SearchTimeout`, distinct
    /// from a zero-result response.
    #[serde(default = "default_search_timeout_ms")]
    pub search_timeout_ms: u64,

    /// Session time-to-live in seconds
    #[serde(default = "default_session_ttl_secs")]
    pub session_ttl_secs: u64,
}

fn default_key_prefix() -> String {
    "gramdex:".to_string()
}

fn default_search_timeout_ms() -> u64 {
    10_000
}

impl Default for RemoteSettings {
    fn default() -> Self {
        RemoteSettings {
            key_prefix: default_key_prefix(),
            search_timeout_ms: default_search_timeout_ms(),
            session_ttl_secs: default_session_ttl_secs(),
        }
    }
}

impl RemoteSettings {
    /// Search deadline as a `Duration`
    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }

    /// Session TTL as a `Duration`
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

// ============================================================================
// EngineConfig
// ============================================================================

/// Engine configuration loaded from `gramdex.toml`
///
/// # Example
///
/// ```toml
/// [search]
/// ngram_size = 3
/// min_edgegram = 2
/// max_edgegram = 10
///
/// [memory]
/// max_documents = 10000
///
/// [remote]
/// key_prefix = "gramdex:"
/// search_timeout_ms = 10000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Analyzer and scoring knobs
    #[serde(default)]
    pub search: SearchConfig,

    /// In-memory backend settings
    #[serde(default)]
    pub memory: MemorySettings,

    /// Remote backend settings
    #[serde(default)]
    pub remote: RemoteSettings,
}

impl EngineConfig {
    /// Returns the default config file content with comments
    pub fn default_toml() -> &'static str {
        r#"# gramdex engine configuration

[search]
# Length of fuzzy-match n-grams
ngram_size = 3
# Edge-gram (prefix) length range; min > max disables edge-grams
min_edgegram = 2
max_edgegram = 10
# Scoring weights
exact_match_boost = 100.0
ngram_weight = 0.5
edgegram_weight = 1.0
# Results scoring below this are dropped
min_score = 0.1

[memory]
# Maximum stored documents before least-recently-used eviction
max_documents = 10000
session_ttl_secs = 3600

[remote]
# Namespace prefix for every key written to the store
key_prefix = "gramdex:"
# Overall search deadline; expiry fails distinctly from "no matches"
search_timeout_ms = 10000
session_ttl_secs = 3600
"#
    }

    /// Read and parse config from a file path
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if the
    /// search section fails validation.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidConfig(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        let config: EngineConfig = toml::from_str(&content).map_err(|e| {
            Error::InvalidConfig(format!(
                "failed to parse config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        config.search.validate()?;
        Ok(config)
    }

    /// Write the default config file if it does not already exist
    ///
    /// Returns `Ok(())` whether the file was created or already existed.
    pub fn write_default_if_missing(path: &Path) -> Result<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml()).map_err(|e| {
                Error::InvalidConfig(format!(
                    "failed to write default config file '{}': {}",
                    path.display(),
                    e
                ))
            })?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| Error::Serialization(format!("failed to serialize config: {}", e)))?;
        std::fs::write(path, content).map_err(|e| {
            Error::InvalidConfig(format!(
                "failed to write config file '{}': {}",
                path.display(),
                e
            ))
        })
    }
}

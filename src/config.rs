//! Tool configuration module.
//!
//! Handles loading, validating, and merging `folio.toml`. Stock defaults are
//! serialized to a TOML table and the user's file is merged on top, so a
//! config file only needs the keys it wants to change.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [store]
//! backend = "dataset"          # "dataset" (local directory) or "http"
//! dataset_dir = "dataset"      # Local dataset directory (dataset backend)
//! # project_id = "abc123"      # Hosted project id (http backend)
//! dataset = "production"
//! api_version = "2024-01-01"
//! token_env = "SANITY_AUTH_TOKEN"
//!
//! [import]
//! source_dir = "artworks"
//! pages_dir = "pages"
//! default_category = "painting"
//! delay_ms = 1000
//! overrides_file = "overrides.toml"
//! skip_existing = true
//! exclude_prefixes = []
//!
//! [schema]
//! min_year = 1900
//! slug_max_length = 96
//!
//! [log]
//! level = "info"
//! ```
//!
//! Unknown keys are rejected to catch typos early. The API credential is never
//! read from the file; `token_env` names the environment variable holding it.

use crate::schema::Category;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Configuration loaded from `folio.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FolioConfig {
    /// Where documents and assets are written.
    pub store: StoreConfig,
    /// Batch import settings.
    pub import: ImportConfig,
    /// Write-side schema limits.
    pub schema: SchemaConfig,
    pub log: LogConfig,
}

impl FolioConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.backend == Backend::Http
            && self.store.project_id.as_deref().is_none_or(str::is_empty)
        {
            return Err(ConfigError::Validation(
                "store.project_id is required for the http backend".into(),
            ));
        }
        if self.store.dataset.is_empty() {
            return Err(ConfigError::Validation(
                "store.dataset must not be empty".into(),
            ));
        }
        if self.store.token_env.is_empty() {
            return Err(ConfigError::Validation(
                "store.token_env must not be empty".into(),
            ));
        }
        if !(1..=9999).contains(&self.schema.min_year) {
            return Err(ConfigError::Validation(
                "schema.min_year must be 1-9999".into(),
            ));
        }
        if self.schema.slug_max_length == 0 {
            return Err(ConfigError::Validation(
                "schema.slug_max_length must be non-zero".into(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Local dataset directory.
    #[default]
    Dataset,
    /// Hosted content lake over HTTPS.
    Http,
}

/// Store settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    pub backend: Backend,
    /// Directory holding `documents.ndjson` and `assets/`.
    pub dataset_dir: PathBuf,
    /// Hosted project id. Required for the http backend.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    pub dataset: String,
    /// API version date, without the leading `v`.
    pub api_version: String,
    /// Replaces `<project_id>.api.sanity.io` when set, e.g. for a local
    /// content lake.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_host: Option<String>,
    /// Environment variable holding the API token.
    pub token_env: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Dataset,
            dataset_dir: PathBuf::from("dataset"),
            project_id: None,
            dataset: "production".to_string(),
            api_version: "2024-01-01".to_string(),
            api_host: None,
            token_env: "SANITY_AUTH_TOKEN".to_string(),
        }
    }
}

/// Batch import settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ImportConfig {
    /// Directory scanned for artwork media files.
    pub source_dir: PathBuf,
    /// Directory holding `about.md` and `press/`.
    pub pages_dir: PathBuf,
    /// Category for artworks without an override. Video files always default
    /// to `video`.
    pub default_category: Category,
    /// Pause between items, in milliseconds.
    pub delay_ms: u64,
    /// Overrides file name, relative to `source_dir`.
    pub overrides_file: String,
    /// Skip files whose resolved title already exists in the store.
    pub skip_existing: bool,
    /// Filenames starting with any of these are ignored.
    pub exclude_prefixes: Vec<String>,
}

impl ImportConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    pub fn overrides_path(&self) -> PathBuf {
        self.source_dir.join(&self.overrides_file)
    }
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            source_dir: PathBuf::from("artworks"),
            pages_dir: PathBuf::from("pages"),
            default_category: Category::Painting,
            delay_ms: 1000,
            overrides_file: "overrides.toml".to_string(),
            skip_existing: true,
            exclude_prefixes: Vec::new(),
        }
    }
}

/// Write-side schema limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SchemaConfig {
    /// Earliest accepted artwork year. The latest is the current year.
    pub min_year: i32,
    pub slug_max_length: usize,
}

impl Default for SchemaConfig {
    fn default() -> Self {
        Self {
            min_year: 1900,
            slug_max_length: 96,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    /// Default filter directive. `RUST_LOG` takes precedence.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the base layer user overrides are merged onto.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(FolioConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<FolioConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: FolioConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from the given file, falling back to defaults when it is
/// missing.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(path: &Path) -> Result<FolioConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(path)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `folio.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Folio Configuration
# ===================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
# Unknown keys will cause an error.

# ---------------------------------------------------------------------------
# Content store
# ---------------------------------------------------------------------------
[store]
# "dataset" writes to a local directory; "http" talks to a hosted content lake.
backend = "dataset"

# Local dataset directory (documents.ndjson + assets/).
dataset_dir = "dataset"

# Hosted project id. Required when backend = "http".
# project_id = "abc123"

dataset = "production"
api_version = "2024-01-01"

# Override the API host, e.g. "http://localhost:3030" for a local content lake.
# api_host = "http://localhost:3030"

# Environment variable holding the API token (http backend only).
token_env = "SANITY_AUTH_TOKEN"

# ---------------------------------------------------------------------------
# Batch import
# ---------------------------------------------------------------------------
[import]
# Directory scanned for artwork images, videos and audio.
source_dir = "artworks"

# Directory holding about.md and press/*.md for import-pages.
pages_dir = "pages"

# Category for artworks without an override (videos default to "video").
default_category = "painting"

# Pause between items, in milliseconds.
delay_ms = 1000

# Per-file editorial corrections, relative to source_dir.
overrides_file = "overrides.toml"

# Skip files whose title already exists in the store.
skip_existing = true

# Ignore files whose name starts with any of these prefixes.
exclude_prefixes = []

# ---------------------------------------------------------------------------
# Schema limits
# ---------------------------------------------------------------------------
[schema]
# Earliest accepted artwork year. The latest is always the current year.
min_year = 1900

# Maximum slug length.
slug_max_length = 96

# ---------------------------------------------------------------------------
# Logging
# ---------------------------------------------------------------------------
[log]
# Default log filter (trace, debug, info, warn, error). RUST_LOG wins.
level = "info"
"##
}

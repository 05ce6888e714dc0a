use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

use crate::fields::{default_fields, FieldDescriptor};

/// Inclusive bounds on the number of entries in a list field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountBounds {
    pub min: usize,
    pub max: usize,
}

impl CountBounds {
    pub fn contains(&self, n: usize) -> bool {
        n >= self.min && n <= self.max
    }
}

/// Length limits for one field (characters for text, entries for lists).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LengthConstraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

/// Global configuration loaded from `~/.config/depo/config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepoConfig {
    /// Base URL of the repository API (e.g. "https://api.example.org/v2/").
    pub api_base_url: String,
    /// Environment variable that holds the API bearer token.
    pub api_token_env: String,
    /// Stop the whole batch once this many rows have failed (0 = never).
    pub max_errors: usize,
    /// Keep at most this many warnings per row in the batch view (0 = all).
    pub max_warnings: usize,
    /// Separator for list-valued cells.
    pub list_delimiter: String,
    /// Minimum similarity (0..=1) for a select value to be coerced to an option.
    pub fuzzy_threshold: f64,
    /// Read size when hashing files before upload.
    pub hash_chunk_bytes: usize,
    /// Allowed number of keywords; validation fails if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keywords: Option<CountBounds>,
    /// Allowed number of categories; validation fails if unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<CountBounds>,
    /// Per-field length constraints, keyed by field name.
    #[serde(default)]
    pub constraints: BTreeMap<String, LengthConstraint>,
    /// Extra sheet header -> field name mappings.
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// Field catalog; defaults to the built-in one.
    #[serde(default = "default_fields")]
    pub fields: Vec<FieldDescriptor>,
}

impl Default for DepoConfig {
    fn default() -> Self {
        let mut constraints = BTreeMap::new();
        constraints.insert(
            "title".to_string(),
            LengthConstraint {
                min_length: Some(3),
                max_length: Some(1000),
            },
        );
        Self {
            api_base_url: "https://repository.example.org/api/v2/".to_string(),
            api_token_env: "DEPO_TOKEN".to_string(),
            max_errors: 0,
            max_warnings: 20,
            list_delimiter: ",".to_string(),
            fuzzy_threshold: 0.9,
            hash_chunk_bytes: 1024 * 1024,
            keywords: Some(CountBounds { min: 1, max: 100 }),
            categories: Some(CountBounds { min: 1, max: 50 }),
            constraints,
            headers: BTreeMap::new(),
            fields: default_fields(),
        }
    }
}

impl DepoConfig {
    /// Read the API token from the configured environment variable.
    pub fn api_token(&self) -> Option<String> {
        std::env::var(&self.api_token_env)
            .ok()
            .filter(|t| !t.trim().is_empty())
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("depo")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<DepoConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = DepoConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }

    let data = fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    let cfg: DepoConfig =
        toml::from_str(&data).with_context(|| format!("parse config {}", path.display()))?;
    Ok(cfg)
}

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::repository::RecordShape;
use crate::sort::SortKey;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub repository: RepositoryConfig,
    #[serde(default)]
    pub browse: BrowseConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

fn default_state_path() -> PathBuf {
    PathBuf::from("./data/state.json")
}

#[derive(Debug, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    #[default]
    Local,
    Remote,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RepositoryConfig {
    #[serde(default)]
    pub backend: Backend,
    #[serde(default = "default_seed_path")]
    pub seed_path: PathBuf,
    #[serde(default)]
    pub shape: RecordShape,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default = "default_table")]
    pub table: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Local,
            seed_path: default_seed_path(),
            shape: RecordShape::Structured,
            base_url: None,
            table: default_table(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_seed_path() -> PathBuf {
    PathBuf::from("./data/properties.json")
}
fn default_table() -> String {
    "property".to_string()
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct BrowseConfig {
    #[serde(default = "default_sort")]
    pub default_sort: SortKey,
}

impl Default for BrowseConfig {
    fn default() -> Self {
        Self {
            default_sort: default_sort(),
        }
    }
}

fn default_sort() -> SortKey {
    SortKey::PriceAsc
}

/// Load and validate the config at `path`. A missing file yields defaults.
pub fn load_config(path: &Path) -> Result<Config> {
    let config = if path.exists() {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        parse_config(&content)?
    } else {
        Config::default()
    };
    validate(&config)?;
    Ok(config)
}

pub fn parse_config(content: &str) -> Result<Config> {
    let config: Config = toml::from_str(content).with_context(|| "Failed to parse config file")?;
    validate(&config)?;
    Ok(config)
}

fn validate(config: &Config) -> Result<()> {
    let repo = &config.repository;
    if repo.timeout_secs == 0 {
        anyhow::bail!("repository.timeout_secs must be > 0");
    }
    if repo.backend == Backend::Remote {
        match repo.base_url.as_deref().map(str::trim) {
            None | Some("") => {
                anyhow::bail!("repository.base_url must be set when backend is 'remote'")
            }
            Some(url) if !(url.starts_with("http://") || url.starts_with("https://")) => {
                anyhow::bail!("repository.base_url must be an http(s) URL, got '{}'", url)
            }
            Some(_) => {}
        }
        if repo.table.trim().is_empty() {
            anyhow::bail!("repository.table must not be empty");
        }
    }
    Ok(())
}

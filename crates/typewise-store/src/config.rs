//! Configuration loading and store factory.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use typewise_core::engine::EngineConfig;
use typewise_core::traits::SessionRepository;

use crate::file::FileSessionRepository;
use crate::memory::MemorySessionRepository;

/// Where sessions and responses are kept.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum StoreConfig {
    #[default]
    Memory,
    File {
        #[serde(default = "default_data_dir")]
        path: String,
    },
}

fn default_data_dir() -> String {
    "./typewise-data".to_string()
}

/// Top-level typewise configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypewiseConfig {
    /// Adaptive engine settings.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Session storage backend.
    #[serde(default)]
    pub store: StoreConfig,
    /// Item bank used when a command is not given one explicitly.
    #[serde(default)]
    pub item_bank: Option<String>,
    /// Max concurrent simulated sessions.
    #[serde(default = "default_parallelism")]
    pub parallelism: usize,
    /// Output directory for reports.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

fn default_parallelism() -> usize {
    4
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("./typewise-results")
}

impl Default for TypewiseConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            store: StoreConfig::default(),
            item_bank: None,
            parallelism: default_parallelism(),
            output_dir: default_output_dir(),
        }
    }
}

impl TypewiseConfig {
    /// The configured item bank path with `${VAR}` references resolved.
    pub fn item_bank_path(&self) -> Option<PathBuf> {
        self.item_bank.as_deref().map(|p| PathBuf::from(resolve_env_vars(p)))
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables resolve to the empty string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `typewise.toml` in the current directory
/// 2. `~/.config/typewise/config.toml`
///
/// Environment variable overrides: `TYPEWISE_DATA_DIR`, `TYPEWISE_SE_THRESHOLD`,
/// `TYPEWISE_MAX_ITEMS`.
pub fn load_config() -> Result<TypewiseConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<TypewiseConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("typewise.toml");
            if local.exists() {
                Some(local)
            } else {
                config_dir()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let config = match config_path {
        Some(path) => {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            let config = toml::from_str::<TypewiseConfig>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?;
            tracing::debug!(path = %path.display(), "loaded config");
            config
        }
        None => TypewiseConfig::default(),
    };

    apply_overrides(config, |name| std::env::var(name).ok())
}

/// Apply `TYPEWISE_*` overrides using `lookup` to read variables, then
/// resolve `${VAR}` references in path settings.
fn apply_overrides(
    mut config: TypewiseConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<TypewiseConfig> {
    if let Some(dir) = lookup("TYPEWISE_DATA_DIR") {
        config.store = StoreConfig::File { path: dir };
    }

    if let Some(raw) = lookup("TYPEWISE_SE_THRESHOLD") {
        config.engine.se_threshold = raw
            .trim()
            .parse()
            .with_context(|| format!("TYPEWISE_SE_THRESHOLD is not a number: {raw}"))?;
    }

    if let Some(raw) = lookup("TYPEWISE_MAX_ITEMS") {
        config.engine.max_items_per_dimension = raw
            .trim()
            .parse()
            .with_context(|| format!("TYPEWISE_MAX_ITEMS is not a positive integer: {raw}"))?;
    }

    if let StoreConfig::File { path } = &mut config.store {
        *path = resolve_env_vars(path);
    }

    Ok(config)
}

fn config_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("typewise"))
}

/// Create a session repository from its configuration.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn SessionRepository>> {
    match config {
        StoreConfig::Memory => Ok(Arc::new(MemorySessionRepository::new())),
        StoreConfig::File { path } => Ok(Arc::new(FileSessionRepository::open(path)?)),
    }
}

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_SUGGESTION_LIMIT: usize = 10;

fn default_true() -> bool {
    true
}

fn default_theme() -> String {
    "dark".to_string()
}

fn default_suggestion_limit() -> usize {
    DEFAULT_SUGGESTION_LIMIT
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default = "default_true")]
    pub ghost_text: bool,
    #[serde(default = "default_true")]
    pub fuzzy_search: bool,
    #[serde(default = "default_theme")]
    pub theme: String,
    #[serde(default = "default_suggestion_limit")]
    pub suggestion_limit: usize,
    #[serde(default)]
    pub command_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ghost_text: true,
            fuzzy_search: true,
            theme: default_theme(),
            suggestion_limit: DEFAULT_SUGGESTION_LIMIT,
            command_file: None,
        }
    }
}

impl Config {
    /// Where the command store lives: the configured path, or
    /// `<config dir>/mnemo/commands.json`.
    pub fn command_file(&self) -> Result<PathBuf> {
        match &self.command_file {
            Some(path) => Ok(path.clone()),
            None => Ok(config_root()?.join("commands.json")),
        }
    }
}

/// Loads configuration from `explicit_path` if given, otherwise from
/// `<config dir>/mnemo/config.yaml`. A missing default file yields the
/// defaults; an unreadable or malformed file is an error.
pub fn load(explicit_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = explicit_path {
        return load_from_path(path);
    }

    let path = config_root()?.join("config.yaml");
    if path.exists() {
        return load_from_path(&path);
    }

    Ok(Config::default())
}

fn load_from_path(path: &Path) -> Result<Config> {
    let content =
        fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut config: Config = serde_yaml::from_str(&content)
        .with_context(|| format!("invalid YAML in {}", path.display()))?;

    // A configured 0 would render nothing and strand the selection.
    if config.suggestion_limit == 0 {
        config.suggestion_limit = DEFAULT_SUGGESTION_LIMIT;
    }

    Ok(config)
}

fn config_root() -> Result<PathBuf> {
    let config_root = dirs::config_dir().context("unable to resolve OS config directory")?;
    Ok(config_root.join("mnemo"))
}

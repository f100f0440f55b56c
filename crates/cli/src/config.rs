//! Configuration loading from waypoint.toml.

use runtime::{DEFAULT_MAX_TURNS, ProviderSettings, RunConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "waypoint.toml";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Provider model names and sampling settings.
    pub models: ProviderSettings,

    /// Defaults for each run.
    pub run: RunSettings,

    /// Web search settings for the travel agent.
    pub search: SearchSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Model id used when `--model` is not given.
    pub model: Option<String>,

    pub max_turns: usize,
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            model: None,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub max_results: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: agents::DEFAULT_MAX_RESULTS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))?;
        if config.run.max_turns == 0 {
            return Err(ConfigError::Parse("run.max_turns must be at least 1".into()));
        }
        Ok(config)
    }

    /// Load `explicit` if given, else `waypoint.toml` if present, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) if !path.exists() => Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            }),
            Some(path) => Self::load(path),
            None if Path::new(CONFIG_FILE).exists() => Self::load(CONFIG_FILE),
            None => Ok(Self::default()),
        }
    }

    /// Per-run options, with command-line values taking precedence.
    pub fn run_config(&self, model: Option<String>, max_turns: Option<usize>) -> RunConfig {
        RunConfig {
            model_name: model.or_else(|| self.run.model.clone()),
            max_turns: Some(max_turns.unwrap_or(self.run.max_turns)),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("config file not found: {}", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),
}

//! CLI error types.

use crate::config::ConfigError;
use thiserror::Error;

/// CLI errors.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The configuration file is missing or invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The agent has no tool with this name.
    #[error("the {agent} agent has no tool '{tool}'")]
    UnknownTool { agent: String, tool: String },

    /// An error occurred in the runtime layer.
    #[error(transparent)]
    Runtime(#[from] runtime::Error),

    /// Output could not be encoded.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<runtime::ToolError> for Error {
    fn from(error: runtime::ToolError) -> Self {
        Self::Runtime(error.into())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

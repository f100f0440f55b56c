use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that abort a tool node.
///
/// Input problems a model can recover from are reported inside the tool's
/// output instead; these variants are for calls that cannot produce one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Error)]
pub enum ToolError {
    #[error("tool not found: {0}")]
    NotFound(String),
    #[error("execution failed: {0}")]
    Execution(String),
}

//! Tool host trait.

use crate::model::{ToolCall, ToolSpec};
use crate::tools::ToolError;
use serde_json::Value;
use std::future::Future;

/// What a tool hands back to the loop.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolOutput {
    /// Text returned to the model as the tool result.
    pub content: String,
    /// Auxiliary state fields this call wants recorded.
    pub updates: Vec<(String, Value)>,
}

impl ToolOutput {
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            updates: Vec::new(),
        }
    }

    pub fn with_update(mut self, key: impl Into<String>, value: Value) -> Self {
        self.updates.push((key.into(), value));
        self
    }
}

/// Trait for tool execution hosts.
///
/// Implementations provide a fixed set of tool specifications and execute
/// tool calls against them. Every tool takes one string argument and returns
/// a string.
pub trait ToolHost: Send + Sync {
    /// Get available tool specifications.
    fn specs(&self) -> &[ToolSpec];

    /// Execute a tool call.
    fn execute(&self, call: &ToolCall)
    -> impl Future<Output = Result<ToolOutput, ToolError>> + Send;

    /// Whether a tool with this name is registered.
    fn has_tool(&self, name: &str) -> bool {
        self.specs().iter().any(|spec| spec.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_collects_updates() {
        let out = ToolOutput::text("ok")
            .with_update("devices", Value::Array(vec![]))
            .with_update("approval_status", Value::String("SUBMITTED".into()));
        assert_eq!(out.content, "ok");
        assert_eq!(out.updates.len(), 2);
        assert_eq!(out.updates[1].0, "approval_status");
    }
}

//! Per-invocation configuration.

use crate::providers::ModelId;
use crate::Result;
use serde::{Deserialize, Serialize};

/// Options supplied with each graph invocation. Nothing here is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Model selector, `"openai"` or `"anthropic"`. Absent means the agent's
    /// default.
    #[serde(default)]
    pub model_name: Option<String>,

    /// Maximum reasoning turns before the run is stopped. Absent means the
    /// graph's own limit.
    #[serde(default)]
    pub max_turns: Option<usize>,
}

impl RunConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_model(mut self, model_name: impl Into<String>) -> Self {
        self.model_name = Some(model_name.into());
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    /// Resolve the model selector, falling back to `default`.
    ///
    /// An unrecognized name is a configuration error, never a silent
    /// fallback.
    pub fn model(&self, default: ModelId) -> Result<ModelId> {
        match &self.model_name {
            Some(name) => name.parse(),
            None => Ok(default),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn absent_model_uses_default() {
        let config = RunConfig::new();
        assert_eq!(config.model(ModelId::OpenAi).unwrap(), ModelId::OpenAi);
    }

    #[test]
    fn explicit_model_wins() {
        let config = RunConfig::new().with_model("anthropic");
        assert_eq!(config.model(ModelId::OpenAi).unwrap(), ModelId::Anthropic);
    }

    #[test]
    fn unknown_model_is_a_config_error() {
        let config = RunConfig::new().with_model("gemini");
        assert!(matches!(config.model(ModelId::OpenAi), Err(Error::Config(_))));
    }

    #[test]
    fn deserializes_from_json() {
        let config: RunConfig =
            serde_json::from_str(r#"{"model_name":"anthropic","max_turns":3}"#).unwrap();
        assert_eq!(config, RunConfig::new().with_model("anthropic").with_max_turns(3));
    }
}

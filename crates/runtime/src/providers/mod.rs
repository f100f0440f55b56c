//! LLM provider adapters.
//!
//! Each provider implements [`Backend`] for its specific API. Adapters
//! normalize the provider's tool-call shape into [`ToolCall`] and keep only
//! the first call of a response.

mod anthropic;
mod cache;
mod openai;
mod provider;

pub use anthropic::{AnthropicBackend, AnthropicBackendBuilder};
pub use cache::LruCache;
pub use openai::{OpenAiBackend, OpenAiBackendBuilder};
pub use provider::{DEFAULT_CACHE_CAPACITY, ModelProvider};

use crate::model::{Backend, ModelError, ModelRequest, ModelResponse, ToolCall, ToolSpec};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use tracing::debug;

/// Logical model identifier selected per invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelId {
    OpenAi,
    Anthropic,
}

impl ModelId {
    pub const ALL: [ModelId; 2] = [ModelId::OpenAi, ModelId::Anthropic];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    /// Environment variable holding this provider's API key.
    pub fn api_key_var(&self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI_API_KEY",
            Self::Anthropic => "ANTHROPIC_API_KEY",
        }
    }
}

impl std::fmt::Display for ModelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => Err(Error::Config(format!(
                "unsupported model '{other}' (expected 'openai' or 'anthropic')"
            ))),
        }
    }
}

/// Provider-side settings shared by every backend the factory builds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderSettings {
    /// Model name sent to OpenAI.
    pub openai: String,
    /// Model name sent to Anthropic.
    pub anthropic: String,
    /// Override for OpenAI-compatible servers.
    pub openai_base_url: Option<String>,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ProviderSettings {
    fn default() -> Self {
        Self {
            openai: "gpt-4.1".to_string(),
            anthropic: "claude-3-7-sonnet-latest".to_string(),
            openai_base_url: None,
            temperature: 0.0,
            max_tokens: 4096,
        }
    }
}

/// A backend for any supported provider.
pub enum ProviderBackend {
    OpenAi(OpenAiBackend),
    Anthropic(AnthropicBackend),
}

impl std::fmt::Display for ProviderBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::OpenAi(backend) => backend.fmt(f),
            Self::Anthropic(backend) => backend.fmt(f),
        }
    }
}

impl Backend for ProviderBackend {
    async fn call(&self, request: ModelRequest<'_>) -> std::result::Result<ModelResponse, ModelError> {
        match self {
            Self::OpenAi(backend) => backend.call(request).await,
            Self::Anthropic(backend) => backend.call(request).await,
        }
    }
}

/// Constructs a backend for a model id, bound to a tool registry.
///
/// Called at most once per id while that id stays cached.
pub trait BackendFactory: Send + Sync {
    type Backend: Backend + 'static;

    fn create(&self, model: ModelId, tools: &[ToolSpec]) -> Result<Self::Backend>;
}

/// Builds real provider backends, reading API keys from the environment.
#[derive(Debug, Clone, Default)]
pub struct EnvBackendFactory {
    settings: ProviderSettings,
}

impl EnvBackendFactory {
    pub fn new(settings: ProviderSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &ProviderSettings {
        &self.settings
    }
}

impl BackendFactory for EnvBackendFactory {
    type Backend = ProviderBackend;

    fn create(&self, model: ModelId, tools: &[ToolSpec]) -> Result<ProviderBackend> {
        self.build(model, tools, std::env::var(model.api_key_var()).ok())
    }
}

impl EnvBackendFactory {
    fn build(
        &self,
        model: ModelId,
        tools: &[ToolSpec],
        api_key: Option<String>,
    ) -> Result<ProviderBackend> {
        let api_key = api_key
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| Error::Config(format!("{} not set", model.api_key_var())))?;
        let settings = &self.settings;

        let backend = match model {
            ModelId::OpenAi => {
                let mut builder = OpenAiBackend::builder(api_key, &settings.openai)
                    .temperature(settings.temperature)
                    .max_tokens(settings.max_tokens)
                    .tools(tools);
                if let Some(url) = &settings.openai_base_url {
                    builder = builder.base_url(url);
                }
                ProviderBackend::OpenAi(builder.build())
            }
            ModelId::Anthropic => ProviderBackend::Anthropic(
                AnthropicBackend::builder(api_key, &settings.anthropic)
                    .temperature(settings.temperature)
                    .max_tokens(settings.max_tokens)
                    .tools(tools)
                    .build(),
            ),
        };

        debug!(%backend, tools = tools.len(), "constructed model backend");
        Ok(backend)
    }
}

/// Keep the first tool call of a response; the loop only ever runs one.
pub(crate) fn keep_first_tool_call(calls: Vec<ToolCall>, provider: &str) -> Option<ToolCall> {
    let dropped = calls.len().saturating_sub(1);
    if dropped > 0 {
        debug!(provider, dropped, "ignoring extra tool calls in response");
    }
    calls.into_iter().next()
}

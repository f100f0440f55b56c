//! The reasoning node: one model call per visit.

use super::state::{ConversationState, StateDelta};
use crate::config::RunConfig;
use crate::model::{Backend, Message, ModelRequest, Usage};
use crate::providers::{BackendFactory, ModelId, ModelProvider};
use crate::Result;
use std::sync::Arc;
use tracing::{debug, error, info};

/// What a reasoning step produced.
#[derive(Debug, Clone)]
pub struct StepOutput {
    pub delta: StateDelta,
    pub usage: Usage,
}

/// Calls the model with a fixed system instruction ahead of the history.
pub struct ReasoningStep<F: BackendFactory> {
    system_prompt: String,
    provider: Arc<ModelProvider<F>>,
    default_model: ModelId,
}

impl<F: BackendFactory> ReasoningStep<F> {
    pub fn new(system_prompt: impl Into<String>, provider: Arc<ModelProvider<F>>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            provider,
            default_model: ModelId::OpenAi,
        }
    }

    /// Model used when the run configuration names none.
    pub fn with_default_model(mut self, model: ModelId) -> Self {
        self.default_model = model;
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn default_model(&self) -> ModelId {
        self.default_model
    }

    pub fn provider(&self) -> &Arc<ModelProvider<F>> {
        &self.provider
    }

    /// Run one reasoning turn over `state`.
    ///
    /// Returns a single assistant message as a delta; the caller appends it.
    /// Model failures are returned as-is, without retry.
    pub async fn run(&self, state: &ConversationState, config: &RunConfig) -> Result<StepOutput> {
        let model = config.model(self.default_model)?;
        info!(%model, history = state.len(), "reasoning step");

        let backend = self.provider.resolve(model)?;

        let mut messages = Vec::with_capacity(state.len() + 1);
        messages.push(Message::system(self.system_prompt.as_str()));
        messages.extend_from_slice(state.messages());

        let response = backend
            .call(ModelRequest {
                messages: &messages,
            })
            .await
            .inspect_err(|e| error!(%model, error = %e, "model call failed"))?;

        debug!(
            %model,
            tool_call = response.message.tool_call().is_some(),
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "model response received"
        );

        Ok(StepOutput {
            delta: StateDelta {
                messages: vec![response.message],
            },
            usage: response.usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Role;
    use crate::testing::{ScriptedFactory, tool_call};
    use crate::Error;

    fn step(replies: Vec<Message>) -> ReasoningStep<ScriptedFactory> {
        let provider = Arc::new(ModelProvider::new(ScriptedFactory::new(replies), Vec::new()));
        ReasoningStep::new("You are a test assistant.", provider)
    }

    #[tokio::test]
    async fn prepends_system_prompt_to_history() {
        let step = step(vec![Message::assistant("hello")]);
        let state = ConversationState::with_messages(vec![Message::user("hi")]);

        let out = step.run(&state, &RunConfig::new()).await.unwrap();

        assert_eq!(out.delta.messages.len(), 1);
        assert_eq!(out.delta.messages[0].text(), "hello");
        assert_eq!(out.usage.input_tokens, 10);

        let requests = step.provider().factory().script().requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].len(), 2);
        assert_eq!(requests[0][0].role, Role::System);
        assert_eq!(requests[0][0].text(), "You are a test assistant.");
        assert_eq!(requests[0][1].text(), "hi");
    }

    #[tokio::test]
    async fn empty_history_sends_only_system_prompt() {
        let step = step(vec![Message::assistant("hello")]);
        step.run(&ConversationState::new(), &RunConfig::new())
            .await
            .unwrap();
        let requests = step.provider().factory().script().requests();
        assert_eq!(requests[0].len(), 1);
    }

    #[tokio::test]
    async fn does_not_mutate_state() {
        let step = step(vec![tool_call("WeatherSearch", "query", "Lisbon")]);
        let state = ConversationState::with_messages(vec![Message::user("hi")]);
        let before = state.clone();
        step.run(&state, &RunConfig::new()).await.unwrap();
        assert_eq!(state, before);
    }

    #[tokio::test]
    async fn selects_model_from_config() {
        let step = step(vec![Message::assistant("a"), Message::assistant("b")]);
        let state = ConversationState::new();

        step.run(&state, &RunConfig::new()).await.unwrap();
        step.run(&state, &RunConfig::new().with_model("anthropic"))
            .await
            .unwrap();

        assert_eq!(step.provider().factory().created(), 2);
    }

    #[tokio::test]
    async fn unknown_model_fails_before_calling() {
        let step = step(vec![Message::assistant("a")]);
        let err = step
            .run(&ConversationState::new(), &RunConfig::new().with_model("llama"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(step.provider().factory().script().requests().is_empty());
    }

    #[tokio::test]
    async fn model_errors_propagate() {
        let step = step(Vec::new());
        let err = step
            .run(&ConversationState::new(), &RunConfig::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Model(_)));
    }
}

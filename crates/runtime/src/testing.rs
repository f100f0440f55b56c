//! Scripted backend for exercising graphs without a provider.
//!
//! Enabled for this crate's tests and, through the `testing` feature, for
//! downstream crates' tests.

use crate::model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, ToolCall, ToolSpec, Usage,
};
use crate::providers::{BackendFactory, ModelId};
use crate::{Error, Result};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Replies shared by every backend a [`ScriptedFactory`] builds.
#[derive(Debug, Default)]
pub struct Script {
    replies: Mutex<VecDeque<Message>>,
    requests: Mutex<Vec<Vec<Message>>>,
}

impl Script {
    fn next(&self, messages: &[Message]) -> std::result::Result<Message, ModelError> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(messages.to_vec());
        self.replies
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .ok_or_else(|| ModelError::InvalidResponse("script exhausted".into()))
    }

    /// Every message list the model was called with, in order.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Replies not yet consumed.
    pub fn remaining(&self) -> usize {
        self.replies.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

/// A backend that answers from a fixed list of assistant messages.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    model: ModelId,
    script: Arc<Script>,
}

impl ScriptedBackend {
    pub fn model(&self) -> ModelId {
        self.model
    }
}

impl Backend for ScriptedBackend {
    async fn call(&self, request: ModelRequest<'_>) -> std::result::Result<ModelResponse, ModelError> {
        let message = self.script.next(request.messages)?;
        Ok(ModelResponse {
            message,
            usage: Usage {
                input_tokens: 10,
                output_tokens: 5,
            },
        })
    }
}

/// Factory for [`ScriptedBackend`]s that counts constructions.
#[derive(Debug, Default)]
pub struct ScriptedFactory {
    script: Arc<Script>,
    created: AtomicUsize,
    bound_tools: Mutex<Vec<String>>,
    failing: Option<ModelId>,
}

impl ScriptedFactory {
    pub fn new(replies: Vec<Message>) -> Self {
        Self {
            script: Arc::new(Script {
                replies: Mutex::new(replies.into()),
                requests: Mutex::new(Vec::new()),
            }),
            ..Default::default()
        }
    }

    /// Make construction fail for one model id.
    pub fn failing_for(mut self, model: ModelId) -> Self {
        self.failing = Some(model);
        self
    }

    pub fn script(&self) -> Arc<Script> {
        Arc::clone(&self.script)
    }

    /// Number of backends constructed so far.
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    /// Tool names the most recent backend was bound to.
    pub fn bound_tools(&self) -> Vec<String> {
        self.bound_tools.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl BackendFactory for ScriptedFactory {
    type Backend = ScriptedBackend;

    fn create(&self, model: ModelId, tools: &[ToolSpec]) -> Result<ScriptedBackend> {
        if self.failing == Some(model) {
            return Err(Error::Config(format!("{} not set", model.api_key_var())));
        }
        self.created.fetch_add(1, Ordering::SeqCst);
        *self.bound_tools.lock().unwrap_or_else(|e| e.into_inner()) =
            tools.iter().map(|t| t.name.clone()).collect();
        Ok(ScriptedBackend {
            model,
            script: Arc::clone(&self.script),
        })
    }
}

/// An assistant reply asking for `name` with a single string argument.
pub fn tool_call(name: &str, param: &str, arg: &str) -> Message {
    let mut input = serde_json::Map::new();
    input.insert(param.to_string(), Value::String(arg.to_string()));
    Message::assistant_tool_call(
        "",
        ToolCall {
            id: format!("call_{}", uuid::Uuid::new_v4().simple()),
            name: name.to_string(),
            input: Value::Object(input),
        },
    )
}

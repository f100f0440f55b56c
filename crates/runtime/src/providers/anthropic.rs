//! Anthropic Messages API backend.

use super::keep_first_tool_call;
use crate::model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolSpec,
    Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_choice: Option<ApiToolChoice>,
}

#[derive(Debug, Serialize)]
struct ApiToolChoice {
    #[serde(rename = "type")]
    choice_type: &'static str,
    disable_parallel_tool_use: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: ApiContent,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum ApiContent {
    Text(String),
    Blocks(Vec<ApiContentBlock>),
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    ToolResult {
        tool_use_id: String,
        content: String,
    },
}

#[derive(Debug, Clone, Serialize)]
struct ApiTool {
    name: String,
    description: String,
    input_schema: Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ApiResponseBlock>,
    usage: ApiUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ApiResponseBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        input: Value,
    },
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    input_tokens: u32,
    output_tokens: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an Anthropic backend.
#[derive(Debug, Clone)]
pub struct AnthropicBackendBuilder {
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    tools: Vec<ToolSpec>,
}

impl AnthropicBackendBuilder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            max_tokens: 4096,
            temperature: 0.0,
            tools: Vec::new(),
        }
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Bind the tools the model may call.
    pub fn tools(mut self, tools: &[ToolSpec]) -> Self {
        self.tools = tools.to_vec();
        self
    }

    pub fn build(self) -> AnthropicBackend {
        AnthropicBackend {
            client: reqwest::Client::new(),
            api_key: self.api_key,
            model: self.model,
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            tools: self.tools.iter().map(AnthropicBackend::tool_to_api).collect(),
        }
    }
}

/// Anthropic API backend.
pub struct AnthropicBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    max_tokens: u32,
    temperature: f32,
    tools: Vec<ApiTool>,
}

impl AnthropicBackend {
    pub fn builder(api_key: impl Into<String>, model: impl Into<String>) -> AnthropicBackendBuilder {
        AnthropicBackendBuilder::new(api_key, model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn role_to_api(role: Role) -> &'static str {
        match role {
            Role::User | Role::System | Role::Tool => "user",
            Role::Assistant => "assistant",
        }
    }

    fn message_to_api(msg: &Message) -> ApiMessage {
        let role = Self::role_to_api(msg.role);

        // Simple case: single text part
        if let [Part::Text { text }] = msg.parts.as_slice() {
            return ApiMessage {
                role,
                content: ApiContent::Text(text.clone()),
            };
        }

        let blocks: Vec<ApiContentBlock> = msg
            .parts
            .iter()
            .map(|part| match part {
                Part::Text { text } => ApiContentBlock::Text { text: text.clone() },
                Part::ToolCall(call) => ApiContentBlock::ToolUse {
                    id: call.id.clone(),
                    name: call.name.clone(),
                    input: call.input.clone(),
                },
                Part::ToolResult(result) => ApiContentBlock::ToolResult {
                    tool_use_id: result.tool_call_id.clone(),
                    content: result.content.clone(),
                },
            })
            .collect();

        ApiMessage {
            role,
            content: ApiContent::Blocks(blocks),
        }
    }

    fn tool_to_api(spec: &ToolSpec) -> ApiTool {
        ApiTool {
            name: spec.name.clone(),
            description: spec.description.clone(),
            input_schema: spec.schema.clone(),
        }
    }

    /// System messages travel in the top-level `system` field, not the list.
    fn system_prompt(messages: &[Message]) -> Option<String> {
        let system: Vec<String> = messages
            .iter()
            .filter(|m| m.role == Role::System)
            .map(Message::text)
            .collect();
        (!system.is_empty()).then(|| system.join("\n\n"))
    }

    fn response_to_message(blocks: Vec<ApiResponseBlock>) -> Message {
        let mut text = String::new();
        let mut calls = Vec::new();
        for block in blocks {
            match block {
                ApiResponseBlock::Text { text: t } => text.push_str(&t),
                ApiResponseBlock::ToolUse { id, name, input } => {
                    calls.push(ToolCall { id, name, input });
                }
                ApiResponseBlock::Unknown => {}
            }
        }

        match keep_first_tool_call(calls, "anthropic") {
            Some(call) => Message::assistant_tool_call(text, call),
            None => Message::assistant(text),
        }
    }
}

impl std::fmt::Display for AnthropicBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "anthropic({})", self.model)
    }
}

impl Backend for AnthropicBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let api_messages: Vec<ApiMessage> = request
            .messages
            .iter()
            .filter(|m| m.role != Role::System)
            .map(Self::message_to_api)
            .collect();

        let tool_choice = (!self.tools.is_empty()).then_some(ApiToolChoice {
            choice_type: "auto",
            disable_parallel_tool_use: true,
        });

        let api_request = ApiRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: api_messages,
            system: Self::system_prompt(request.messages),
            tools: self.tools.clone(),
            tool_choice,
        };

        debug!(model = %self.model, messages = api_request.messages.len(), "anthropic request");

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .header("accept", "application/json")
            .header("x-api-key", &self.api_key)
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ModelError::RateLimited {
                provider: "anthropic",
            });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let message = Self::response_to_message(api_response.content);
        let usage = Usage {
            input_tokens: api_response.usage.input_tokens,
            output_tokens: api_response.usage.output_tokens,
        };

        Ok(ModelResponse { message, usage })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolResult;

    #[test]
    fn backend_display() {
        let backend = AnthropicBackend::builder("key", "claude-3-7-sonnet-latest").build();
        assert_eq!(backend.to_string(), "anthropic(claude-3-7-sonnet-latest)");
    }

    #[test]
    fn system_messages_are_lifted_out() {
        let messages = vec![Message::system("be brief"), Message::user("hi")];
        assert_eq!(
            AnthropicBackend::system_prompt(&messages).as_deref(),
            Some("be brief")
        );
        assert_eq!(AnthropicBackend::system_prompt(&messages[1..]), None);
    }

    #[test]
    fn tool_result_is_sent_as_user_block() {
        let msg = Message::tool_result(ToolResult {
            tool_call_id: "toolu_1".into(),
            name: "WeatherSearch".into(),
            content: "sunny".into(),
        });
        let api = serde_json::to_value(AnthropicBackend::message_to_api(&msg)).unwrap();
        assert_eq!(api["role"], "user");
        assert_eq!(api["content"][0]["type"], "tool_result");
        assert_eq!(api["content"][0]["tool_use_id"], "toolu_1");
        assert_eq!(api["content"][0]["content"], "sunny");
    }

    #[test]
    fn response_keeps_only_first_tool_use() {
        let blocks: Vec<ApiResponseBlock> = serde_json::from_value(serde_json::json!([
            { "type": "text", "text": "Checking." },
            { "type": "tool_use", "id": "a", "name": "WeatherSearch", "input": { "query": "Lisbon" } },
            { "type": "tool_use", "id": "b", "name": "FlightSearch", "input": { "query": "Lisbon" } },
            { "type": "thinking", "thinking": "..." }
        ]))
        .unwrap();

        let msg = AnthropicBackend::response_to_message(blocks);
        assert_eq!(msg.role, Role::Assistant);
        assert_eq!(msg.text(), "Checking.");
        let call = msg.tool_call().unwrap();
        assert_eq!(call.id, "a");
        assert_eq!(call.name, "WeatherSearch");
        assert_eq!(msg.parts.len(), 2);
    }
}

//! OpenAI chat-completions backend.
//!
//! Also works against OpenAI-compatible servers (vLLM and friends) through
//! [`OpenAiBackendBuilder::base_url`].

use super::keep_first_tool_call;
use crate::model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolSpec,
    Usage,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<ApiMessage>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    parallel_tool_calls: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ApiMessage {
    role: &'static str,
    content: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ApiToolCall>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiToolCall {
    id: String,
    #[serde(rename = "type", default = "function_type")]
    call_type: String,
    function: ApiFunctionCall,
}

fn function_type() -> String {
    "function".to_string()
}

#[derive(Debug, Serialize, Deserialize)]
struct ApiFunctionCall {
    name: String,
    /// JSON-encoded arguments, as the API sends and expects them.
    arguments: String,
}

#[derive(Debug, Clone, Serialize)]
struct ApiTool {
    #[serde(rename = "type")]
    tool_type: &'static str,
    function: ApiFunction,
}

#[derive(Debug, Clone, Serialize)]
struct ApiFunction {
    name: String,
    description: String,
    parameters: Value,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
    #[serde(default)]
    usage: Option<ApiUsage>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    tool_calls: Vec<ApiToolCall>,
}

#[derive(Debug, Deserialize)]
struct ApiUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an OpenAI backend.
#[derive(Debug, Clone)]
pub struct OpenAiBackendBuilder {
    api_key: String,
    model: String,
    base_url: String,
    max_tokens: u32,
    temperature: f32,
    tools: Vec<ToolSpec>,
}

impl OpenAiBackendBuilder {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: OPENAI_BASE_URL.to_string(),
            max_tokens: 4096,
            temperature: 0.0,
            tools: Vec::new(),
        }
    }

    /// Point the backend at another OpenAI-compatible server.
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
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

    pub fn build(self) -> OpenAiBackend {
        OpenAiBackend {
            client: reqwest::Client::new(),
            api_key: self.api_key,
            model: self.model,
            url: format!("{}/chat/completions", self.base_url),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            tools: self.tools.iter().map(OpenAiBackend::tool_to_api).collect(),
        }
    }
}

/// OpenAI API backend.
pub struct OpenAiBackend {
    client: reqwest::Client,
    api_key: String,
    model: String,
    url: String,
    max_tokens: u32,
    temperature: f32,
    tools: Vec<ApiTool>,
}

impl OpenAiBackend {
    pub fn builder(api_key: impl Into<String>, model: impl Into<String>) -> OpenAiBackendBuilder {
        OpenAiBackendBuilder::new(api_key, model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn role_to_api(role: Role) -> &'static str {
        match role {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }

    fn message_to_api(msg: &Message) -> ApiMessage {
        let mut tool_calls = Vec::new();
        let mut tool_call_id = None;
        let mut content = msg.text();

        for part in &msg.parts {
            match part {
                Part::Text { .. } => {}
                Part::ToolCall(call) => tool_calls.push(ApiToolCall {
                    id: call.id.clone(),
                    call_type: function_type(),
                    function: ApiFunctionCall {
                        name: call.name.clone(),
                        arguments: call.input.to_string(),
                    },
                }),
                Part::ToolResult(result) => {
                    tool_call_id = Some(result.tool_call_id.clone());
                    content = result.content.clone();
                }
            }
        }

        // Assistant turns that only call a tool carry a null content.
        let content = if content.is_empty() && !tool_calls.is_empty() {
            None
        } else {
            Some(content)
        };

        ApiMessage {
            role: Self::role_to_api(msg.role),
            content,
            tool_calls,
            tool_call_id,
        }
    }

    fn tool_to_api(spec: &ToolSpec) -> ApiTool {
        ApiTool {
            tool_type: "function",
            function: ApiFunction {
                name: spec.name.clone(),
                description: spec.description.clone(),
                parameters: spec.schema.clone(),
            },
        }
    }

    /// Decode the JSON-string arguments into a value; keep the raw string when
    /// the model produced something that is not JSON.
    fn decode_arguments(arguments: String) -> Value {
        if arguments.trim().is_empty() {
            return Value::Object(Default::default());
        }
        serde_json::from_str(&arguments).unwrap_or(Value::String(arguments))
    }

    fn response_to_message(message: ApiResponseMessage) -> Message {
        let calls = message
            .tool_calls
            .into_iter()
            .map(|call| ToolCall {
                id: call.id,
                name: call.function.name,
                input: Self::decode_arguments(call.function.arguments),
            })
            .collect();

        let text = message.content.unwrap_or_default();
        match keep_first_tool_call(calls, "openai") {
            Some(call) => Message::assistant_tool_call(text, call),
            None => Message::assistant(text),
        }
    }
}

impl std::fmt::Display for OpenAiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "openai({})", self.model)
    }
}

impl Backend for OpenAiBackend {
    async fn call(&self, request: ModelRequest<'_>) -> Result<ModelResponse, ModelError> {
        let api_request = ApiRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            messages: request.messages.iter().map(Self::message_to_api).collect(),
            tools: self.tools.clone(),
            parallel_tool_calls: (!self.tools.is_empty()).then_some(false),
        };

        debug!(model = %self.model, messages = api_request.messages.len(), "openai request");

        let response = self
            .client
            .post(&self.url)
            .bearer_auth(&self.api_key)
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ModelError::RateLimited { provider: "openai" });
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        let api_response: ApiResponse = response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ModelError::InvalidResponse("response has no choices".into()))?;

        let usage = api_response
            .usage
            .map(|u| Usage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        Ok(ModelResponse {
            message: Self::response_to_message(choice.message),
            usage,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToolResult;

    #[test]
    fn builder_trims_base_url() {
        let backend = OpenAiBackend::builder("key", "gpt-4.1")
            .base_url("http://localhost:8000/v1/")
            .build();
        assert_eq!(backend.url, "http://localhost:8000/v1/chat/completions");
        assert_eq!(backend.to_string(), "openai(gpt-4.1)");
    }

    #[test]
    fn assistant_tool_call_is_encoded_with_string_arguments() {
        let msg = Message::assistant_tool_call(
            "",
            ToolCall {
                id: "call_1".into(),
                name: "WeatherSearch".into(),
                input: serde_json::json!({ "query": "Lisbon" }),
            },
        );
        let api = serde_json::to_value(OpenAiBackend::message_to_api(&msg)).unwrap();
        assert_eq!(api["role"], "assistant");
        assert!(api["content"].is_null());
        assert_eq!(api["tool_calls"][0]["type"], "function");
        assert_eq!(
            api["tool_calls"][0]["function"]["arguments"],
            r#"{"query":"Lisbon"}"#
        );
    }

    #[test]
    fn tool_result_uses_tool_role() {
        let msg = Message::tool_result(ToolResult {
            tool_call_id: "call_1".into(),
            name: "WeatherSearch".into(),
            content: "sunny".into(),
        });
        let api = serde_json::to_value(OpenAiBackend::message_to_api(&msg)).unwrap();
        assert_eq!(api["role"], "tool");
        assert_eq!(api["tool_call_id"], "call_1");
        assert_eq!(api["content"], "sunny");
    }

    #[test]
    fn response_arguments_are_decoded_and_truncated_to_first_call() {
        let message: ApiResponseMessage = serde_json::from_value(serde_json::json!({
            "content": null,
            "tool_calls": [
                { "id": "a", "type": "function",
                  "function": { "name": "IntersightTool", "arguments": "{\"devices\":\"all\"}" } },
                { "id": "b", "type": "function",
                  "function": { "name": "ITSMAudit", "arguments": "{}" } }
            ]
        }))
        .unwrap();

        let msg = OpenAiBackend::response_to_message(message);
        let call = msg.tool_call().unwrap();
        assert_eq!(call.id, "a");
        assert_eq!(call.input["devices"], "all");
        assert_eq!(msg.parts.len(), 1);
    }

    #[test]
    fn non_json_arguments_are_kept_as_string() {
        assert_eq!(
            OpenAiBackend::decode_arguments("Lisbon".into()),
            Value::String("Lisbon".into())
        );
        assert_eq!(
            OpenAiBackend::decode_arguments(String::new()),
            Value::Object(Default::default())
        );
    }
}

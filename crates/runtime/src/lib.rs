//! Waypoint runtime: a small tool-routing agent loop.
//!
//! An agent is a reasoning node that calls a model, plus one node per tool.
//! The model either answers or asks for one tool; the loop runs that tool,
//! appends its output and asks the model again.
//!
//! # Overview
//!
//! - **ModelProvider**: resolves `openai` / `anthropic` to a backend bound to
//!   the agent's tools, caching what it builds.
//! - **ToolHost**: a trait for the fixed set of tools an agent exposes.
//! - **GraphBuilder / CompiledGraph**: declares the tool nodes and runs the
//!   loop with a turn budget.
//!
//! # Example
//!
//! ```ignore
//! use runtime::{
//!     ConversationState, EnvBackendFactory, GraphBuilder, Message, ModelProvider,
//!     ProviderSettings, ReasoningStep, RunConfig, ToolHost,
//! };
//! use std::sync::Arc;
//!
//! # async fn example(tools: impl ToolHost) -> runtime::Result<()> {
//! let factory = EnvBackendFactory::new(ProviderSettings::default());
//! let provider = Arc::new(ModelProvider::new(factory, tools.specs().to_vec()));
//! let reasoning = ReasoningStep::new("You are a helpful assistant.", provider);
//!
//! let graph = GraphBuilder::new()
//!     .tool_node("weather_action", "WeatherSearch")
//!     .compile(reasoning, tools)?;
//!
//! let state = ConversationState::with_messages(vec![Message::user("Weather in Lisbon?")]);
//! let outcome = graph.invoke(state, &RunConfig::new()).await.map_err(|e| e.error)?;
//! println!("{}", outcome.state.last().map(Message::text).unwrap_or_default());
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
pub mod graph;
pub mod model;
pub mod providers;
pub mod tools;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::RunConfig;
pub use error::{Error, Result};

pub use model::{
    Backend, Message, ModelError, ModelRequest, ModelResponse, Part, Role, ToolCall, ToolResult,
    ToolSpec, Usage,
};

pub use providers::{
    BackendFactory, EnvBackendFactory, ModelId, ModelProvider, ProviderBackend, ProviderSettings,
};

pub use tools::{ToolError, ToolHost, ToolOutput};

pub use graph::{
    CompiledGraph, ConversationState, DEFAULT_MAX_TURNS, GraphBuilder, ReasoningStep, RunError,
    RunOutcome, Termination,
};

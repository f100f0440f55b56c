//! The orchestration loop.
//!
//! A graph has one reasoning node as its entry point and one node per tool.
//! After every reasoning step the [router](router::route) either picks a tool
//! node or ends the run; every tool node leads straight back to reasoning.
//!
//! ```ignore
//! let graph = GraphBuilder::new()
//!     .tool_node("weather_action", "WeatherSearch")
//!     .tool_node("activity_action", "ActivitySearch")
//!     .compile(reasoning, tools)?;
//!
//! let outcome = graph.invoke(state, &RunConfig::new()).await?;
//! ```

mod router;
mod state;
mod step;

pub use router::{Route, route};
pub use state::{ConversationState, StateDelta};
pub use step::{ReasoningStep, StepOutput};

use crate::config::RunConfig;
use crate::model::{Message, ToolResult, ToolSpec, Usage};
use crate::providers::BackendFactory;
use crate::tools::ToolHost;
use crate::{Error, Result};
use serde::Serialize;
use std::collections::HashSet;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

/// Reasoning turns allowed per run unless overridden.
pub const DEFAULT_MAX_TURNS: usize = 25;

/// A node that runs one tool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolNode {
    pub node: String,
    pub tool: String,
}

/// Declares the tool nodes of a graph.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    nodes: Vec<ToolNode>,
    max_turns: usize,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            max_turns: DEFAULT_MAX_TURNS,
        }
    }

    /// Add a node that executes `tool`, with an edge back to reasoning.
    pub fn tool_node(mut self, node: impl Into<String>, tool: impl Into<String>) -> Self {
        self.nodes.push(ToolNode {
            node: node.into(),
            tool: tool.into(),
        });
        self
    }

    pub fn max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    /// Validate the declaration and bind it to a reasoning step and tool host.
    ///
    /// Every node must name a tool the host provides and the model is bound
    /// to. Node names and tool names must be unique.
    pub fn compile<F, H>(self, reasoning: ReasoningStep<F>, host: H) -> Result<CompiledGraph<F, H>>
    where
        F: BackendFactory,
        H: ToolHost,
    {
        if self.nodes.is_empty() {
            return Err(Error::InvalidGraph("graph has no tool nodes".into()));
        }
        if self.max_turns == 0 {
            return Err(Error::InvalidGraph("max_turns must be at least 1".into()));
        }

        let mut node_names = HashSet::new();
        let mut tool_names = HashSet::new();
        for ToolNode { node, tool } in &self.nodes {
            if !node_names.insert(node.as_str()) {
                return Err(Error::InvalidGraph(format!("duplicate node '{node}'")));
            }
            if !tool_names.insert(tool.as_str()) {
                return Err(Error::InvalidGraph(format!(
                    "tool '{tool}' is bound to more than one node"
                )));
            }
            if !host.has_tool(tool) {
                return Err(Error::InvalidGraph(format!(
                    "node '{node}' names unknown tool '{tool}'"
                )));
            }
            if !reasoning.provider().tools().iter().any(|t| t.name == *tool) {
                return Err(Error::InvalidGraph(format!(
                    "tool '{tool}' is not bound to the model"
                )));
            }
        }

        let allowed = self.nodes.iter().map(|n| n.tool.clone()).collect();
        debug!(nodes = self.nodes.len(), max_turns = self.max_turns, "graph compiled");

        Ok(CompiledGraph {
            reasoning,
            host,
            nodes: self.nodes,
            allowed,
            max_turns: self.max_turns,
        })
    }
}

/// Why a run stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum Termination {
    /// The model answered without requesting a tool, or requested one the
    /// graph does not have.
    Finished,
    /// The turn budget ran out while the model was still calling tools.
    TurnLimit { max_turns: usize },
}

/// Result of a completed run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub state: ConversationState,
    pub termination: Termination,
    /// Reasoning steps taken.
    pub turns: usize,
    /// Tool nodes executed.
    pub tool_calls: usize,
    pub usage: Usage,
}

/// A run that failed. Carries whatever state had accumulated.
#[derive(Debug, thiserror::Error)]
#[error("run failed: {error}")]
pub struct RunError {
    #[source]
    pub error: Error,
    pub state: ConversationState,
}

/// A validated graph, ready to run.
pub struct CompiledGraph<F: BackendFactory, H: ToolHost> {
    reasoning: ReasoningStep<F>,
    host: H,
    nodes: Vec<ToolNode>,
    allowed: Vec<String>,
    max_turns: usize,
}

impl<F: BackendFactory, H: ToolHost> CompiledGraph<F, H> {
    pub fn nodes(&self) -> &[ToolNode] {
        &self.nodes
    }

    pub fn tools(&self) -> &[ToolSpec] {
        self.host.specs()
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn reasoning(&self) -> &ReasoningStep<F> {
        &self.reasoning
    }

    pub fn max_turns(&self) -> usize {
        self.max_turns
    }

    /// Run the loop from `state` until the model stops calling tools.
    pub async fn invoke(
        &self,
        state: ConversationState,
        config: &RunConfig,
    ) -> std::result::Result<RunOutcome, RunError> {
        let max_turns = config.max_turns.unwrap_or(self.max_turns);
        let span = info_span!("run", run_id = %Uuid::new_v4(), max_turns);
        self.drive(state, config, max_turns).instrument(span).await
    }

    async fn drive(
        &self,
        mut state: ConversationState,
        config: &RunConfig,
        max_turns: usize,
    ) -> std::result::Result<RunOutcome, RunError> {
        if max_turns == 0 {
            return Err(RunError {
                error: Error::Config("max_turns must be at least 1".into()),
                state,
            });
        }

        info!(messages = state.len(), "run started");
        let mut turns = 0;
        let mut tool_calls = 0;
        let mut usage = Usage::default();

        loop {
            if turns == max_turns {
                warn!(turns, "turn limit reached; stopping run");
                state.push(Message::assistant(format!(
                    "Stopped after {max_turns} reasoning turns without a final answer."
                )));
                return Ok(RunOutcome {
                    state,
                    termination: Termination::TurnLimit { max_turns },
                    turns,
                    tool_calls,
                    usage,
                });
            }

            turns += 1;
            let output = match self.reasoning.run(&state, config).await {
                Ok(output) => output,
                Err(error) => return Err(RunError { error, state }),
            };
            usage += output.usage;
            state.apply(output.delta);

            let tool = match route(&state, &self.allowed) {
                Route::Tool(tool) => tool,
                Route::End => {
                    info!(turns, tool_calls, total_tokens = usage.total_tokens(), "run finished");
                    return Ok(RunOutcome {
                        state,
                        termination: Termination::Finished,
                        turns,
                        tool_calls,
                        usage,
                    });
                }
            };

            // The router only returns a tool when the last message carries a call.
            let Some(call) = state.last().and_then(Message::tool_call).cloned() else {
                return Err(RunError {
                    error: Error::InvalidGraph(format!("routed to '{tool}' without a tool call")),
                    state,
                });
            };
            let node = self
                .nodes
                .iter()
                .find(|n| n.tool == tool)
                .map(|n| n.node.as_str())
                .unwrap_or(tool.as_str());
            debug!(node, tool = %call.name, call_id = %call.id, "executing tool node");

            let output = match self.host.execute(&call).await {
                Ok(output) => output,
                Err(error) => {
                    return Err(RunError {
                        error: error.into(),
                        state,
                    });
                }
            };
            tool_calls += 1;

            state.push(Message::tool_result(ToolResult {
                tool_call_id: call.id,
                name: call.name,
                content: output.content,
            }));
            for (key, value) in output.updates {
                state.set_aux(key, value);
            }
        }
    }
}

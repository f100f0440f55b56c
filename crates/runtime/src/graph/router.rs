//! Conditional routing out of the reasoning node.

use super::state::ConversationState;
use tracing::{info, warn};

/// Where the loop goes after a reasoning step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Run the tool with this name.
    Tool(String),
    /// Stop the run.
    End,
}

/// Pick the next node from the most recent message.
///
/// A tool call naming something outside `allowed` ends the run instead of
/// failing it.
pub fn route(state: &ConversationState, allowed: &[String]) -> Route {
    let Some(call) = state.last().and_then(|m| m.tool_call()) else {
        info!("no tool call in last message; ending");
        return Route::End;
    };

    if allowed.iter().any(|name| *name == call.name) {
        info!(tool = %call.name, "routing to tool");
        Route::Tool(call.name.clone())
    } else {
        warn!(tool = %call.name, "unexpected tool call; ending");
        Route::End
    }
}

//! Vacation planning agent.

mod tools;

pub use tools::{
    ACTIVITY_SEARCH, FLIGHT_SEARCH, QUERY_PARAM, TravelTools, WEATHER_SEARCH, search_query,
    tool_specs,
};

use crate::search::SearchBackend;
use runtime::{
    BackendFactory, CompiledGraph, GraphBuilder, ModelId, ModelProvider, ReasoningStep, Result,
    ToolHost,
};
use std::sync::Arc;

pub const SYSTEM_PROMPT: &str = "You are a helpful vacation planning assistant.
Your goal is to help the user plan their trip based on their request.
The user will provide a destination, a start time (which might be relative, like 'in 10 days'), and a duration (e.g., 'for 5 days').

To fulfill the request, you MUST use the available tools in the following order:
1. First, use the 'WeatherSearch' tool to find the weather forecast for the destination around the specified start date.
2. Second, use the 'ActivitySearch' tool to find potential things to do or sights to see at the destination suitable for the trip's duration.
3. Third, use the 'FlightSearch' tool to find information about available flights to the destination around the specified start date.

IMPORTANT: You must call the tools ONE AT A TIME in the specified order. Wait for the result of one tool call before making the next one.

Once you have gathered information from all three tools, synthesize the results into a comprehensive plan for the user.

!Important: Only provide information that pertains to planning this trip.  No other topics should be referenced.
";

pub const DEFAULT_MODEL: ModelId = ModelId::OpenAi;

/// Build the travel graph: reasoning plus one node per search tool.
pub fn graph<F, S>(factory: F, search: S, max_turns: usize) -> Result<CompiledGraph<F, TravelTools<S>>>
where
    F: BackendFactory,
    S: SearchBackend,
{
    let tools = TravelTools::new(search);
    let provider = Arc::new(ModelProvider::new(factory, tools.specs().to_vec()));
    let reasoning = ReasoningStep::new(SYSTEM_PROMPT, provider).with_default_model(DEFAULT_MODEL);

    GraphBuilder::new()
        .tool_node("weather_action", WEATHER_SEARCH)
        .tool_node("activity_action", ACTIVITY_SEARCH)
        .tool_node("flight_action", FLIGHT_SEARCH)
        .max_turns(max_turns)
        .compile(reasoning, tools)
}

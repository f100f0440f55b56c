//! Search-backed travel tools.

use crate::search::SearchBackend;
use runtime::{ToolCall, ToolError, ToolHost, ToolOutput, ToolSpec};
use tracing::info;

pub const WEATHER_SEARCH: &str = "WeatherSearch";
pub const ACTIVITY_SEARCH: &str = "ActivitySearch";
pub const FLIGHT_SEARCH: &str = "FlightSearch";

/// Name of the single argument every travel tool takes.
pub const QUERY_PARAM: &str = "query";

/// The search query a travel tool sends for the model's argument.
pub fn search_query(tool: &str, query: &str) -> Option<String> {
    match tool {
        WEATHER_SEARCH => Some(format!("Weather forecast for {query}")),
        ACTIVITY_SEARCH => Some(format!("Things to do or activities in {query}")),
        FLIGHT_SEARCH => Some(format!("Flights for {query}")),
        _ => None,
    }
}

/// WeatherSearch, ActivitySearch and FlightSearch over one search backend.
pub struct TravelTools<S> {
    search: S,
    specs: Vec<ToolSpec>,
}

/// Specs for the three travel tools, in node order.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec::single_string(
            WEATHER_SEARCH,
            "Useful for finding weather forecasts for a specific location and time.",
            QUERY_PARAM,
            "Location and time to get the forecast for",
        ),
        ToolSpec::single_string(
            ACTIVITY_SEARCH,
            "Useful for finding activities, attractions, or things to do in a specific location.",
            QUERY_PARAM,
            "Location to find things to do in",
        ),
        ToolSpec::single_string(
            FLIGHT_SEARCH,
            "Useful for finding flight information to a specific location around a certain time.",
            QUERY_PARAM,
            "Destination and travel dates",
        ),
    ]
}

impl<S: SearchBackend> TravelTools<S> {
    pub fn new(search: S) -> Self {
        Self {
            search,
            specs: tool_specs(),
        }
    }

    pub fn search(&self) -> &S {
        &self.search
    }
}

impl<S: SearchBackend> ToolHost for TravelTools<S> {
    fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    async fn execute(&self, call: &ToolCall) -> Result<ToolOutput, ToolError> {
        let query = call.string_arg(QUERY_PARAM);
        let search_query = search_query(&call.name, &query)
            .ok_or_else(|| ToolError::NotFound(call.name.clone()))?;

        info!(tool = %call.name, query = %search_query, "searching");
        let results = self.search.search(&search_query).await?;

        let content = match results {
            serde_json::Value::String(text) => text,
            other => other.to_string(),
        };
        Ok(ToolOutput::text(content))
    }
}

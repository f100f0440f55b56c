//! The two demo agents built on the waypoint runtime.
//!
//! - [`travel`]: plans a trip with weather, activity and flight searches.
//! - [`network`]: audits switch firmware against ITSM records and submits an
//!   upgrade plan for approval.

pub mod network;
pub mod search;
pub mod travel;

pub use search::{DEFAULT_MAX_RESULTS, SearchBackend, TavilySearch};

use runtime::{Error, ModelId, Result, ToolSpec};
use std::str::FromStr;

/// Which agent to build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentKind {
    Travel,
    Network,
}

impl AgentKind {
    pub const ALL: [AgentKind; 2] = [AgentKind::Travel, AgentKind::Network];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Travel => "travel",
            Self::Network => "network",
        }
    }

    pub fn system_prompt(&self) -> &'static str {
        match self {
            Self::Travel => travel::SYSTEM_PROMPT,
            Self::Network => network::SYSTEM_PROMPT,
        }
    }

    /// The agent's tool registry, without building its backends.
    pub fn tool_specs(&self) -> Vec<ToolSpec> {
        match self {
            Self::Travel => travel::tool_specs(),
            Self::Network => network::tool_specs(),
        }
    }

    pub fn default_model(&self) -> ModelId {
        match self {
            Self::Travel => travel::DEFAULT_MODEL,
            Self::Network => network::DEFAULT_MODEL,
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgentKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "travel" => Ok(Self::Travel),
            "network" => Ok(Self::Network),
            other => Err(Error::Config(format!(
                "unknown agent '{other}' (expected 'travel' or 'network')"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_agent_names() {
        for kind in AgentKind::ALL {
            assert_eq!(kind.to_string().parse::<AgentKind>().unwrap(), kind);
        }
        assert_eq!("Network".parse::<AgentKind>().unwrap(), AgentKind::Network);
        assert!(matches!("weather".parse::<AgentKind>(), Err(Error::Config(_))));
    }

    #[test]
    fn both_agents_default_to_openai() {
        for kind in AgentKind::ALL {
            assert_eq!(kind.default_model(), ModelId::OpenAi);
        }
        assert!(AgentKind::Network.system_prompt().contains("ITSMApproval"));
        assert!(AgentKind::Travel.system_prompt().contains("FlightSearch"));
    }

    #[test]
    fn every_tool_is_named_in_its_prompt() {
        for kind in AgentKind::ALL {
            let specs = kind.tool_specs();
            assert_eq!(specs.len(), 3);
            for spec in specs {
                assert!(kind.system_prompt().contains(&spec.name), "{}", spec.name);
            }
        }
    }
}

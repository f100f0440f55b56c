//! Tool registry boundary between the orchestration loop and side effects.

pub mod errors;
mod host;

pub use errors::ToolError;
pub use host::{ToolHost, ToolOutput};

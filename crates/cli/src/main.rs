mod config;
mod env;
mod error;

use std::path::PathBuf;

use agents::network::{self, DemoInventory, DemoItsm};
use agents::{AgentKind, TavilySearch, travel};
use clap::{Parser, Subcommand};
use runtime::{
    BackendFactory, CompiledGraph, ConversationState, EnvBackendFactory, Message, Part, Role,
    RunConfig, RunError, RunOutcome, Termination, ToolCall, ToolHost,
};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use config::Config;
use error::{Error, Result};

const DEFAULT_LOG_DIRECTIVE: &str = "info";
const TOOL_OUTPUT_PREVIEW_CHARS: usize = 500;

#[derive(Parser)]
#[command(name = "waypoint")]
#[command(about = "Tool-routing travel and network agents", long_about = None)]
#[command(version)]
struct Cli {
    /// Config file (defaults to ./waypoint.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log filter directive, e.g. "debug" or "runtime=trace" (overrides RUST_LOG)
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run an agent on a single prompt
    Run {
        /// Agent to run (travel, network)
        #[arg(short, long)]
        agent: AgentKind,
        /// Model id (openai, anthropic)
        #[arg(short, long)]
        model: Option<String>,
        /// Maximum reasoning turns
        #[arg(long)]
        max_turns: Option<usize>,
        /// Print the outcome as JSON instead of a transcript
        #[arg(long)]
        json: bool,
        /// The user's request
        prompt: String,
    },
    /// List an agent's tools
    Tools {
        #[arg(short, long)]
        agent: AgentKind,
    },
    /// Invoke one tool directly, bypassing the model
    Call {
        #[arg(short, long)]
        agent: AgentKind,
        /// Tool name, e.g. ITSMAudit
        tool: String,
        /// The tool's single string argument
        input: String,
    },
}

fn main() {
    #[cfg(windows)]
    env::load_dotenv();

    let cli = Cli::parse();
    init_tracing(cli.log_level.as_deref());

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(Error::from)
        .and_then(|rt| rt.block_on(run(cli)));

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn init_tracing(directive: Option<&str>) {
    let filter = match directive {
        Some(directive) => EnvFilter::try_new(directive).ok(),
        None => EnvFilter::try_from_default_env().ok(),
    }
    .unwrap_or_else(|| EnvFilter::new(DEFAULT_LOG_DIRECTIVE));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::resolve(cli.config.as_deref())?;

    match cli.command {
        Commands::Run {
            agent,
            model,
            max_turns,
            json,
            prompt,
        } => {
            let run_config = config.run_config(model, max_turns);
            cmd_run(&config, agent, &run_config, json, prompt).await
        }
        Commands::Tools { agent } => {
            cmd_tools(agent);
            Ok(())
        }
        Commands::Call { agent, tool, input } => cmd_call(&config, agent, &tool, input).await,
    }
}

async fn cmd_run(
    config: &Config,
    agent: AgentKind,
    run_config: &RunConfig,
    json: bool,
    prompt: String,
) -> Result<()> {
    let factory = EnvBackendFactory::new(config.models.clone());
    let state = ConversationState::with_messages(vec![Message::user(prompt)]);
    tracing::info!(%agent, "starting run");

    match agent {
        AgentKind::Travel => {
            let search = TavilySearch::from_env(config.search.max_results)?;
            let graph = travel::graph(factory, search, config.run.max_turns)?;
            invoke(&graph, state, run_config, json).await
        }
        AgentKind::Network => {
            let graph = network::graph(
                factory,
                DemoInventory,
                DemoItsm::default(),
                config.run.max_turns,
            )?;
            invoke(&graph, state, run_config, json).await
        }
    }
}

async fn invoke<F: BackendFactory, H: ToolHost>(
    graph: &CompiledGraph<F, H>,
    state: ConversationState,
    run_config: &RunConfig,
    json: bool,
) -> Result<()> {
    match graph.invoke(state, run_config).await {
        Ok(outcome) if json => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            Ok(())
        }
        Ok(outcome) => {
            print_transcript(outcome.state.messages());
            print_summary(&outcome);
            Ok(())
        }
        Err(RunError { error, state }) => {
            if state.len() > 1 {
                eprintln!("Run failed; transcript so far:\n");
                print_transcript(state.messages());
            }
            Err(error.into())
        }
    }
}

fn cmd_tools(agent: AgentKind) {
    println!("{:<16}  DESCRIPTION", "TOOL");
    println!("{}", "-".repeat(80));
    for spec in agent.tool_specs() {
        println!("{:<16}  {}", spec.name, spec.description);
    }
}

async fn cmd_call(config: &Config, agent: AgentKind, tool: &str, input: String) -> Result<()> {
    if !agent.tool_specs().iter().any(|spec| spec.name == tool) {
        return Err(Error::UnknownTool {
            agent: agent.to_string(),
            tool: tool.to_string(),
        });
    }

    let call = ToolCall {
        id: "cli".to_string(),
        name: tool.to_string(),
        input: Value::String(input),
    };

    let output = match agent {
        AgentKind::Travel => {
            let search = TavilySearch::from_env(config.search.max_results)?;
            travel::TravelTools::new(search).execute(&call).await?
        }
        AgentKind::Network => {
            network::NetworkTools::new(DemoInventory, DemoItsm::default())
                .execute(&call)
                .await?
        }
    };

    println!("{}", output.content);
    for (key, value) in &output.updates {
        tracing::debug!(%key, %value, "tool state update");
    }
    Ok(())
}

fn print_transcript(messages: &[Message]) {
    for message in messages {
        for part in &message.parts {
            match (message.role, part) {
                (Role::User, Part::Text { text }) => println!("> {text}\n"),
                (_, Part::Text { text }) => println!("{text}\n"),
                (_, Part::ToolCall(call)) => println!("[calling {} {}]\n", call.name, call.input),
                (_, Part::ToolResult(result)) => {
                    println!("[{}] {}\n", result.name, preview(&result.content));
                }
            }
        }
    }
}

fn print_summary(outcome: &RunOutcome) {
    let reason = match outcome.termination {
        Termination::Finished => "finished".to_string(),
        Termination::TurnLimit { max_turns } => format!("stopped at {max_turns} turns"),
    };
    println!(
        "-- {reason}: {} turns, {} tool calls, {} tokens",
        outcome.turns,
        outcome.tool_calls,
        outcome.usage.total_tokens()
    );
    for line in aux_lines(&outcome.state) {
        println!("   {line}");
    }
}

/// Recorded aux fields, one `key: value` line each.
fn aux_lines(state: &ConversationState) -> Vec<String> {
    state
        .aux_fields()
        .iter()
        .map(|(key, value)| match value {
            Value::String(text) => format!("{key}: {}", preview(text)),
            other => format!("{key}: {other}"),
        })
        .collect()
}

/// Truncate long tool output for display.
fn preview(content: &str) -> String {
    if content.chars().count() <= TOOL_OUTPUT_PREVIEW_CHARS {
        return content.to_string();
    }
    let head: String = content.chars().take(TOOL_OUTPUT_PREVIEW_CHARS).collect();
    format!("{head}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_run_command() {
        let cli = Cli::try_parse_from([
            "waypoint",
            "run",
            "--agent",
            "travel",
            "--model",
            "anthropic",
            "--max-turns",
            "5",
            "Plan a 5-day trip to Lisbon",
        ])
        .unwrap();

        match cli.command {
            Commands::Run {
                agent,
                model,
                max_turns,
                json,
                prompt,
            } => {
                assert_eq!(agent, AgentKind::Travel);
                assert_eq!(model.as_deref(), Some("anthropic"));
                assert_eq!(max_turns, Some(5));
                assert!(!json);
                assert_eq!(prompt, "Plan a 5-day trip to Lisbon");
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "waypoint",
            "tools",
            "--agent",
            "network",
            "--log-level",
            "debug",
        ])
        .unwrap();
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Commands::Tools { agent: AgentKind::Network }));
    }

    #[test]
    fn rejects_unknown_agent() {
        assert!(Cli::try_parse_from(["waypoint", "tools", "--agent", "hotel"]).is_err());
    }

    #[test]
    fn preview_truncates_on_char_boundaries() {
        assert_eq!(preview("short"), "short");
        let long = "ü".repeat(600);
        let shown = preview(&long);
        assert_eq!(shown.chars().count(), TOOL_OUTPUT_PREVIEW_CHARS + 3);
        assert!(shown.ends_with("..."));
    }

    #[test]
    fn aux_fields_are_listed_in_key_order() {
        let mut state = ConversationState::new();
        state.set_aux("devices", serde_json::json!(["spine-sw01", "leaf-sw13"]));
        state.set_aux("approval_status", Value::String("SUBMITTED".into()));

        assert_eq!(
            aux_lines(&state),
            [
                "approval_status: SUBMITTED",
                r#"devices: ["spine-sw01","leaf-sw13"]"#,
            ]
        );
        assert!(aux_lines(&ConversationState::new()).is_empty());
    }

    #[tokio::test]
    async fn call_rejects_tools_from_the_other_agent() {
        let err = cmd_call(
            &Config::default(),
            AgentKind::Network,
            "WeatherSearch",
            "Lisbon".into(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::UnknownTool { .. }));
    }

    #[tokio::test]
    async fn call_runs_network_tools_offline() {
        cmd_call(
            &Config::default(),
            AgentKind::Network,
            "IntersightTool",
            "all".into(),
        )
        .await
        .unwrap();
    }
}

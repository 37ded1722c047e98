//! Command handlers for CLI operations
//!
//! - run: Execute a task once
//! - repl: Interactive task loop
//! - status: Show workers, model and memory
//! - config show / path: Inspect configuration

use anyhow::{Context, Result};
use serde_json::json;
use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;

use crate::conductor::{Orchestrator, TaskMemory};
use crate::config::Config;
use crate::llm::openai::OpenAIProvider;
use crate::llm::LLMProvider;
use crate::workers::build_default_registry;
use sdk::{AgentResponse, EngineError, PollexErrorExt};

/// Output format for command results
#[derive(Debug, Clone, Copy)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Wire the model backend, workers and optional memory into an orchestrator
pub fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let llm: Arc<dyn LLMProvider> = Arc::new(OpenAIProvider::new(config.llm.clone()));
    let registry = Arc::new(build_default_registry(config, llm.clone())?);

    let mut orchestrator = Orchestrator::new(llm, registry, &config.orchestrator);

    if config.memory.enabled {
        let memory = match &config.memory.persist_path {
            Some(path) => TaskMemory::with_persistence(path)
                .with_context(|| format!("Failed to load memory from {}", path.display()))?,
            None => TaskMemory::new(),
        };
        orchestrator = orchestrator.with_memory(memory, config.memory.context_limit);
    }

    Ok(orchestrator)
}

/// Run one task, cancelling it if `interrupt` resolves first
///
/// The interrupt future lives only as long as the run, so no listener
/// outlasts the task it guards.
async fn run_interruptible<F>(
    orchestrator: &mut Orchestrator,
    task: &str,
    interrupt: F,
) -> Result<AgentResponse, EngineError>
where
    F: Future<Output = ()>,
{
    let cancel = CancellationToken::new();
    let run = orchestrator.run_with_cancel(task, cancel.clone());
    tokio::pin!(run);

    tokio::select! {
        result = &mut run => result,
        _ = interrupt => {
            tracing::warn!("Interrupt received, cancelling run");
            cancel.cancel();
            run.await
        }
    }
}

/// Resolves on Ctrl-C; never resolves if the signal cannot be watched
async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::debug!(error = %e, "Ctrl-C handler unavailable");
        std::future::pending::<()>().await;
    }
}

fn print_response(response: &AgentResponse, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("{}", response.content);
            println!();
            if response.success {
                println!("✓ Task completed successfully");
            } else {
                println!("✗ Task finished with failures");
            }
            if let Some(err) = &response.error {
                println!("  Note: {}", err);
            }
        }
        OutputFormat::Json => {
            let output = json!({
                "status": "completed",
                "success": response.success,
                "content": response.content,
                "data": response.data,
                "error": response.error,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

fn print_error(err: &EngineError, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            println!("✗ Task failed: {}", err);
            println!("  Hint: {}", err.user_hint());
        }
        OutputFormat::Json => {
            let output = json!({
                "status": "failed",
                "error": err.to_string(),
                "hint": err.user_hint(),
                "recoverable": err.is_recoverable(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

/// Run a task once
pub async fn handle_run(task: String, config: &Config, format: OutputFormat) -> Result<()> {
    config.llm.api_key()?;
    let mut orchestrator = build_orchestrator(config)?;

    if let OutputFormat::Text = format {
        println!("Executing task: {}", task);
        println!();
    }

    match run_interruptible(&mut orchestrator, &task, ctrl_c()).await {
        Ok(response) => print_response(&response, format),
        Err(e) => {
            print_error(&e, format)?;
            Err(e.into())
        }
    }
}

const REPL_HELP: &str = "Commands:
  help               Show this help
  status             Show orchestrator status
  clear              Clear conversation and short-term memory
  quit / exit / q    Leave the session
Anything else is run as a task.";

/// Interactive session over stdin
pub async fn handle_repl(config: &Config, format: OutputFormat) -> Result<()> {
    config.llm.api_key()?;
    let mut orchestrator = build_orchestrator(config)?;

    println!("Pollex interactive session. Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"\n> ").await?;
        stdout.flush().await?;

        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };
        let input = line.trim();

        match input {
            "" => continue,
            "quit" | "exit" | "q" => break,
            "help" => println!("{}", REPL_HELP),
            "status" => print!("{}", orchestrator.status()),
            "clear" => {
                orchestrator.reset();
                println!("Conversation cleared.");
            }
            task => match run_interruptible(&mut orchestrator, task, ctrl_c()).await {
                Ok(response) => print_response(&response, format)?,
                Err(e) => print_error(&e, format)?,
            },
        }
    }

    println!("Bye.");
    Ok(())
}

/// Show workers, model and memory state without calling the model
pub async fn handle_status(config: &Config, format: OutputFormat) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let status = orchestrator.status();
    let key_present = config.llm.api_key().is_ok();

    match format {
        OutputFormat::Text => {
            print!("{}", status);
            println!("  - endpoint: {}", config.llm.base_url);
            println!(
                "  - api key ({}): {}",
                config.llm.api_key_env,
                if key_present { "set" } else { "missing" }
            );
            println!("  - workspace: {}", config.core.workspace.display());
        }
        OutputFormat::Json => {
            let output = json!({
                "agents": status.agents,
                "model": status.model,
                "endpoint": config.llm.base_url,
                "api_key_present": key_present,
                "workspace": config.core.workspace,
                "memory": status.memory,
                "max_iterations": config.orchestrator.max_iterations,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }
    Ok(())
}

pub fn handle_config_show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let text = toml::to_string_pretty(config).context("Failed to serialize config")?;
            println!("{}", text);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
    }
    Ok(())
}

pub fn handle_config_path(path: &Path, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => println!("{}", path.display()),
        OutputFormat::Json => println!("{}", json!({ "path": path })),
    }
    Ok(())
}

//! CLI interface for Pollex
//!
//! Command-line interface built with clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Pollex task orchestrator
///
/// Breaks a task into subtasks, hands each one to a specialist worker
/// (code, browser, file, data) and iterates until the task is done.
#[derive(Parser, Debug)]
#[command(name = "pollex")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Execute a task once and print the result
    Run {
        /// The task to execute
        task: String,

        /// Override orchestrator.max_iterations for this run
        #[arg(long, value_name = "N")]
        max_iterations: Option<usize>,
    },

    /// Interactive session; type tasks line by line
    Repl,

    /// Show registered workers, model and memory state
    Status,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Configuration management actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the configuration file path
    Path,
}

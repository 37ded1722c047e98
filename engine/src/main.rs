// Pollex task orchestrator
// Main entry point for the pollex binary

use clap::Parser;
use pollex_engine::cli::{Cli, Command, ConfigAction};
use pollex_engine::config::Config;
use pollex_engine::handlers::{
    handle_config_path, handle_config_show, handle_repl, handle_run, handle_status, OutputFormat,
};
use pollex_engine::telemetry::init_telemetry_with_level;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let version = env!("CARGO_PKG_VERSION");
    let commit = env!("GIT_COMMIT_HASH");
    let timestamp = env!("BUILD_TIMESTAMP");

    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let config_path = match &cli.config {
        Some(path) => path.clone(),
        None => Config::default_config_path()?,
    };

    let mut config = if let Some(path) = &cli.config {
        Config::load_from_path(path)?
    } else {
        Config::load_or_create()?
    };

    // --log wins over the config file; RUST_LOG still wins over both
    if let Some(level) = &cli.log {
        config.core.log_level = level.clone();
    }
    config.validate()?;
    init_telemetry_with_level(&config.core.log_level);

    tracing::debug!("Pollex v{} ({} - {})", version, commit, timestamp);

    match cli.command {
        Command::Run {
            task,
            max_iterations,
        } => {
            if let Some(n) = max_iterations {
                config.orchestrator.max_iterations = n;
                config.validate()?;
            }
            tracing::info!("Executing task: {}", task);
            handle_run(task, &config, format).await
        }

        Command::Repl => handle_repl(&config, format).await,

        Command::Status => handle_status(&config, format).await,

        Command::Config { action } => match action {
            ConfigAction::Show => handle_config_show(&config, format),
            ConfigAction::Path => handle_config_path(&config_path, format),
        },
    }
}

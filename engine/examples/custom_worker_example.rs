//! Example wiring a custom worker next to the built-in ones
//!
//! Prerequisites:
//! - An OpenAI-compatible endpoint configured in ~/.pollex/config.toml
//! - The API key exported in the variable named by `llm.api_key_env`

use async_trait::async_trait;
use pollex_engine::conductor::{Orchestrator, WorkerRegistry};
use pollex_engine::config::Config;
use pollex_engine::llm::openai::OpenAIProvider;
use pollex_engine::llm::LLMProvider;
use sdk::{AgentResponse, Worker};
use std::sync::Arc;

/// Answers with the current UTC time
struct ClockWorker;

#[async_trait]
impl Worker for ClockWorker {
    fn description(&self) -> &str {
        "Reports the current date and time in UTC"
    }

    async fn run(&self, _task: &str) -> AgentResponse {
        AgentResponse::success(chrono::Utc::now().to_rfc3339())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_create()?;
    config.llm.api_key()?;

    let llm: Arc<dyn LLMProvider> = Arc::new(OpenAIProvider::new(config.llm.clone()));
    let code = pollex_engine::workers::code::build(&config, llm.clone());

    let registry = WorkerRegistry::builder()
        .register("code", Arc::new(code))
        .register("clock", Arc::new(ClockWorker))
        .build();

    let mut orchestrator = Orchestrator::new(llm, Arc::new(registry), &config.orchestrator);
    println!("{}", orchestrator.status());

    let response = orchestrator
        .run("What day of the week is it, and how many days remain in this year?")
        .await?;

    println!("{}", response.content);
    println!("success: {}", response.success);
    Ok(())
}

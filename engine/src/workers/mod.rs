//! Specialist workers
//!
//! Each worker is a [`ToolWorker`]: a system prompt plus a tool set, run as
//! think (model picks tool calls) → act (tools execute in order) → observe
//! (short summary, only when every tool succeeded).

pub mod browser;
pub mod code;
pub mod data;
pub mod file;

use crate::conductor::WorkerRegistry;
use crate::config::Config;
use crate::llm::{CompletionOptions, LLMProvider, Message};
use crate::tools::ToolSet;
use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::{AgentResponse, Worker};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

pub struct ToolWorker {
    tag: String,
    description: String,
    system_prompt: String,
    llm: Arc<dyn LLMProvider>,
    tools: ToolSet,
    options: CompletionOptions,
    summary_options: CompletionOptions,
}

impl ToolWorker {
    pub fn new(
        tag: impl Into<String>,
        description: impl Into<String>,
        system_prompt: impl Into<String>,
        llm: Arc<dyn LLMProvider>,
        tools: ToolSet,
    ) -> Self {
        Self {
            tag: tag.into(),
            description: description.into(),
            system_prompt: system_prompt.into(),
            llm,
            tools,
            options: CompletionOptions::new(0.7),
            summary_options: CompletionOptions::new(0.3).with_max_tokens(500),
        }
    }

    /// Sampling options of the tool-selection call
    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn tools(&self) -> &ToolSet {
        &self.tools
    }
}

#[async_trait]
impl Worker for ToolWorker {
    fn description(&self) -> &str {
        &self.description
    }

    async fn run(&self, task: &str) -> AgentResponse {
        debug!(worker = %self.tag, "Worker starting: {}", task);

        let mut messages = vec![Message::system(&self.system_prompt), Message::user(task)];
        let schemas = self.tools.schemas();
        let tools = (!schemas.is_empty()).then_some(schemas.as_slice());

        // Think
        let completion = match self.llm.complete(&messages, tools, self.options).await {
            Ok(c) => c,
            Err(e) => {
                warn!(worker = %self.tag, "Model call failed: {}", e);
                return AgentResponse::failure(format!("Model call failed: {}", e));
            }
        };
        messages.push(completion.to_message());

        if completion.tool_calls.is_empty() {
            info!(worker = %self.tag, "No tool calls, answering directly");
            return AgentResponse::success(completion.content);
        }

        // Act
        let mut outputs = Vec::with_capacity(completion.tool_calls.len());
        let mut records = Vec::with_capacity(completion.tool_calls.len());
        for call in &completion.tool_calls {
            let output = self.tools.dispatch(call).await;
            debug!(worker = %self.tag, tool = %call.name, success = output.success, "Tool finished");
            messages.push(Message::tool_result(output.to_string(), &call.id));
            records.push(json!({
                "tool": call.name,
                "success": output.success,
                "output": output.output,
                "error": output.error,
            }));
            outputs.push(output);
        }

        let succeeded = outputs.iter().filter(|o| o.success).count();
        info!(
            worker = %self.tag,
            "Tools finished: {}/{} succeeded",
            succeeded,
            outputs.len()
        );

        let content = outputs
            .iter()
            .map(|o| o.to_string())
            .collect::<Vec<_>>()
            .join("\n\n");
        let data = json!(records);

        if succeeded < outputs.len() {
            let errors = outputs
                .iter()
                .filter_map(|o| o.error.as_deref())
                .collect::<Vec<_>>()
                .join("; ");
            return AgentResponse {
                success: false,
                content,
                data: Some(data),
                error: Some(errors),
            };
        }

        // Observe
        messages.push(Message::user(format!(
            "Briefly summarize the execution result and what was done. Output:\n{}",
            content
        )));
        let content = match self.llm.complete(&messages, None, self.summary_options).await {
            Ok(summary) => format!("{}\n\nSummary: {}", content, summary.content),
            Err(e) => {
                warn!(worker = %self.tag, "Summary failed, returning raw output: {}", e);
                content
            }
        };

        AgentResponse::success(content).with_data(data)
    }
}

/// Register every worker enabled in `config`
pub fn build_default_registry(
    config: &Config,
    llm: Arc<dyn LLMProvider>,
) -> Result<WorkerRegistry, EngineError> {
    let options =
        CompletionOptions::new(config.llm.temperature).with_max_tokens(config.llm.max_tokens);
    let mut builder = WorkerRegistry::builder();

    if config.workers.code {
        let worker = code::build(config, llm.clone()).with_options(options);
        builder = builder.register("code", Arc::new(worker));
    }
    if config.workers.browser {
        let worker = browser::build(config, llm.clone()).with_options(options);
        builder = builder.register("browser", Arc::new(worker));
    }
    if config.workers.file {
        let worker = file::build(config, llm.clone())?.with_options(options);
        builder = builder.register("file", Arc::new(worker));
    }
    if config.workers.data {
        let worker = data::build(config, llm).with_options(options);
        builder = builder.register("data", Arc::new(worker));
    }

    let registry = builder.build();
    if registry.is_empty() {
        return Err(EngineError::Config("All workers are disabled".to_string()));
    }
    Ok(registry)
}

//! Scripted model and stub workers for conductor unit tests

use crate::conductor::registry::WorkerRegistry;
use crate::llm::{Completion, CompletionOptions, LLMError, LLMProvider, Message, ToolCall, ToolSchema};
use async_trait::async_trait;
use sdk::{AgentResponse, Worker};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<Message>,
    pub had_tools: bool,
    pub temperature: f32,
    pub max_tokens: Option<u32>,
}

/// Replays queued completions in order and records every request
pub struct ScriptedLLM {
    script: Mutex<VecDeque<Completion>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedLLM {
    pub fn new(script: Vec<Completion>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedLLM {
    fn name(&self) -> &str {
        "scripted"
    }

    fn model(&self) -> &str {
        "scripted-model"
    }

    async fn complete(
        &self,
        messages: &[Message],
        tools: Option<&[ToolSchema]>,
        options: CompletionOptions,
    ) -> crate::llm::Result<Completion> {
        self.requests.lock().unwrap().push(RecordedRequest {
            messages: messages.to_vec(),
            had_tools: tools.is_some(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LLMError::InvalidRequest("script exhausted".to_string()))
    }
}

/// Worker answering with a fixed response
pub struct FixedWorker(pub AgentResponse);

#[async_trait]
impl Worker for FixedWorker {
    fn description(&self) -> &str {
        "fixed test worker"
    }

    async fn run(&self, _task: &str) -> AgentResponse {
        self.0.clone()
    }
}

pub fn assign(id: &str, agent: &str, task: &str) -> ToolCall {
    ToolCall::new(
        id,
        "assign_task",
        serde_json::json!({"agent": agent, "task": task, "reason": "test"}).to_string(),
    )
}

/// Registry where every tag echoes a successful response
pub fn registry_of(tags: &[&str]) -> WorkerRegistry {
    tags.iter()
        .fold(WorkerRegistry::builder(), |b, tag| {
            b.register(
                *tag,
                Arc::new(FixedWorker(AgentResponse::success(format!("{} done", tag)))),
            )
        })
        .build()
}

//! Shared fixtures for engine integration tests

#![allow(dead_code)]

use async_trait::async_trait;
use pollex_engine::llm::{
    Completion, CompletionOptions, LLMError, LLMProvider, Message, ToolCall, ToolSchema,
};
use sdk::{AgentResponse, Worker};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Request {
    pub messages: Vec<Message>,
    pub tools: Option<Vec<ToolSchema>>,
    pub options: CompletionOptions,
}

/// Deterministic model: replays queued completions, records each request
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Completion>>,
    requests: Mutex<Vec<Request>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Completion>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        })
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests that offered tools, i.e. planning calls
    pub fn planning_requests(&self) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|r| r.tools.is_some())
            .collect()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
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
    ) -> pollex_engine::llm::Result<Completion> {
        self.requests.lock().unwrap().push(Request {
            messages: messages.to_vec(),
            tools: tools.map(<[ToolSchema]>::to_vec),
            options,
        });
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LLMError::InvalidRequest("script exhausted".to_string()))
    }
}

/// Model that never answers within `delay`
pub struct StallingProvider {
    delay: Duration,
}

impl StallingProvider {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self { delay })
    }
}

#[async_trait]
impl LLMProvider for StallingProvider {
    fn name(&self) -> &str {
        "stalling"
    }

    fn model(&self) -> &str {
        "stalling-model"
    }

    async fn complete(
        &self,
        _messages: &[Message],
        _tools: Option<&[ToolSchema]>,
        _options: CompletionOptions,
    ) -> pollex_engine::llm::Result<Completion> {
        tokio::time::sleep(self.delay).await;
        Ok(Completion::text("too late"))
    }
}

pub fn assign(id: &str, agent: &str, task: &str) -> ToolCall {
    ToolCall::new(
        id,
        "assign_task",
        serde_json::json!({"agent": agent, "task": task, "reason": "fits"}).to_string(),
    )
}

/// Planning completion assigning the given `(id, agent, task)` subtasks
pub fn plan(calls: &[(&str, &str, &str)]) -> Completion {
    Completion::with_calls(
        "",
        calls
            .iter()
            .map(|(id, agent, task)| assign(id, agent, task))
            .collect(),
    )
}

pub fn text(content: &str) -> Completion {
    Completion::text(content)
}

/// Returns the same response on every call and counts calls
pub struct StubWorker {
    response: AgentResponse,
    calls: AtomicUsize,
}

impl StubWorker {
    pub fn ok(content: &str) -> Arc<Self> {
        Self::with(AgentResponse::success(content))
    }

    pub fn failing(error: &str) -> Arc<Self> {
        Self::with(AgentResponse::failure(error))
    }

    pub fn with(response: AgentResponse) -> Arc<Self> {
        Arc::new(Self {
            response,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Worker for StubWorker {
    fn description(&self) -> &str {
        "stub worker"
    }

    async fn run(&self, _task: &str) -> AgentResponse {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.response.clone()
    }
}

pub struct PanicWorker;

#[async_trait]
impl Worker for PanicWorker {
    fn description(&self) -> &str {
        "always panics"
    }

    async fn run(&self, _task: &str) -> AgentResponse {
        panic!("worker exploded");
    }
}

/// Sleeps before answering
pub struct SlowWorker {
    pub delay: Duration,
    pub started: AtomicUsize,
}

impl SlowWorker {
    pub fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            started: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl Worker for SlowWorker {
    fn description(&self) -> &str {
        "slow worker"
    }

    async fn run(&self, _task: &str) -> AgentResponse {
        self.started.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        AgentResponse::success("finally")
    }
}

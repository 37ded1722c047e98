//! Orchestrator Loop
//!
//! Drives `RunStart → Planning → Dispatching → Observing` and then either
//! `Continue → Planning` or `Done`, until the continuation predicate says
//! stop or the iteration budget runs out.

use crate::conductor::conversation::ConversationStore;
use crate::conductor::dispatcher::{round_response, Dispatcher};
use crate::conductor::memory::{MemoryKind, TaskMemory};
use crate::conductor::observer::Observer;
use crate::conductor::planner::Planner;
use crate::conductor::registry::WorkerRegistry;
use crate::conductor::types::{
    ContinuationPredicate, DispatchRound, LastSubtaskPredicate, LoopState, RunState,
};
use crate::config::OrchestratorConfig;
use crate::llm::LLMProvider;
use sdk::errors::EngineError;
use sdk::AgentResponse;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Importance of the per-run observation in long-term memory
const OBSERVATION_IMPORTANCE: f32 = 0.7;

/// Task text for the next iteration
pub fn continuation_task(summary: &str) -> String {
    format!(
        "Previous step result:\n{}\n\nPlease continue the original task or address any issues encountered.",
        summary
    )
}

/// Task text with recent memory prepended
pub fn task_with_context(context: &str, task: &str) -> String {
    format!("Context:\n{}\n\nCurrent task: {}", context, task)
}

/// Snapshot of the orchestrator for status displays
#[derive(Debug, Clone)]
pub struct OrchestratorStatus {
    pub agents: Vec<String>,
    pub model: String,
    pub state: LoopState,
    pub iteration: usize,
    pub plan_len: Option<usize>,
    pub memory: Option<String>,
}

impl fmt::Display for OrchestratorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Orchestrator status:")?;
        writeln!(f, "  - agents: {}", self.agents.join(", "))?;
        writeln!(f, "  - model: {}", self.model)?;
        writeln!(f, "  - state: {} (iteration {})", self.state, self.iteration)?;
        match &self.memory {
            Some(summary) => writeln!(f, "  - {}", summary)?,
            None => writeln!(f, "  - memory: disabled")?,
        }
        if let Some(n) = self.plan_len {
            writeln!(f, "  - current plan: {} subtasks", n)?;
        }
        Ok(())
    }
}

struct MemorySettings {
    memory: TaskMemory,
    context_limit: usize,
}

pub struct Orchestrator {
    llm: Arc<dyn LLMProvider>,
    registry: Arc<WorkerRegistry>,
    planner: Planner,
    dispatcher: Dispatcher,
    observer: Observer,
    predicate: Box<dyn ContinuationPredicate>,
    max_iterations: usize,
    system_prompt: String,
    store: ConversationStore,
    run_state: RunState,
    state: LoopState,
    memory: Option<MemorySettings>,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LLMProvider>,
        registry: Arc<WorkerRegistry>,
        config: &OrchestratorConfig,
    ) -> Self {
        let planner = Planner::new(
            llm.clone(),
            config.planner_temperature,
            Duration::from_secs(config.planner_timeout_secs),
        );
        let dispatcher = Dispatcher::new(
            registry.clone(),
            Duration::from_secs(config.worker_timeout_secs),
            config.tool_output_limit,
        );
        let observer = Observer::new(
            llm.clone(),
            config.summary_temperature,
            config.summary_max_tokens,
            Duration::from_secs(config.summarizer_timeout_secs),
        );
        let system_prompt = Planner::system_prompt(&registry);

        Self {
            llm,
            registry,
            planner,
            dispatcher,
            observer,
            predicate: Box::new(LastSubtaskPredicate),
            max_iterations: config.max_iterations.max(1),
            system_prompt,
            store: ConversationStore::new(),
            run_state: RunState::default(),
            state: LoopState::Done,
            memory: None,
        }
    }

    /// Replace the default last-subtask continuation rule
    pub fn with_predicate(mut self, predicate: impl ContinuationPredicate + 'static) -> Self {
        self.predicate = Box::new(predicate);
        self
    }

    /// Enable cross-run task memory
    pub fn with_memory(mut self, memory: TaskMemory, context_limit: usize) -> Self {
        self.memory = Some(MemorySettings {
            memory,
            context_limit,
        });
        self
    }

    pub fn conversation(&self) -> &ConversationStore {
        &self.store
    }

    pub fn run_state(&self) -> &RunState {
        &self.run_state
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn memory(&self) -> Option<&TaskMemory> {
        self.memory.as_ref().map(|m| &m.memory)
    }

    pub fn registry(&self) -> &WorkerRegistry {
        &self.registry
    }

    pub fn status(&self) -> OrchestratorStatus {
        OrchestratorStatus {
            agents: self.registry.tags(),
            model: self.llm.model().to_string(),
            state: self.state,
            iteration: self.run_state.iteration,
            plan_len: self.run_state.plan.as_ref().map(Vec::len),
            memory: self.memory().map(TaskMemory::summary),
        }
    }

    /// Clear the conversation and short-term memory
    pub fn reset(&mut self) {
        self.store.clear();
        self.run_state = RunState::default();
        self.state = LoopState::Done;
        if let Some(settings) = self.memory.as_mut() {
            settings.memory.clear_short_term();
        }
    }

    /// Run a task to completion
    pub async fn run(&mut self, task: &str) -> Result<AgentResponse, EngineError> {
        self.run_with_cancel(task, CancellationToken::new()).await
    }

    /// Run a task, stopping early with `Cancelled` once `cancel` fires
    pub async fn run_with_cancel(
        &mut self,
        task: &str,
        cancel: CancellationToken,
    ) -> Result<AgentResponse, EngineError> {
        let result = self.drive(task, &cancel).await;
        self.state = LoopState::Done;
        self.persist_memory();
        result
    }

    fn transition(&mut self, next: LoopState) {
        debug!(from = %self.state, to = %next, iteration = self.run_state.iteration, "Loop transition");
        self.state = next;
    }

    async fn drive(
        &mut self,
        task: &str,
        cancel: &CancellationToken,
    ) -> Result<AgentResponse, EngineError> {
        self.transition(LoopState::RunStart);
        self.store.clear();
        self.run_state = RunState::new(task);

        info!("Received task: {}", task);

        let mut last: Option<AgentResponse> = None;

        while self.run_state.iteration < self.max_iterations {
            self.run_state.iteration += 1;
            let iteration = self.run_state.iteration;
            info!("Iteration {}/{}", iteration, self.max_iterations);

            // Planning
            self.transition(LoopState::Planning);
            let current_task = self.run_state.task.clone();
            let planner_task = self.planner_input(&current_task);
            let plan = self
                .planner
                .plan(&planner_task, &mut self.store, &self.registry, iteration, cancel)
                .await?;
            self.remember_short(format!("Task: {}", current_task), MemoryKind::Task);
            self.run_state.plan = Some(plan.subtasks.clone());
            let plan_was_empty = plan.subtasks.is_empty();

            // Dispatching
            self.transition(LoopState::Dispatching);
            let (round, outcome) = if plan_was_empty {
                info!("No subtasks planned, answering directly");
                (DispatchRound::default(), AgentResponse::success(plan.reply))
            } else {
                let round = self
                    .dispatcher
                    .dispatch(&plan.subtasks, &mut self.store, cancel)
                    .await?;
                let outcome = round_response(&round);
                (round, outcome)
            };
            info!(
                success = outcome.success,
                success_rate = round.success_rate(),
                "Dispatch outcome"
            );
            self.remember_short(
                format!(
                    "Execution result: {}",
                    if outcome.success { "success" } else { "failure" }
                ),
                MemoryKind::Result,
            );

            // Observing
            self.transition(LoopState::Observing);
            let summary = match self
                .observer
                .observe(&mut self.store, &self.system_prompt, cancel)
                .await
            {
                Ok(summary) => summary,
                Err(EngineError::Cancelled) => return Err(EngineError::Cancelled),
                Err(e) => {
                    warn!("{}; returning raw dispatch report", e);
                    return Ok(AgentResponse {
                        error: Some(e.to_string()),
                        ..outcome
                    });
                }
            };
            self.remember_observation(task, &summary);

            let stop = self
                .predicate
                .should_stop(&round, outcome.success, plan_was_empty);

            last = Some(AgentResponse {
                success: outcome.success,
                content: summary.clone(),
                data: outcome.data,
                error: None,
            });

            if stop {
                self.transition(LoopState::Done);
                info!("Task complete after {} iteration(s)", iteration);
                break;
            }

            self.transition(LoopState::Continue);
            self.run_state.task = continuation_task(&summary);
        }

        if self.state != LoopState::Done {
            warn!(
                "Iteration budget of {} exhausted, returning last response",
                self.max_iterations
            );
        }

        Ok(last.unwrap_or_else(|| AgentResponse::failure("no iteration completed")))
    }

    fn planner_input(&self, task: &str) -> String {
        let Some(settings) = self.memory.as_ref() else {
            return task.to_string();
        };
        let context = settings.memory.context(settings.context_limit);
        if context.is_empty() {
            task.to_string()
        } else {
            debug!(lines = context.lines().count(), "Adding memory context to plan");
            task_with_context(&context, task)
        }
    }

    fn remember_short(&mut self, content: String, kind: MemoryKind) {
        if let Some(settings) = self.memory.as_mut() {
            settings.memory.add_short_term(content, kind);
        }
    }

    fn remember_observation(&mut self, original_task: &str, summary: &str) {
        if let Some(settings) = self.memory.as_mut() {
            let excerpt: String = summary.chars().take(500).collect();
            settings.memory.add_long_term(
                format!("Task: {}\nResult: {}", original_task, excerpt),
                MemoryKind::Observation,
                OBSERVATION_IMPORTANCE,
            );
        }
    }

    fn persist_memory(&self) {
        if let Some(settings) = self.memory.as_ref() {
            if let Err(e) = settings.memory.save() {
                warn!("Failed to save task memory: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conductor::test_support::{assign, registry_of, ScriptedLLM};
    use crate::llm::{Completion, MessageRole};

    fn config(max_iterations: usize) -> OrchestratorConfig {
        OrchestratorConfig {
            max_iterations,
            ..OrchestratorConfig::default()
        }
    }

    #[tokio::test]
    async fn test_direct_answer_single_pass() {
        let llm = ScriptedLLM::new(vec![
            Completion::text("4"),
            Completion::text("The answer is 4."),
        ]);
        let registry = Arc::new(registry_of(&["code"]));
        let mut orchestrator = Orchestrator::new(llm.clone(), registry, &config(10));

        let response = orchestrator.run("what is 2+2").await.unwrap();

        assert!(response.success);
        assert_eq!(response.content, "The answer is 4.");
        assert_eq!(response.data, None);
        assert_eq!(llm.requests().len(), 2);
        assert_eq!(orchestrator.state(), LoopState::Done);
    }

    #[tokio::test]
    async fn test_memory_context_prefixes_second_run() {
        let llm = ScriptedLLM::new(vec![
            Completion::text("hi"),
            Completion::text("said hi"),
            Completion::text("again"),
            Completion::text("said again"),
        ]);
        let registry = Arc::new(registry_of(&["code"]));
        let mut orchestrator = Orchestrator::new(llm.clone(), registry, &config(10))
            .with_memory(TaskMemory::new(), 5);

        orchestrator.run("first").await.unwrap();
        orchestrator.run("second").await.unwrap();

        let second_plan = &llm.requests()[2];
        let user = second_plan
            .messages
            .iter()
            .find(|m| m.role == MessageRole::User)
            .unwrap();
        assert!(user.content.starts_with("Context:\n[task] Task: first"));
        assert!(user.content.ends_with("Current task: second"));
        assert_eq!(orchestrator.memory().unwrap().long_term().len(), 2);
    }

    #[tokio::test]
    async fn test_status_reports_plan() {
        let llm = ScriptedLLM::new(vec![
            Completion::with_calls("", vec![assign("c1", "code", "run")]),
            Completion::text("ran"),
        ]);
        let registry = Arc::new(registry_of(&["code"]));
        let mut orchestrator = Orchestrator::new(llm, registry, &config(3));
        orchestrator.run("run it").await.unwrap();

        let status = orchestrator.status();
        assert_eq!(status.plan_len, Some(1));
        assert_eq!(status.agents, vec!["code"]);
        assert!(status.to_string().contains("memory: disabled"));
    }
}

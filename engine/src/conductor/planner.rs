//! Conductor Planner
//!
//! Turns the current task into subtask assignments through a structured
//! model call. The model may only answer with `assign_task` tool calls (or
//! plain text when no worker is needed); anything else fails the iteration.

use crate::conductor::conversation::ConversationStore;
use crate::conductor::registry::WorkerRegistry;
use crate::conductor::types::SubtaskDescriptor;
use crate::llm::{CompletionOptions, LLMProvider, Message, ToolCall, ToolSchema};
use sdk::errors::EngineError;
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Version of the `assign_task` argument contract
pub const PLAN_SCHEMA_VERSION: u32 = 1;

/// Name of the planning tool
pub const ASSIGN_TASK: &str = "assign_task";

#[derive(Debug, Deserialize)]
struct AssignTaskArgs {
    agent: String,
    task: String,
    reason: String,
}

/// What one planning call produced
#[derive(Debug, Clone, PartialEq)]
pub struct PlanOutcome {
    /// Subtasks in the order the model emitted them
    pub subtasks: Vec<SubtaskDescriptor>,

    /// Text part of the assistant reply, the direct answer when no subtasks
    pub reply: String,
}

pub struct Planner {
    llm: Arc<dyn LLMProvider>,
    temperature: f32,
    timeout: Duration,
}

impl Planner {
    pub fn new(llm: Arc<dyn LLMProvider>, temperature: f32, timeout: Duration) -> Self {
        Self {
            llm,
            temperature,
            timeout,
        }
    }

    /// JSON schema of `assign_task`, with `tags` offered as the `agent` enum
    pub fn assign_task_schema(tags: &[String]) -> ToolSchema {
        ToolSchema {
            name: ASSIGN_TASK.to_string(),
            description: "Assign a subtask to a specialist agent".to_string(),
            parameters: json!({
                "type": "object",
                "properties": {
                    "agent": {
                        "type": "string",
                        "enum": tags,
                        "description": "The agent that should run the subtask"
                    },
                    "task": {
                        "type": "string",
                        "description": "Concrete description of the subtask"
                    },
                    "reason": {
                        "type": "string",
                        "description": "Why this agent was chosen"
                    }
                },
                "required": ["agent", "task", "reason"]
            }),
        }
    }

    /// Orchestrator system prompt listing the registered agents
    pub fn system_prompt(registry: &WorkerRegistry) -> String {
        let agents = registry
            .descriptions()
            .into_iter()
            .map(|(tag, description)| format!("- {}: {}", tag, description))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are a task orchestrator. Your job is to:\n\
            1. Analyze the user's task\n\
            2. Break it down into executable subtasks\n\
            3. Choose the right specialist agent for each subtask\n\
            4. Coordinate the agents' work\n\
            5. Summarize the results for the user\n\n\
            Available specialist agents:\n\
            {}\n\n\
            To assign a subtask, call the {} tool with:\n\
            - agent: the agent type to use\n\
            - task: a concrete description of the subtask\n\
            - reason: why this agent was chosen\n\n\
            If the task can be answered directly without any agent, reply directly.",
            agents, ASSIGN_TASK
        )
    }

    /// Run one planning call
    ///
    /// Appends `task` as a user message and the model's reply verbatim, then
    /// validates the reply's tool calls. A reply that does not fit the
    /// `assign_task` contract is a `PlanningFailure`.
    pub async fn plan(
        &self,
        task: &str,
        store: &mut ConversationStore,
        registry: &WorkerRegistry,
        iteration: usize,
        cancel: &CancellationToken,
    ) -> Result<PlanOutcome, EngineError> {
        store.append(Message::user(task));

        let tags = registry.tags();
        let tools = [Self::assign_task_schema(&tags)];
        let messages = store.with_system(&Self::system_prompt(registry));
        let options = CompletionOptions::new(self.temperature);

        debug!(
            iteration,
            messages = messages.len(),
            schema = PLAN_SCHEMA_VERSION,
            "Requesting plan"
        );

        let call = tokio::time::timeout(
            self.timeout,
            self.llm.complete(&messages, Some(&tools), options),
        );
        let completion = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            result = call => match result {
                Ok(Ok(completion)) => completion,
                Ok(Err(e)) => {
                    let cause = EngineError::from(e);
                    warn!(iteration, error = %cause, "Planner call failed");
                    return Err(EngineError::PlanningFailure {
                        iteration,
                        reason: cause.to_string(),
                    });
                }
                Err(_) => {
                    let cause = EngineError::LLMTimeout(self.timeout.as_secs());
                    warn!(iteration, "Planner call timed out");
                    return Err(EngineError::PlanningFailure {
                        iteration,
                        reason: cause.to_string(),
                    });
                }
            },
        };

        store.append(completion.to_message());

        let subtasks = parse_plan(&completion.tool_calls).map_err(|reason| {
            warn!(iteration, %reason, "Rejected plan");
            EngineError::PlanningFailure { iteration, reason }
        })?;

        info!(iteration, subtasks = subtasks.len(), "Plan generated");
        for s in &subtasks {
            debug!(id = %s.id, agent = %s.agent, reason = %s.reason, "Subtask planned");
        }

        Ok(PlanOutcome {
            subtasks,
            reply: completion.content,
        })
    }
}

/// Validate the shape of `assign_task` calls
///
/// Returns the first violation as text. Tags are not checked here; an
/// unregistered tag reaches the dispatcher and fails as a subtask.
pub fn parse_plan(calls: &[ToolCall]) -> Result<Vec<SubtaskDescriptor>, String> {
    let mut seen = HashSet::new();
    let mut subtasks = Vec::with_capacity(calls.len());

    for call in calls {
        if call.name != ASSIGN_TASK {
            return Err(format!("unknown function '{}'", call.name));
        }
        if call.id.is_empty() {
            return Err("tool call without id".to_string());
        }
        if !seen.insert(call.id.as_str()) {
            return Err(format!("duplicate tool call id '{}'", call.id));
        }

        let value: serde_json::Value = serde_json::from_str(&call.arguments)
            .map_err(|e| format!("arguments of call '{}' are not JSON: {}", call.id, e))?;
        if !value.is_object() {
            return Err(format!("arguments of call '{}' are not an object", call.id));
        }
        let args: AssignTaskArgs = serde_json::from_value(value)
            .map_err(|e| format!("invalid arguments in call '{}': {}", call.id, e))?;

        subtasks.push(SubtaskDescriptor {
            id: call.id.clone(),
            agent: args.agent,
            task: args.task,
            reason: args.reason,
        });
    }

    Ok(subtasks)
}

//! Conductor data model
//!
//! Plan and result records that flow between the planner, the dispatcher and
//! the orchestrator loop, plus the loop's explicit state machine.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One unit of work the planner assigns to a worker
///
/// `id` is the id of the model's tool call and is unique within one planning
/// round. It links the worker's tool message back to that call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskDescriptor {
    pub id: String,
    pub agent: String,
    pub task: String,
    pub reason: String,
}

/// What a subtask produced: worker output on success, error text otherwise
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubtaskOutcome {
    Output(String),
    Error(String),
}

impl SubtaskOutcome {
    pub fn text(&self) -> &str {
        match self {
            SubtaskOutcome::Output(text) | SubtaskOutcome::Error(text) => text,
        }
    }
}

/// Result of dispatching one subtask
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubtaskResult {
    pub id: String,
    pub agent: String,
    pub task: String,
    pub success: bool,
    pub outcome: SubtaskOutcome,
}

impl SubtaskResult {
    pub fn succeeded(descriptor: &SubtaskDescriptor, output: impl Into<String>) -> Self {
        Self {
            id: descriptor.id.clone(),
            agent: descriptor.agent.clone(),
            task: descriptor.task.clone(),
            success: true,
            outcome: SubtaskOutcome::Output(output.into()),
        }
    }

    pub fn failed(descriptor: &SubtaskDescriptor, error: impl Into<String>) -> Self {
        Self {
            id: descriptor.id.clone(),
            agent: descriptor.agent.clone(),
            task: descriptor.task.clone(),
            success: false,
            outcome: SubtaskOutcome::Error(error.into()),
        }
    }

    /// Output on success, error text on failure
    pub fn output_or_error(&self) -> &str {
        self.outcome.text()
    }
}

/// Ordered results of one dispatch round
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DispatchRound {
    pub results: Vec<SubtaskResult>,
}

impl DispatchRound {
    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Fraction of subtasks that succeeded, 0.0 for an empty round
    pub fn success_rate(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        let successes = self.results.iter().filter(|r| r.success).count();
        successes as f64 / self.results.len() as f64
    }

    /// Success of the last subtask in the round
    pub fn last_success(&self) -> Option<bool> {
        self.results.last().map(|r| r.success)
    }

    /// True when the round is non-empty and every subtask succeeded
    pub fn all_succeeded(&self) -> bool {
        !self.results.is_empty() && self.results.iter().all(|r| r.success)
    }

    /// Human-readable per-subtask report
    pub fn report(&self) -> String {
        self.results
            .iter()
            .map(|r| {
                let status = if r.success { "OK" } else { "FAILED" };
                format!(
                    "{} [{}] {}\n{}",
                    status,
                    r.agent,
                    r.task,
                    r.output_or_error()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n---\n\n")
    }
}

/// Per-run state owned by the orchestrator loop
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub task: String,
    pub plan: Option<Vec<SubtaskDescriptor>>,
    pub iteration: usize,
}

impl RunState {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            plan: None,
            iteration: 0,
        }
    }

    pub fn plan_is_empty(&self) -> bool {
        self.plan.as_ref().map_or(true, Vec::is_empty)
    }
}

/// States of the orchestrator loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    RunStart,
    Planning,
    Dispatching,
    Observing,
    Continue,
    Done,
}

impl fmt::Display for LoopState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LoopState::RunStart => "run_start",
            LoopState::Planning => "planning",
            LoopState::Dispatching => "dispatching",
            LoopState::Observing => "observing",
            LoopState::Continue => "continue",
            LoopState::Done => "done",
        };
        f.write_str(name)
    }
}

/// Decides after each observation whether the loop stops
pub trait ContinuationPredicate: Send + Sync {
    /// Returns true when the run is finished
    ///
    /// `plan_was_empty` is true when the planner assigned no subtasks this
    /// iteration. `round_success` is the success flag of the iteration's
    /// dispatch outcome.
    fn should_stop(&self, round: &DispatchRound, round_success: bool, plan_was_empty: bool) -> bool;
}

/// Stops when the last subtask succeeded or nothing was planned
#[derive(Debug, Clone, Copy, Default)]
pub struct LastSubtaskPredicate;

impl ContinuationPredicate for LastSubtaskPredicate {
    fn should_stop(&self, _round: &DispatchRound, round_success: bool, plan_was_empty: bool) -> bool {
        plan_was_empty || round_success
    }
}

/// Stops only when every subtask succeeded or nothing was planned
#[derive(Debug, Clone, Copy, Default)]
pub struct AggregatePredicate;

impl ContinuationPredicate for AggregatePredicate {
    fn should_stop(&self, round: &DispatchRound, _round_success: bool, plan_was_empty: bool) -> bool {
        plan_was_empty || round.all_succeeded()
    }
}

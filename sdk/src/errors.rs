//! Error types and handling
//!
//! This module provides the error types used throughout the Pollex engine.
//! All errors implement the `PollexErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Propagation
//!
//! Errors fall into three groups:
//! - **Iteration-level** (`PlanningFailure`, `Cancelled`) abort the current run
//!   and reach the caller of the orchestrator. Model failures during planning,
//!   `LLMProvider` and `LLMTimeout`, are folded into `PlanningFailure`.
//! - **Subtask-level** (`WorkerNotFound`, `WorkerFault`, `WorkerTimeout`) are
//!   recorded as failed subtask results and never abort a dispatch round.
//! - **Observation** (`ObservationFailure`) degrades the final response to the
//!   raw dispatch report instead of losing the run's work.

use thiserror::Error;

/// Trait for Pollex error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait PollexErrorExt {
    /// Returns a user-friendly hint for the error
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors typically require a configuration change.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, PollexErrorExt};
///
/// let error = EngineError::WorkerNotFound("unknown".to_string());
/// assert_eq!(error.to_string(), "agent not found");
/// assert!(error.is_recoverable());
///
/// let fatal = EngineError::Config("bad log level".to_string());
/// assert!(!fatal.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    #[error("LLM call timed out after {0}s")]
    LLMTimeout(u64),

    // Orchestration errors
    #[error("Planning failed in iteration {iteration}: {reason}")]
    PlanningFailure { iteration: usize, reason: String },

    #[error("Observation failed: {0}")]
    ObservationFailure(String),

    #[error("Run cancelled")]
    Cancelled,

    // Dispatch errors
    /// Carries the unresolved tag; the message itself is fixed
    #[error("agent not found")]
    WorkerNotFound(String),

    #[error("Worker '{agent}' faulted on subtask {subtask_id}: {reason}")]
    WorkerFault {
        agent: String,
        subtask_id: String,
        reason: String,
    },

    #[error("Worker '{agent}' timed out on subtask {subtask_id} after {secs}s")]
    WorkerTimeout {
        agent: String,
        subtask_id: String,
        secs: u64,
    },

    // Tool errors
    #[error("Tool error: {0}")]
    ToolError(String),

    #[error("Path outside workspace: {0:?}")]
    PathOutsideWorkspace(std::path::PathBuf),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PollexErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",

            Self::LLMProvider(_) => "LLM provider unavailable. Check your API key and network",
            Self::LLMTimeout(_) => "LLM provider took too long to respond. Try again",

            Self::PlanningFailure { .. } => {
                "The model returned an invalid plan. Try rephrasing the task"
            }
            Self::ObservationFailure(_) => "Summary unavailable; raw subtask results returned",
            Self::Cancelled => "The run was cancelled",

            Self::WorkerNotFound(_) => "No worker is registered for this capability",
            Self::WorkerFault { .. } => "A worker failed while running a subtask",
            Self::WorkerTimeout { .. } => "A worker took too long. Increase worker_timeout_secs",

            Self::ToolError(_) => "Tool operation failed",
            Self::PathOutsideWorkspace(_) => "Operation must be within workspace",

            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

/// Convenience result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

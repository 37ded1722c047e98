//! Worker contract
//!
//! Every capability the orchestrator can dispatch to (code execution, browsing,
//! file manipulation, data analysis, ...) implements the `Worker` trait. The
//! orchestrator never looks inside a worker; it only sees `run` and the
//! `AgentResponse` it returns.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Uniform response returned by every worker invocation and by a full
/// orchestrator run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentResponse {
    /// Whether the work succeeded
    pub success: bool,

    /// Human-readable output
    pub content: String,

    /// Optional structured payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,

    /// Failure description when `success` is false
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentResponse {
    /// Create a successful response with text content
    pub fn success(content: impl Into<String>) -> Self {
        Self {
            success: true,
            content: content.into(),
            data: None,
            error: None,
        }
    }

    /// Create a failed response carrying an error description
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            content: String::new(),
            data: None,
            error: Some(error.into()),
        }
    }

    /// Attach a structured payload
    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Text describing the outcome: the content on success, otherwise the
    /// error (falling back to the content when no error was recorded).
    pub fn output_or_error(&self) -> &str {
        if self.success {
            &self.content
        } else {
            match self.error.as_deref() {
                Some(err) if !err.is_empty() => err,
                _ => &self.content,
            }
        }
    }
}

/// Trait that every worker capability must implement
///
/// Implementations report internal failures through
/// `AgentResponse { success: false, .. }` instead of panicking. A worker makes
/// no assumptions about how often it is invoked or in which order relative to
/// other workers.
#[async_trait]
pub trait Worker: Send + Sync {
    /// Short description advertised to the planner
    fn description(&self) -> &str;

    /// Run one natural-language task to completion
    async fn run(&self, task: &str) -> AgentResponse;
}

//! Conductor Dispatcher
//!
//! Runs a plan's subtasks one after another on their workers. Failures of a
//! single subtask (unknown tag, worker error, panic, timeout) become failed
//! results; they never abort the round. Cancellation does.

use crate::conductor::conversation::ConversationStore;
use crate::conductor::registry::WorkerRegistry;
use crate::conductor::types::{DispatchRound, SubtaskDescriptor, SubtaskResult};
use crate::llm::Message;
use futures::FutureExt;
use sdk::errors::EngineError;
use sdk::AgentResponse;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// First `limit` characters of `text`, never splitting a code point
pub fn truncate_chars(text: &str, limit: usize) -> &str {
    match text.char_indices().nth(limit) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Content of the tool message recorded for one subtask
pub fn tool_message_content(agent: &str, text: &str, limit: usize) -> String {
    format!("[{}] {}", agent, truncate_chars(text, limit))
}

pub struct Dispatcher {
    registry: Arc<WorkerRegistry>,
    worker_timeout: Duration,
    output_limit: usize,
}

impl Dispatcher {
    pub fn new(registry: Arc<WorkerRegistry>, worker_timeout: Duration, output_limit: usize) -> Self {
        Self {
            registry,
            worker_timeout,
            output_limit,
        }
    }

    /// Dispatch every subtask in order
    ///
    /// Appends one tool message per subtask, so the round always yields
    /// exactly `plan.len()` results unless the run is cancelled.
    pub async fn dispatch(
        &self,
        plan: &[SubtaskDescriptor],
        store: &mut ConversationStore,
        cancel: &CancellationToken,
    ) -> Result<DispatchRound, EngineError> {
        let mut round = DispatchRound::default();

        for (i, descriptor) in plan.iter().enumerate() {
            if cancel.is_cancelled() {
                return Err(EngineError::Cancelled);
            }

            info!(
                "Subtask {}/{} [{}]: {}",
                i + 1,
                plan.len(),
                descriptor.agent,
                truncate_chars(&descriptor.task, 50)
            );

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    warn!(id = %descriptor.id, "Dispatch cancelled mid-subtask");
                    return Err(EngineError::Cancelled);
                }
                result = self.invoke(descriptor) => result,
            };

            store.append(Message::tool_result(
                tool_message_content(&result.agent, result.output_or_error(), self.output_limit),
                &descriptor.id,
            ));
            round.results.push(result);
        }

        info!(
            "Dispatch round finished: {}/{} succeeded",
            round.results.iter().filter(|r| r.success).count(),
            round.len()
        );

        Ok(round)
    }

    async fn invoke(&self, descriptor: &SubtaskDescriptor) -> SubtaskResult {
        let worker = match self.registry.resolve(&descriptor.agent) {
            Ok(worker) => worker,
            Err(e) => {
                warn!(agent = %descriptor.agent, "No worker registered");
                return SubtaskResult::failed(descriptor, e.to_string());
            }
        };

        let start = Instant::now();
        let run = AssertUnwindSafe(worker.run(&descriptor.task)).catch_unwind();

        match tokio::time::timeout(self.worker_timeout, run).await {
            Ok(Ok(response)) => {
                debug!(
                    id = %descriptor.id,
                    success = response.success,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "Worker returned"
                );
                if response.success {
                    SubtaskResult::succeeded(descriptor, response.content)
                } else {
                    SubtaskResult::failed(descriptor, response.output_or_error())
                }
            }
            Ok(Err(panic)) => {
                let err = EngineError::WorkerFault {
                    agent: descriptor.agent.clone(),
                    subtask_id: descriptor.id.clone(),
                    reason: panic_message(panic.as_ref()),
                };
                warn!("{}", err);
                SubtaskResult::failed(descriptor, err.to_string())
            }
            Err(_) => {
                let err = EngineError::WorkerTimeout {
                    agent: descriptor.agent.clone(),
                    subtask_id: descriptor.id.clone(),
                    secs: self.worker_timeout.as_secs(),
                };
                warn!("{}", err);
                SubtaskResult::failed(descriptor, err.to_string())
            }
        }
    }
}

/// Outcome of a dispatch round as a single response
///
/// `success` follows the last subtask, `content` is the per-subtask report
/// and `data` holds the serialized results.
pub fn round_response(round: &DispatchRound) -> AgentResponse {
    let data = serde_json::to_value(&round.results).ok();
    AgentResponse {
        success: round.last_success().unwrap_or(false),
        content: round.report(),
        data,
        error: None,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("panicked: {}", s)
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("hello", 3), "hel");
        assert_eq!(truncate_chars("hi", 10), "hi");
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語");
        assert_eq!(truncate_chars("", 5), "");
    }

    #[test]
    fn test_tool_message_content_prefix() {
        let text = "x".repeat(1500);
        let content = tool_message_content("code", &text, 1000);
        assert!(content.starts_with("[code] "));
        assert_eq!(content.chars().count(), "[code] ".len() + 1000);
    }

    #[test]
    fn test_round_response_follows_last_subtask() {
        let d = |id: &str| SubtaskDescriptor {
            id: id.to_string(),
            agent: "file".to_string(),
            task: "t".to_string(),
            reason: "r".to_string(),
        };
        let round = DispatchRound {
            results: vec![
                SubtaskResult::failed(&d("a"), "nope"),
                SubtaskResult::succeeded(&d("b"), "ok"),
            ],
        };
        let response = round_response(&round);
        assert!(response.success);
        assert_eq!(response.data.unwrap().as_array().unwrap().len(), 2);
        assert!(!round_response(&DispatchRound::default()).success);
    }

    #[test]
    fn test_panic_message_extracts_text() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "panicked: boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "panicked: bang");
    }
}

//! Conductor Observer
//!
//! Asks the model for a user-facing summary of the conversation so far.

use crate::conductor::conversation::ConversationStore;
use crate::llm::{CompletionOptions, LLMProvider, Message};
use sdk::errors::EngineError;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Instruction appended before the summary call
pub const SUMMARY_INSTRUCTION: &str = "Based on the execution results above, give the user a concise and clear final reply. Include:\n\
1. What was accomplished\n\
2. Key results\n\
3. Anything that needs attention (if any)";

pub struct Observer {
    llm: Arc<dyn LLMProvider>,
    options: CompletionOptions,
    timeout: Duration,
}

impl Observer {
    pub fn new(
        llm: Arc<dyn LLMProvider>,
        temperature: f32,
        max_tokens: u32,
        timeout: Duration,
    ) -> Self {
        Self {
            llm,
            options: CompletionOptions::new(temperature).with_max_tokens(max_tokens),
            timeout,
        }
    }

    /// Produce the summary and record it as an assistant message
    ///
    /// Model errors and timeouts surface as `ObservationFailure`; the
    /// instruction message stays in the store either way.
    pub async fn observe(
        &self,
        store: &mut ConversationStore,
        system_prompt: &str,
        cancel: &CancellationToken,
    ) -> Result<String, EngineError> {
        store.append(Message::user(SUMMARY_INSTRUCTION));
        let messages = store.with_system(system_prompt);

        let call = tokio::time::timeout(self.timeout, self.llm.complete(&messages, None, self.options));
        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(EngineError::Cancelled),
            result = call => result,
        };

        let summary = match result {
            Ok(Ok(completion)) => completion.content,
            Ok(Err(e)) => {
                warn!(error = %e, "Summary call failed");
                return Err(EngineError::ObservationFailure(EngineError::from(e).to_string()));
            }
            Err(_) => {
                warn!("Summary call timed out");
                let cause = EngineError::LLMTimeout(self.timeout.as_secs());
                return Err(EngineError::ObservationFailure(cause.to_string()));
            }
        };

        store.append(Message::assistant(summary.clone()));
        debug!(chars = summary.len(), "Observation recorded");

        Ok(summary)
    }
}

//! Conversation Store
//!
//! Ordered, append-only message history shared by the planner and the
//! observer within one run. Cleared only at the start of a run.

use crate::llm::Message;

#[derive(Debug, Clone, Default)]
pub struct ConversationStore {
    messages: Vec<Message>,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// All messages in insertion order
    pub fn snapshot(&self) -> &[Message] {
        &self.messages
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Snapshot with `system` prepended, ready for a model call
    pub fn with_system(&self, system: &str) -> Vec<Message> {
        let mut out = Vec::with_capacity(self.messages.len() + 1);
        out.push(Message::system(system));
        out.extend(self.messages.iter().cloned());
        out
    }
}

//! Built-in tools available to workers
//!
//! Every tool describes itself with a JSON Schema so the model can call it,
//! and reports failures as `ToolOutput::error` so the model sees them.

pub mod filesystem;
pub mod python;
pub mod web;

pub use filesystem::{ListDirTool, ReadFileTool, WriteFileTool, WorkspaceFs};
pub use python::PythonTool;
pub use web::{FetchUrlTool, WebSearchTool};

use crate::llm::{ToolCall, ToolSchema};
use async_trait::async_trait;
use sdk::{ToolError, ToolInput, ToolOutput};
use std::sync::Arc;
use tracing::{debug, warn};

/// A function a worker's model may call
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    /// JSON Schema of the arguments object
    fn parameters(&self) -> serde_json::Value;

    fn schema(&self) -> ToolSchema {
        ToolSchema {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters(),
        }
    }

    async fn execute(&self, input: &ToolInput) -> ToolOutput;
}

/// Ordered set of tools owned by one worker
#[derive(Clone, Default)]
pub struct ToolSet {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, tool: impl Tool + 'static) -> Self {
        self.tools.push(Arc::new(tool));
        self
    }

    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.iter().map(|t| t.schema()).collect()
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute a model tool call
    ///
    /// Bad arguments and unknown tool names come back as error outputs.
    pub async fn dispatch(&self, call: &ToolCall) -> ToolOutput {
        debug!("Dispatching tool '{}' with args: {}", call.name, call.arguments);

        let Some(tool) = self.tools.iter().find(|t| t.name() == call.name) else {
            warn!("Unknown tool requested: {}", call.name);
            return ToolOutput::error(format!(
                "{}. Available tools: {}",
                ToolError::UnknownTool(call.name.clone()),
                self.names().join(", ")
            ));
        };

        match ToolInput::from_arguments(&call.name, &call.arguments) {
            Ok(input) => tool.execute(&input).await,
            Err(e) => e.into(),
        }
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

//! Code worker: writes and runs Python

use super::ToolWorker;
use crate::config::Config;
use crate::llm::LLMProvider;
use crate::tools::{PythonTool, ToolSet};
use std::sync::Arc;
use std::time::Duration;

pub const DESCRIPTION: &str = "Code generation and execution (Python)";

const PROMPT: &str = "You are a professional Python code agent. Your job is to:
1. Understand the user's programming request
2. Write high-quality Python code
3. Execute the code and return the result

You can run Python code with the execute_python tool.

Rules:
- Keep code concise and readable
- Include comments where they help
- Handle likely errors
- Only import the standard library or common packages (math, json, datetime, ...)
- Print the values you want to report

When you need to run code, call the execute_python tool.";

pub fn build(config: &Config, llm: Arc<dyn LLMProvider>) -> ToolWorker {
    let python = PythonTool::new(
        config.workers.python.clone(),
        config.core.workspace.clone(),
        Duration::from_secs(config.workers.python_timeout_secs),
    );
    ToolWorker::new("code", DESCRIPTION, PROMPT, llm, ToolSet::new().with(python))
}

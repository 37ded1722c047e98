//! Python Execution Tool
//!
//! Runs a snippet with `python3 -c` inside the workspace directory. The child
//! is killed if it outlives the timeout.

use super::Tool;
use async_trait::async_trait;
use sdk::{ToolInput, ToolOutput};
use serde_json::json;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct PythonTool {
    interpreter: String,
    work_dir: PathBuf,
    timeout: Duration,
}

impl PythonTool {
    pub fn new(interpreter: impl Into<String>, work_dir: PathBuf, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            work_dir,
            timeout,
        }
    }

    /// Run `code` and return stdout (with stderr appended when present)
    pub async fn run(&self, code: &str) -> Result<String, String> {
        info!("Executing Python snippet ({} chars)", code.len());

        let child = Command::new(&self.interpreter)
            .arg("-c")
            .arg(code)
            .current_dir(&self.work_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| format!("Failed to start {}: {}", self.interpreter, e))?;

        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => return Err(format!("Failed to collect output: {}", e)),
            Err(_) => {
                let msg = format!("Execution timed out after {} seconds", self.timeout.as_secs());
                warn!("{}", msg);
                return Err(msg);
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).trim_end().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim_end().to_string();

        if !output.status.success() {
            debug!("Python exited with {}", output.status);
            return Err(if stderr.is_empty() {
                format!("Process exited with {}", output.status)
            } else {
                stderr
            });
        }

        let mut text = stdout;
        if !stderr.is_empty() {
            text.push_str("\nStderr: ");
            text.push_str(&stderr);
        }
        if text.is_empty() {
            text = "Code executed successfully (no output)".to_string();
        }
        Ok(text)
    }
}

#[async_trait]
impl Tool for PythonTool {
    fn name(&self) -> &str {
        "execute_python"
    }

    fn description(&self) -> &str {
        "Execute Python code and return its output. Use print() to show results. \
        Useful for calculations, data processing and generating content."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "The Python code to execute"
                }
            },
            "required": ["code"]
        })
    }

    async fn execute(&self, input: &ToolInput) -> ToolOutput {
        let code = match input.param_str("code") {
            Ok(code) => code,
            Err(e) => return e.into(),
        };
        match self.run(&code).await {
            Ok(output) => ToolOutput::text(output),
            Err(e) => ToolOutput::error(e),
        }
    }
}

//! Tool input/output types

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Input to a tool invocation, decoded from the model's JSON arguments
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    pub name: String,
    pub params: HashMap<String, serde_json::Value>,
}

impl ToolInput {
    /// Create a new ToolInput with no parameters
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            params: HashMap::new(),
        }
    }

    /// Decode the JSON argument string of a model tool call.
    ///
    /// An empty string is treated as `{}`. Anything other than a JSON object
    /// is rejected.
    pub fn from_arguments(name: impl Into<String>, arguments: &str) -> Result<Self, ToolError> {
        let name = name.into();
        if arguments.trim().is_empty() {
            return Ok(Self::new(name));
        }
        let value: serde_json::Value = serde_json::from_str(arguments)
            .map_err(|e| ToolError::InvalidParameter(format!("arguments are not JSON: {}", e)))?;
        match value {
            serde_json::Value::Object(map) => Ok(Self {
                name,
                params: map.into_iter().collect(),
            }),
            other => Err(ToolError::InvalidParameter(format!(
                "arguments must be a JSON object, got {}",
                other
            ))),
        }
    }

    /// Add a parameter
    pub fn with_param(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.params.insert(key.into(), value);
        self
    }

    /// Get a string parameter
    pub fn param_str(&self, key: &str) -> Result<String, ToolError> {
        self.params
            .get(key)
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| ToolError::MissingParameter(key.to_string()))
    }

    /// Get an optional string parameter
    pub fn param_str_opt(&self, key: &str) -> Option<String> {
        self.params
            .get(key)
            .and_then(|v| v.as_str())
            .map(String::from)
    }

    /// Get an optional i64 parameter
    pub fn param_i64_opt(&self, key: &str) -> Option<i64> {
        self.params.get(key).and_then(|v| v.as_i64())
    }

    /// Get an optional bool parameter
    pub fn param_bool_opt(&self, key: &str) -> Option<bool> {
        self.params.get(key).and_then(|v| v.as_bool())
    }
}

/// Output from a tool invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub output: String,
    pub error: Option<String>,
}

impl ToolOutput {
    /// Create a successful output with text
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            success: true,
            output: text.into(),
            error: None,
        }
    }

    /// Create an error output
    pub fn error(error: impl Into<String>) -> Self {
        Self {
            success: false,
            output: String::new(),
            error: Some(error.into()),
        }
    }
}

impl fmt::Display for ToolOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.success {
            write!(f, "{}", self.output)
        } else {
            write!(f, "Error: {}", self.error.as_deref().unwrap_or("unknown"))
        }
    }
}

impl From<ToolError> for ToolOutput {
    fn from(err: ToolError) -> Self {
        ToolOutput::error(err.to_string())
    }
}

/// Tool-specific errors
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Missing parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),
}

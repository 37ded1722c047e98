//! Configuration management
//!
//! This module handles loading, validation, and management of the Pollex configuration.
//! Configuration is stored in TOML format at ~/.pollex/config.toml.
//!
//! # Configuration Sections
//!
//! - **core**: Workspace path, log level, verbosity
//! - **llm**: Chat-completions endpoint, model and sampling defaults
//! - **orchestrator**: Iteration budget, per-call temperatures and timeouts
//! - **workers**: Worker enablement flags and tool limits
//! - **memory**: Opt-in task memory that survives across runs
//!
//! # Path Expansion
//!
//! The configuration system automatically:
//! - Expands ~ to the user's home directory
//! - Creates the workspace directory if it doesn't exist
//! - Canonicalizes the workspace path
//!
//! # Examples
//!
//! ```no_run
//! use pollex_engine::config::Config;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = Config::load_or_create()?;
//! println!("Model: {}", config.llm.model);
//! println!("Max iterations: {}", config.orchestrator.max_iterations);
//! # Ok(())
//! # }
//! ```

use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Core engine settings
    #[serde(default)]
    pub core: CoreConfig,

    /// LLM provider configuration
    #[serde(default)]
    pub llm: LLMConfig,

    /// Orchestrator loop settings
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Worker enablement and tool limits
    #[serde(default)]
    pub workers: WorkersConfig,

    /// Task memory configuration
    #[serde(default)]
    pub memory: MemoryConfig,
}

/// Core engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CoreConfig {
    /// Workspace directory path (supports ~ expansion)
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,

    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Print per-iteration progress in the CLI
    #[serde(default = "default_true")]
    pub verbose: bool,
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// Base URL of an OpenAI-compatible chat-completions API
    #[serde(default = "default_llm_base_url")]
    pub base_url: String,

    /// Model name
    #[serde(default = "default_llm_model")]
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    /// Default sampling temperature for worker calls
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Default token bound for worker calls
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// HTTP request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

/// Orchestrator loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Hard cap on Planning→Dispatching→Observing passes per run
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Temperature of the structured planning call
    #[serde(default = "default_temperature")]
    pub planner_temperature: f32,

    /// Temperature of the summary call
    #[serde(default = "default_summary_temperature")]
    pub summary_temperature: f32,

    /// Token bound of the summary call
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,

    /// Maximum characters of worker output kept in a tool message
    #[serde(default = "default_tool_output_limit")]
    pub tool_output_limit: usize,

    /// Timeout of the planning call in seconds
    #[serde(default = "default_model_timeout")]
    pub planner_timeout_secs: u64,

    /// Timeout of the summary call in seconds
    #[serde(default = "default_model_timeout")]
    pub summarizer_timeout_secs: u64,

    /// Timeout of each worker invocation in seconds
    #[serde(default = "default_worker_timeout")]
    pub worker_timeout_secs: u64,
}

/// Worker enablement configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkersConfig {
    /// Enable the Python code worker
    #[serde(default = "default_true")]
    pub code: bool,

    /// Enable the web browsing worker
    #[serde(default = "default_true")]
    pub browser: bool,

    /// Enable the file worker
    #[serde(default = "default_true")]
    pub file: bool,

    /// Enable the data analysis worker
    #[serde(default = "default_true")]
    pub data: bool,

    /// Python interpreter used by the code and data workers
    #[serde(default = "default_python")]
    pub python: String,

    /// Timeout for one Python execution in seconds
    #[serde(default = "default_python_timeout")]
    pub python_timeout_secs: u64,

    /// Default maximum characters returned by fetch_url
    #[serde(default = "default_fetch_max_length")]
    pub fetch_max_length: usize,
}

/// Task memory configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    /// Feed recent task history into planning
    #[serde(default)]
    pub enabled: bool,

    /// JSON file holding long-term memory (supports ~ expansion)
    #[serde(default)]
    pub persist_path: Option<PathBuf>,

    /// Number of recent items rendered into the planner context
    #[serde(default = "default_context_limit")]
    pub context_limit: usize,
}

// Default value functions
fn default_workspace() -> PathBuf {
    PathBuf::from("./workspace")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_llm_base_url() -> String {
    "https://api.siliconflow.cn/v1".to_string()
}

fn default_llm_model() -> String {
    "Pro/deepseek-ai/DeepSeek-V3".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_request_timeout() -> u64 {
    300
}

fn default_max_iterations() -> usize {
    10
}

fn default_summary_temperature() -> f32 {
    0.3
}

fn default_summary_max_tokens() -> u32 {
    1000
}

fn default_tool_output_limit() -> usize {
    1000
}

fn default_model_timeout() -> u64 {
    120
}

fn default_worker_timeout() -> u64 {
    300
}

fn default_python() -> String {
    "python3".to_string()
}

fn default_python_timeout() -> u64 {
    30
}

fn default_fetch_max_length() -> usize {
    5000
}

fn default_context_limit() -> usize {
    5
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            workspace: default_workspace(),
            log_level: default_log_level(),
            verbose: true,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            base_url: default_llm_base_url(),
            model: default_llm_model(),
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            planner_temperature: default_temperature(),
            summary_temperature: default_summary_temperature(),
            summary_max_tokens: default_summary_max_tokens(),
            tool_output_limit: default_tool_output_limit(),
            planner_timeout_secs: default_model_timeout(),
            summarizer_timeout_secs: default_model_timeout(),
            worker_timeout_secs: default_worker_timeout(),
        }
    }
}

impl Default for WorkersConfig {
    fn default() -> Self {
        Self {
            code: true,
            browser: true,
            file: true,
            data: true,
            python: default_python(),
            python_timeout_secs: default_python_timeout(),
            fetch_max_length: default_fetch_max_length(),
        }
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            persist_path: None,
            context_limit: default_context_limit(),
        }
    }
}

impl LLMConfig {
    /// Read the API key from the configured environment variable
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` when the variable is unset or empty.
    pub fn api_key(&self) -> Result<String, EngineError> {
        match std::env::var(&self.api_key_env) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(EngineError::Config(format!(
                "No LLM API key configured. Set the {} environment variable",
                self.api_key_env
            ))),
        }
    }
}

impl Config {
    /// Load configuration from the default location (~/.pollex/config.toml)
    ///
    /// If the configuration file doesn't exist, creates a default configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration file cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    pub fn load_or_create() -> Result<Self, EngineError> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load_from_path(&config_path)
        } else {
            Self::create_default(&config_path)
        }
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| EngineError::Config(format!("Failed to read config file: {}", e)))?;

        let mut config = Self::parse(&contents)?;
        config.validate_and_process()?;

        Ok(config)
    }

    /// Parse and validate configuration text without touching the filesystem
    pub fn parse(contents: &str) -> Result<Self, EngineError> {
        let config: Config = toml::from_str(contents)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Create default configuration and save to path
    fn create_default(path: &Path) -> Result<Self, EngineError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                EngineError::Config(format!("Failed to create config directory: {}", e))
            })?;
        }

        let mut config = Self::default();

        let toml_string = toml::to_string_pretty(&config)
            .map_err(|e| EngineError::Config(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string)
            .map_err(|e| EngineError::Config(format!("Failed to write config file: {}", e)))?;

        config.validate_and_process()?;

        Ok(config)
    }

    /// Get the default configuration file path (~/.pollex/config.toml)
    pub fn default_config_path() -> Result<PathBuf, EngineError> {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(".pollex").join("config.toml"))
    }

    /// Validate field ranges
    ///
    /// # Errors
    ///
    /// Returns `EngineError::Config` naming the offending field.
    pub fn validate(&self) -> Result<(), EngineError> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.core.log_level.as_str()) {
            return Err(EngineError::Config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.core.log_level,
                valid_log_levels.join(", ")
            )));
        }

        if self.llm.base_url.trim().is_empty() {
            return Err(EngineError::Config("llm.base_url must not be empty".to_string()));
        }
        if self.llm.model.trim().is_empty() {
            return Err(EngineError::Config("llm.model must not be empty".to_string()));
        }

        let temperatures = [
            ("llm.temperature", self.llm.temperature),
            ("orchestrator.planner_temperature", self.orchestrator.planner_temperature),
            ("orchestrator.summary_temperature", self.orchestrator.summary_temperature),
        ];
        for (name, value) in temperatures {
            if !(0.0..=2.0).contains(&value) {
                return Err(EngineError::Config(format!(
                    "{} must be between 0.0 and 2.0",
                    name
                )));
            }
        }

        if self.orchestrator.max_iterations == 0 {
            return Err(EngineError::Config(
                "orchestrator.max_iterations must be at least 1".to_string(),
            ));
        }
        if self.orchestrator.tool_output_limit == 0 {
            return Err(EngineError::Config(
                "orchestrator.tool_output_limit must be at least 1".to_string(),
            ));
        }

        let timeouts = [
            ("orchestrator.planner_timeout_secs", self.orchestrator.planner_timeout_secs),
            ("orchestrator.summarizer_timeout_secs", self.orchestrator.summarizer_timeout_secs),
            ("orchestrator.worker_timeout_secs", self.orchestrator.worker_timeout_secs),
            ("workers.python_timeout_secs", self.workers.python_timeout_secs),
        ];
        for (name, value) in timeouts {
            if value == 0 {
                return Err(EngineError::Config(format!("{} must be at least 1", name)));
            }
        }

        Ok(())
    }

    /// Validate and process configuration
    ///
    /// This method:
    /// - Validates field ranges
    /// - Expands ~ in paths
    /// - Creates and canonicalizes the workspace
    fn validate_and_process(&mut self) -> Result<(), EngineError> {
        self.validate()?;

        self.core.workspace = expand_path(&self.core.workspace)?;
        self.core.workspace = canonicalize_or_create(&self.core.workspace)?;

        if !self.core.workspace.is_dir() {
            return Err(EngineError::Config(format!(
                "Workspace path is not a directory: {:?}",
                self.core.workspace
            )));
        }

        if let Some(path) = self.memory.persist_path.as_ref() {
            self.memory.persist_path = Some(expand_path(path)?);
        }

        Ok(())
    }
}

/// Expand ~ in path to user's home directory
fn expand_path(path: &Path) -> Result<PathBuf, EngineError> {
    let path_str = path
        .to_str()
        .ok_or_else(|| EngineError::Config("Invalid UTF-8 in path".to_string()))?;

    if let Some(rest) = path_str.strip_prefix("~/") {
        let home = dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))?;

        Ok(home.join(rest))
    } else if path_str == "~" {
        dirs::home_dir()
            .ok_or_else(|| EngineError::Config("Could not determine home directory".to_string()))
    } else {
        Ok(path.to_path_buf())
    }
}

/// Canonicalize path, creating it if it doesn't exist
fn canonicalize_or_create(path: &Path) -> Result<PathBuf, EngineError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| {
            EngineError::Config(format!("Failed to create directory {:?}: {}", path, e))
        })?;
    }

    path.canonicalize().map_err(|e| {
        EngineError::Config(format!("Failed to resolve directory {:?}: {}", path, e))
    })
}

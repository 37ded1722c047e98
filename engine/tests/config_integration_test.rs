//! Integration tests for configuration management
//!
//! Loads real files from a temporary directory, including workspace
//! creation and canonicalization.

use pollex_engine::config::Config;
use sdk::errors::EngineError;
use std::fs;
use tempfile::TempDir;

fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
    let path = dir.path().join("config.toml");
    fs::write(&path, body).unwrap();
    path
}

#[test]
fn test_load_full_config_creates_workspace() {
    let dir = TempDir::new().unwrap();
    let workspace = dir.path().join("ws").join("nested");
    let path = write_config(
        &dir,
        &format!(
            r#"
[core]
workspace = "{}"
log_level = "debug"

[llm]
base_url = "http://localhost:8000/v1"
model = "local-model"
api_key_env = "LOCAL_KEY"
temperature = 0.2

[orchestrator]
max_iterations = 4
tool_output_limit = 200
worker_timeout_secs = 60

[workers]
browser = false
python = "/usr/bin/python3"

[memory]
enabled = true
context_limit = 3
"#,
            workspace.display()
        ),
    );

    let config = Config::load_from_path(&path).unwrap();

    assert!(workspace.is_dir());
    assert_eq!(config.core.workspace, workspace.canonicalize().unwrap());
    assert_eq!(config.core.log_level, "debug");
    assert_eq!(config.llm.base_url, "http://localhost:8000/v1");
    assert_eq!(config.llm.api_key_env, "LOCAL_KEY");
    assert_eq!(config.orchestrator.max_iterations, 4);
    assert_eq!(config.orchestrator.tool_output_limit, 200);
    assert_eq!(config.orchestrator.worker_timeout_secs, 60);
    // untouched keys keep their defaults
    assert_eq!(config.orchestrator.planner_timeout_secs, 120);
    assert!((config.orchestrator.summary_temperature - 0.3).abs() < f32::EPSILON);
    assert!(!config.workers.browser);
    assert!(config.workers.code);
    assert_eq!(config.workers.python, "/usr/bin/python3");
    assert!(config.memory.enabled);
    assert_eq!(config.memory.context_limit, 3);
    assert_eq!(config.memory.persist_path, None);
}

#[test]
fn test_sparse_config_uses_defaults() {
    let dir = TempDir::new().unwrap();
    let workspace = dir.path().join("ws");
    let path = write_config(
        &dir,
        &format!("[core]\nworkspace = \"{}\"\n", workspace.display()),
    );

    let config = Config::load_from_path(&path).unwrap();

    assert_eq!(config.llm.model, "Pro/deepseek-ai/DeepSeek-V3");
    assert_eq!(config.orchestrator.max_iterations, 10);
    assert_eq!(config.orchestrator.tool_output_limit, 1000);
    assert!(!config.memory.enabled);
}

#[test]
fn test_invalid_values_are_rejected() {
    let cases = [
        ("[core]\nlog_level = \"loud\"\n", "log level"),
        ("[orchestrator]\nmax_iterations = 0\n", "max_iterations"),
        ("[orchestrator]\nplanner_temperature = 3.5\n", "planner_temperature"),
        ("[orchestrator]\nworker_timeout_secs = 0\n", "worker_timeout_secs"),
        ("[llm]\nmodel = \"  \"\n", "llm.model"),
    ];

    for (body, needle) in cases {
        let dir = TempDir::new().unwrap();
        let path = write_config(&dir, body);
        match Config::load_from_path(&path) {
            Err(EngineError::Config(msg)) => {
                assert!(msg.contains(needle), "{:?} did not mention {}", msg, needle)
            }
            other => panic!("expected config error for {:?}, got {:?}", body, other),
        }
    }
}

#[test]
fn test_malformed_toml_is_config_error() {
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "[orchestrator\nmax_iterations = ");

    let err = Config::load_from_path(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse config"));
}

#[test]
fn test_missing_file_is_config_error() {
    let dir = TempDir::new().unwrap();
    let err = Config::load_from_path(&dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, EngineError::Config(_)));
}

#[test]
fn test_default_config_round_trips_through_toml() {
    let text = toml::to_string_pretty(&Config::default()).unwrap();
    let parsed = Config::parse(&text).unwrap();

    assert_eq!(parsed.llm.model, Config::default().llm.model);
    assert_eq!(
        parsed.orchestrator.max_iterations,
        Config::default().orchestrator.max_iterations
    );
}

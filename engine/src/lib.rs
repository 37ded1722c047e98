//! Pollex Engine Library
//!
//! Core of the Pollex orchestrator. Used by the `pollex` binary and by the
//! integration tests.

/// Configuration management module
pub mod config;

/// LLM provider abstraction layer
pub mod llm;

/// Plan, dispatch and observe loop
pub mod conductor;

/// Built-in tools used by workers
pub mod tools;

/// Specialist workers
pub mod workers;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;

//! Pollex SDK
//!
//! Shared library providing the worker contract, tool I/O types and the
//! engine error taxonomy. This crate is used by the engine and by any
//! out-of-tree worker implementation.

/// Error types and handling
pub mod errors;

/// Tool input/output types
pub mod types;

/// Worker contract
pub mod worker;

// Re-export commonly used types
pub use errors::{EngineError, PollexErrorExt};
pub use types::{ToolError, ToolInput, ToolOutput};
pub use worker::{AgentResponse, Worker};

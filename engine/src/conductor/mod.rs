//! Conductor System
//!
//! Plan → dispatch → observe loop over a shared conversation store.

pub mod conversation;
pub mod dispatcher;
pub mod memory;
pub mod observer;
pub mod orchestrator;
pub mod planner;
pub mod registry;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use conversation::ConversationStore;
pub use dispatcher::Dispatcher;
pub use memory::{MemoryKind, TaskMemory};
pub use observer::Observer;
pub use orchestrator::{Orchestrator, OrchestratorStatus};
pub use planner::{Planner, PLAN_SCHEMA_VERSION};
pub use registry::{WorkerRegistry, WorkerRegistryBuilder};
pub use types::{
    AggregatePredicate, ContinuationPredicate, DispatchRound, LastSubtaskPredicate, LoopState,
    RunState, SubtaskDescriptor, SubtaskOutcome, SubtaskResult,
};

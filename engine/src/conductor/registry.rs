//! Worker registry
//!
//! Maps capability tags to workers. Built once through [`WorkerRegistryBuilder`]
//! and immutable afterwards, so it can be shared behind an `Arc`.

use sdk::errors::EngineError;
use sdk::Worker;
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Clone, Default)]
pub struct WorkerRegistry {
    workers: BTreeMap<String, Arc<dyn Worker>>,
}

impl WorkerRegistry {
    pub fn builder() -> WorkerRegistryBuilder {
        WorkerRegistryBuilder::default()
    }

    pub fn get(&self, tag: &str) -> Option<Arc<dyn Worker>> {
        self.workers.get(tag).cloned()
    }

    /// Like [`get`](Self::get) but with a typed error for unknown tags
    pub fn resolve(&self, tag: &str) -> Result<Arc<dyn Worker>, EngineError> {
        self.get(tag)
            .ok_or_else(|| EngineError::WorkerNotFound(tag.to_string()))
    }

    /// Registered tags in sorted order
    pub fn tags(&self) -> Vec<String> {
        self.workers.keys().cloned().collect()
    }

    /// `(tag, description)` pairs in sorted order
    pub fn descriptions(&self) -> Vec<(String, String)> {
        self.workers
            .iter()
            .map(|(tag, w)| (tag.clone(), w.description().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }
}

impl std::fmt::Debug for WorkerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerRegistry")
            .field("tags", &self.tags())
            .finish()
    }
}

#[derive(Default)]
pub struct WorkerRegistryBuilder {
    workers: BTreeMap<String, Arc<dyn Worker>>,
}

impl WorkerRegistryBuilder {
    /// Register a worker under `tag`, replacing any previous one
    pub fn register(mut self, tag: impl Into<String>, worker: Arc<dyn Worker>) -> Self {
        self.workers.insert(tag.into(), worker);
        self
    }

    pub fn build(self) -> WorkerRegistry {
        WorkerRegistry {
            workers: self.workers,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use sdk::AgentResponse;

    struct Named(&'static str);

    #[async_trait]
    impl Worker for Named {
        fn description(&self) -> &str {
            self.0
        }

        async fn run(&self, _task: &str) -> AgentResponse {
            AgentResponse::success(self.0)
        }
    }

    #[test]
    fn test_tags_are_sorted() {
        let registry = WorkerRegistry::builder()
            .register("file", Arc::new(Named("files")))
            .register("browser", Arc::new(Named("web")))
            .register("code", Arc::new(Named("python")))
            .build();

        assert_eq!(registry.tags(), vec!["browser", "code", "file"]);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_resolve_unknown_tag() {
        let registry = WorkerRegistry::builder().build();
        let err = registry.resolve("ghost").err().unwrap();
        assert!(matches!(err, EngineError::WorkerNotFound(ref t) if t == "ghost"));
        assert_eq!(err.to_string(), "agent not found");
    }
}

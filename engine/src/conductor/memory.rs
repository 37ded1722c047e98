//! Task Memory
//!
//! Cross-run memory, separate from the per-run conversation store.
//!
//! - **Short-term**: recent items in arrival order, oldest evicted first
//! - **Long-term**: scored items, least important evicted first; this part
//!   can be persisted to a JSON file
//!
//! The orchestrator only consults it when `memory.enabled` is set.

use chrono::{DateTime, Utc};
use sdk::errors::EngineError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const SHORT_TERM_LIMIT: usize = 50;
pub const LONG_TERM_LIMIT: usize = 200;
pub const DEFAULT_IMPORTANCE: f32 = 0.5;

/// Kind of a memory item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryKind {
    Task,
    Result,
    Observation,
    Context,
}

impl std::fmt::Display for MemoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MemoryKind::Task => "task",
            MemoryKind::Result => "result",
            MemoryKind::Observation => "observation",
            MemoryKind::Context => "context",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryItem {
    pub content: String,
    pub timestamp: DateTime<Utc>,
    #[serde(rename = "type")]
    pub kind: MemoryKind,
    #[serde(default)]
    pub metadata: HashMap<String, Value>,
    #[serde(default = "default_importance")]
    pub importance: f32,
}

fn default_importance() -> f32 {
    DEFAULT_IMPORTANCE
}

impl MemoryItem {
    pub fn new(content: impl Into<String>, kind: MemoryKind, importance: f32) -> Self {
        Self {
            content: content.into(),
            timestamp: Utc::now(),
            kind,
            metadata: HashMap::new(),
            importance: importance.clamp(0.0, 1.0),
        }
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PersistedMemory {
    #[serde(default)]
    long_term: Vec<MemoryItem>,
}

#[derive(Debug, Clone, Default)]
pub struct TaskMemory {
    short_term: Vec<MemoryItem>,
    long_term: Vec<MemoryItem>,
    persist_path: Option<PathBuf>,
}

impl TaskMemory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Memory backed by `path`, loading existing long-term items if present
    pub fn with_persistence(path: impl Into<PathBuf>) -> Result<Self, EngineError> {
        let path = path.into();
        let mut memory = Self {
            persist_path: Some(path.clone()),
            ..Self::default()
        };

        if path.exists() {
            let contents = fs::read_to_string(&path)?;
            let persisted: PersistedMemory = serde_json::from_str(&contents).map_err(|e| {
                EngineError::Config(format!("Corrupt memory file {:?}: {}", path, e))
            })?;
            memory.long_term = persisted.long_term;
            debug!(items = memory.long_term.len(), "Loaded long-term memory");
        }

        Ok(memory)
    }

    pub fn add_short_term(&mut self, content: impl Into<String>, kind: MemoryKind) {
        self.short_term
            .push(MemoryItem::new(content, kind, DEFAULT_IMPORTANCE));
        if self.short_term.len() > SHORT_TERM_LIMIT {
            self.short_term.remove(0);
        }
    }

    pub fn add_long_term(&mut self, content: impl Into<String>, kind: MemoryKind, importance: f32) {
        self.long_term.push(MemoryItem::new(content, kind, importance));
        if self.long_term.len() > LONG_TERM_LIMIT {
            // Ties go to the oldest item
            if let Some(idx) = self
                .long_term
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| a.importance.total_cmp(&b.importance))
                .map(|(idx, _)| idx)
            {
                self.long_term.remove(idx);
            }
        }
    }

    /// The last `limit` short-term items as `[kind] content` lines
    pub fn context(&self, limit: usize) -> String {
        let start = self.short_term.len().saturating_sub(limit);
        self.short_term[start..]
            .iter()
            .map(|item| format!("[{}] {}", item.kind, item.content))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Items sharing words with `query`, best match first
    ///
    /// Score is the number of query words found in the item, weighted by
    /// importance.
    pub fn relevant(&self, query: &str, limit: usize) -> Vec<&MemoryItem> {
        let words: Vec<String> = query.to_lowercase().split_whitespace().map(String::from).collect();

        let mut scored: Vec<(f32, &MemoryItem)> = self
            .short_term
            .iter()
            .chain(self.long_term.iter())
            .filter_map(|item| {
                let content = item.content.to_lowercase();
                let hits = words.iter().filter(|w| content.contains(w.as_str())).count();
                (hits > 0).then(|| (hits as f32 * item.importance, item))
            })
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0));
        scored.into_iter().take(limit).map(|(_, item)| item).collect()
    }

    pub fn short_term(&self) -> &[MemoryItem] {
        &self.short_term
    }

    pub fn long_term(&self) -> &[MemoryItem] {
        &self.long_term
    }

    pub fn clear_short_term(&mut self) {
        self.short_term.clear();
    }

    pub fn persist_path(&self) -> Option<&Path> {
        self.persist_path.as_deref()
    }

    /// Write long-term items to the persistence file, if one is configured
    pub fn save(&self) -> Result<(), EngineError> {
        let Some(path) = self.persist_path.as_ref() else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let persisted = PersistedMemory {
            long_term: self.long_term.clone(),
        };
        let json = serde_json::to_string_pretty(&persisted)
            .map_err(|e| EngineError::Config(format!("Failed to serialize memory: {}", e)))?;
        fs::write(path, json)?;

        debug!(items = self.long_term.len(), path = ?path, "Saved long-term memory");
        Ok(())
    }

    pub fn summary(&self) -> String {
        format!(
            "memory: short-term={}, long-term={}",
            self.short_term.len(),
            self.long_term.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_term_evicts_oldest() {
        let mut memory = TaskMemory::new();
        for i in 0..SHORT_TERM_LIMIT + 3 {
            memory.add_short_term(format!("item {}", i), MemoryKind::Task);
        }
        assert_eq!(memory.short_term().len(), SHORT_TERM_LIMIT);
        assert_eq!(memory.short_term()[0].content, "item 3");
    }

    #[test]
    fn test_long_term_evicts_least_important() {
        let mut memory = TaskMemory::new();
        memory.add_long_term("keep me", MemoryKind::Observation, 0.9);
        memory.add_long_term("drop me", MemoryKind::Observation, 0.1);
        for i in 0..LONG_TERM_LIMIT - 1 {
            memory.add_long_term(format!("filler {}", i), MemoryKind::Context, 0.5);
        }
        assert_eq!(memory.long_term().len(), LONG_TERM_LIMIT);
        assert!(memory.long_term().iter().any(|i| i.content == "keep me"));
        assert!(!memory.long_term().iter().any(|i| i.content == "drop me"));
    }

    #[test]
    fn test_context_renders_recent_items() {
        let mut memory = TaskMemory::new();
        memory.add_short_term("Task: a", MemoryKind::Task);
        memory.add_short_term("Execution result: success", MemoryKind::Result);
        memory.add_short_term("Task: b", MemoryKind::Task);

        assert_eq!(
            memory.context(2),
            "[result] Execution result: success\n[task] Task: b"
        );
        assert_eq!(TaskMemory::new().context(5), "");
    }

    #[test]
    fn test_relevant_ranks_by_hits_and_importance() {
        let mut memory = TaskMemory::new();
        memory.add_long_term("rust async runtime", MemoryKind::Observation, 0.9);
        memory.add_long_term("rust", MemoryKind::Observation, 0.2);
        memory.add_long_term("python", MemoryKind::Observation, 1.0);

        let hits = memory.relevant("Rust async", 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].content, "rust async runtime");
    }

    #[test]
    fn test_persistence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("memory.json");

        let mut memory = TaskMemory::with_persistence(&path).unwrap();
        memory.add_long_term("Task: x\nResult: y", MemoryKind::Observation, 0.7);
        memory.add_short_term("not persisted", MemoryKind::Task);
        memory.save().unwrap();

        let reloaded = TaskMemory::with_persistence(&path).unwrap();
        assert_eq!(reloaded.long_term().len(), 1);
        assert_eq!(reloaded.long_term()[0].importance, 0.7);
        assert!(reloaded.short_term().is_empty());
    }
}

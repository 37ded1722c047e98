//! Filesystem Tools
//!
//! `read_file`, `write_file` and `list_dir`, confined to the workspace.
//! Relative paths resolve against the workspace root. Every path is
//! canonicalized before I/O so `..` segments and symlinks cannot escape.

use super::Tool;
use async_trait::async_trait;
use sdk::errors::EngineError;
use sdk::{ToolInput, ToolOutput};
use serde_json::json;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tracing::{debug, info, warn};

const MAX_LISTING_ENTRIES: usize = 1000;

/// Workspace-confined file access shared by the file tools
#[derive(Debug)]
pub struct WorkspaceFs {
    workspace: PathBuf,
}

impl WorkspaceFs {
    pub fn new(workspace: impl AsRef<Path>) -> Result<Self, EngineError> {
        let workspace = workspace.as_ref().canonicalize()?;
        Ok(Self { workspace })
    }

    pub fn workspace(&self) -> &Path {
        &self.workspace
    }

    fn absolute(&self, path: &str) -> PathBuf {
        let target = Path::new(path);
        if target.is_absolute() {
            target.to_path_buf()
        } else {
            self.workspace.join(target)
        }
    }

    /// Resolve an existing path and check it stays inside the workspace
    pub fn resolve_existing(&self, path: &str) -> Result<PathBuf, EngineError> {
        let abs = self.absolute(path);
        let canonical = abs
            .canonicalize()
            .map_err(|e| EngineError::ToolError(format!("Failed to resolve {}: {}", path, e)))?;

        if !canonical.starts_with(&self.workspace) {
            warn!("Path outside workspace: {}", canonical.display());
            return Err(EngineError::PathOutsideWorkspace(canonical));
        }
        Ok(canonical)
    }

    /// Resolve a path that may not exist yet
    ///
    /// Checked lexically first so no directory outside the workspace is
    /// ever created, then again after the parent is canonicalized.
    pub fn resolve_new(&self, path: &str) -> Result<PathBuf, EngineError> {
        let abs = normalize_lexically(&self.absolute(path));
        if !abs.starts_with(&self.workspace) {
            return Err(EngineError::PathOutsideWorkspace(abs));
        }
        if abs.exists() {
            return self.resolve_existing(path);
        }

        let file_name = abs
            .file_name()
            .ok_or_else(|| EngineError::ToolError(format!("Not a file path: {}", path)))?
            .to_owned();
        let parent = abs.parent().unwrap_or(self.workspace.as_path()).to_path_buf();

        std::fs::create_dir_all(&parent)?;
        let canonical_parent = parent.canonicalize()?;
        if !canonical_parent.starts_with(&self.workspace) {
            return Err(EngineError::PathOutsideWorkspace(canonical_parent));
        }

        Ok(canonical_parent.join(file_name))
    }

    pub async fn read_file(&self, path: &str) -> Result<String, EngineError> {
        let path = self.resolve_existing(path)?;
        info!("Reading file: {}", path.display());

        let content = fs::read_to_string(&path).await?;
        debug!("Read {} bytes from {}", content.len(), path.display());
        Ok(content)
    }

    pub async fn write_file(&self, path: &str, content: &str) -> Result<String, EngineError> {
        let path = self.resolve_new(path)?;
        info!("Writing {} bytes to: {}", content.len(), path.display());

        fs::write(&path, content).await?;
        Ok(format!("Wrote {} bytes to {}", content.len(), path.display()))
    }

    pub async fn list_dir(&self, path: &str, recursive: bool) -> Result<String, EngineError> {
        let root = self.resolve_existing(path)?;
        info!("Listing directory: {} (recursive: {})", root.display(), recursive);

        let mut lines = Vec::new();
        let mut pending = vec![root.clone()];
        let mut truncated = false;

        while let Some(dir) = pending.pop() {
            let mut entries = fs::read_dir(&dir).await?;
            let mut batch = Vec::new();

            while let Some(entry) = entries.next_entry().await? {
                let entry_path = entry.path();
                let rel = entry_path
                    .strip_prefix(&root)
                    .unwrap_or(&entry_path)
                    .display()
                    .to_string();
                let ft = entry.file_type().await?;

                if ft.is_dir() {
                    batch.push(format!("d  {}/", rel));
                    if recursive {
                        pending.push(entry_path);
                    }
                } else if ft.is_symlink() {
                    batch.push(format!("l  {}", rel));
                } else {
                    let size = entry.metadata().await.map(|m| m.len()).unwrap_or(0);
                    batch.push(format!("f  {:>8}  {}", format_size(size), rel));
                }
            }

            batch.sort();
            lines.extend(batch);
            if lines.len() >= MAX_LISTING_ENTRIES {
                lines.truncate(MAX_LISTING_ENTRIES);
                truncated = true;
                break;
            }
        }

        let mut out = Vec::with_capacity(lines.len() + 2);
        out.push(format!("{}/  ({} entries)", root.display(), lines.len()));
        out.extend(lines);
        if truncated {
            out.push("... (listing truncated)".to_string());
        }
        Ok(out.join("\n"))
    }
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Format a byte count into a human-readable size string.
fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

fn to_output(result: Result<String, EngineError>) -> ToolOutput {
    match result {
        Ok(text) => ToolOutput::text(text),
        Err(e) => ToolOutput::error(e.to_string()),
    }
}

pub struct ReadFileTool(pub Arc<WorkspaceFs>);
pub struct WriteFileTool(pub Arc<WorkspaceFs>);
pub struct ListDirTool(pub Arc<WorkspaceFs>);

#[async_trait]
impl Tool for ReadFileTool {
    fn name(&self) -> &str {
        "read_file"
    }

    fn description(&self) -> &str {
        "Read the contents of a file in the workspace."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "File path, relative to the workspace"}
            },
            "required": ["path"]
        })
    }

    async fn execute(&self, input: &ToolInput) -> ToolOutput {
        match input.param_str("path") {
            Ok(path) => to_output(self.0.read_file(&path).await),
            Err(e) => e.into(),
        }
    }
}

#[async_trait]
impl Tool for WriteFileTool {
    fn name(&self) -> &str {
        "write_file"
    }

    fn description(&self) -> &str {
        "Write content to a file in the workspace, creating parent directories as needed."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "File path, relative to the workspace"},
                "content": {"type": "string", "description": "Content to write"}
            },
            "required": ["path", "content"]
        })
    }

    async fn execute(&self, input: &ToolInput) -> ToolOutput {
        let path = match input.param_str("path") {
            Ok(p) => p,
            Err(e) => return e.into(),
        };
        let content = match input.param_str("content") {
            Ok(c) => c,
            Err(e) => return e.into(),
        };
        to_output(self.0.write_file(&path, &content).await)
    }
}

#[async_trait]
impl Tool for ListDirTool {
    fn name(&self) -> &str {
        "list_dir"
    }

    fn description(&self) -> &str {
        "List files and directories. Returns entries with type, size and name."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "path": {
                    "type": "string",
                    "description": "Directory path, defaults to the workspace root",
                    "default": "."
                },
                "recursive": {
                    "type": "boolean",
                    "description": "Include subdirectories",
                    "default": false
                }
            }
        })
    }

    async fn execute(&self, input: &ToolInput) -> ToolOutput {
        let path = input.param_str_opt("path").unwrap_or_else(|| ".".to_string());
        let recursive = input.param_bool_opt("recursive").unwrap_or(false);
        to_output(self.0.list_dir(&path, recursive).await)
    }
}

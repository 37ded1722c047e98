//! File worker: reads, writes and lists workspace files

use super::ToolWorker;
use crate::config::Config;
use crate::llm::LLMProvider;
use crate::tools::{ListDirTool, ReadFileTool, ToolSet, WorkspaceFs, WriteFileTool};
use sdk::errors::EngineError;
use std::sync::Arc;

pub const DESCRIPTION: &str = "File reading, writing and directory management";

const PROMPT: &str = "You are a file management agent. Your job is to:
1. Understand the user's file operation request
2. Read files, write files and inspect directories
3. Handle the file system safely

Available tools:
- read_file: read a file's content
- write_file: write a file
- list_dir: list a directory

Rules:
- Paths are relative to the workspace
- Confirm paths before operating on them
- Mention when a write overwrites existing content
- Explain errors clearly";

pub fn build(config: &Config, llm: Arc<dyn LLMProvider>) -> Result<ToolWorker, EngineError> {
    let fs = Arc::new(WorkspaceFs::new(&config.core.workspace)?);
    let tools = ToolSet::new()
        .with(ReadFileTool(fs.clone()))
        .with(WriteFileTool(fs.clone()))
        .with(ListDirTool(fs));
    Ok(ToolWorker::new("file", DESCRIPTION, PROMPT, llm, tools))
}

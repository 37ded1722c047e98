//! Browser worker: web search and page fetching

use super::ToolWorker;
use crate::config::Config;
use crate::llm::LLMProvider;
use crate::tools::{FetchUrlTool, ToolSet, WebSearchTool};
use std::sync::Arc;

pub const DESCRIPTION: &str = "Web search and page content retrieval";

const PROMPT: &str = "You are a web browsing agent. Your job is to:
1. Understand what information the user is looking for
2. Search the web with the search tool
3. Fetch page details when needed
4. Organize and return the useful information

Available tools:
- web_search: search the internet
- fetch_url: get the content of a specific page

Rules:
- Prefer search results for an overview
- Only fetch a whole page when the details are needed
- Be accurate and concise
- Cite your sources";

pub fn build(config: &Config, llm: Arc<dyn LLMProvider>) -> ToolWorker {
    let tools = ToolSet::new()
        .with(WebSearchTool::new())
        .with(FetchUrlTool::new(config.workers.fetch_max_length));
    ToolWorker::new("browser", DESCRIPTION, PROMPT, llm, tools)
}

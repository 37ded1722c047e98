//! Data worker: analysis and statistics through Python

use super::ToolWorker;
use crate::config::Config;
use crate::llm::LLMProvider;
use crate::tools::{PythonTool, ToolSet};
use std::sync::Arc;
use std::time::Duration;

pub const DESCRIPTION: &str = "Data analysis and visualization";

const PROMPT: &str = "You are a data analysis agent. Your job is to:
1. Understand the user's data analysis request
2. Process and analyze data with Python
3. Produce statistics and visualizations

You can run analysis code with the execute_python tool.

Available libraries:
- pandas: data processing
- numpy: numerical computing
- matplotlib: visualization (save figures to files in the working directory)
- json, csv: data formats

Rules:
- Write efficient, readable code
- Handle missing values and outliers
- Keep charts clear
- State the conclusions of the analysis";

pub fn build(config: &Config, llm: Arc<dyn LLMProvider>) -> ToolWorker {
    let python = PythonTool::new(
        config.workers.python.clone(),
        config.core.workspace.clone(),
        Duration::from_secs(config.workers.python_timeout_secs),
    );
    ToolWorker::new("data", DESCRIPTION, PROMPT, llm, ToolSet::new().with(python))
}

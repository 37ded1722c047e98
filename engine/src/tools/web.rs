//! Web Tools
//!
//! `web_search` scrapes the DuckDuckGo HTML endpoint (no API key needed) and
//! `fetch_url` returns a page reduced to plain text.

use super::Tool;
use async_trait::async_trait;
use regex::Regex;
use sdk::{ToolInput, ToolOutput};
use serde_json::json;
use std::time::Duration;
use tracing::{debug, info};

pub const DUCKDUCKGO_HTML_URL: &str = "https://html.duckduckgo.com/html/";

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36";
const TRUNCATION_MARKER: &str = "...(content truncated)";

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| reqwest::Client::new())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

pub struct WebSearchTool {
    endpoint: String,
    client: reqwest::Client,
    result_pattern: Regex,
}

impl WebSearchTool {
    pub fn new() -> Self {
        Self::with_endpoint(DUCKDUCKGO_HTML_URL)
    }

    /// Search against a different DuckDuckGo-compatible endpoint
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            client: http_client(),
            result_pattern: Regex::new(
                r#"(?s)<a rel="nofollow" class="result__a" href="([^"]+)"[^>]*>([^<]+)</a>.*?<a class="result__snippet"[^>]*>([^<]+)</a>"#,
            )
            .expect("search result pattern is valid"),
        }
    }

    pub fn parse_results(&self, html: &str, max_results: usize) -> Vec<SearchResult> {
        self.result_pattern
            .captures_iter(html)
            .take(max_results)
            .map(|c| SearchResult {
                url: c[1].trim().to_string(),
                title: c[2].trim().to_string(),
                snippet: c[3].trim().to_string(),
            })
            .collect()
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Result<String, String> {
        info!("Searching the web: {}", query);

        let response = self
            .client
            .post(&self.endpoint)
            .form(&[("q", query)])
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("Search request failed: HTTP {}", response.status().as_u16()));
        }

        let html = response.text().await.map_err(|e| e.to_string())?;
        let results = self.parse_results(&html, max_results);
        debug!("Parsed {} search results", results.len());

        if results.is_empty() {
            return Ok("No relevant results found".to_string());
        }

        let mut out = format!("Results for '{}':\n\n", query);
        for (i, r) in results.iter().enumerate() {
            out.push_str(&format!(
                "{}. {}\n   Link: {}\n   Snippet: {}\n\n",
                i + 1,
                r.title,
                r.url,
                r.snippet
            ));
        }
        Ok(out)
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the internet. Returns the title, link and snippet of each result."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search keywords"
                },
                "max_results": {
                    "type": "integer",
                    "description": "Maximum number of results, defaults to 5",
                    "default": 5
                }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, input: &ToolInput) -> ToolOutput {
        let query = match input.param_str("query") {
            Ok(q) => q,
            Err(e) => return e.into(),
        };
        let max_results = input
            .param_i64_opt("max_results")
            .filter(|n| *n > 0)
            .unwrap_or(5) as usize;

        match self.search(&query, max_results).await {
            Ok(text) => ToolOutput::text(text),
            Err(e) => ToolOutput::error(e),
        }
    }
}

/// Strips markup from HTML, leaving collapsed plain text
pub struct HtmlText {
    script: Regex,
    style: Regex,
    tag: Regex,
    whitespace: Regex,
}

impl HtmlText {
    pub fn new() -> Self {
        Self {
            script: Regex::new(r"(?is)<script[^>]*>.*?</script>").expect("script pattern is valid"),
            style: Regex::new(r"(?is)<style[^>]*>.*?</style>").expect("style pattern is valid"),
            tag: Regex::new(r"<[^>]+>").expect("tag pattern is valid"),
            whitespace: Regex::new(r"\s+").expect("whitespace pattern is valid"),
        }
    }

    pub fn extract(&self, html: &str) -> String {
        let text = self.script.replace_all(html, "");
        let text = self.style.replace_all(&text, "");
        let text = self.tag.replace_all(&text, " ");
        let text = text
            .replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&amp;", "&");
        self.whitespace.replace_all(&text, " ").trim().to_string()
    }
}

impl Default for HtmlText {
    fn default() -> Self {
        Self::new()
    }
}

pub struct FetchUrlTool {
    client: reqwest::Client,
    html: HtmlText,
    default_max_length: usize,
}

impl FetchUrlTool {
    pub fn new(default_max_length: usize) -> Self {
        Self {
            client: http_client(),
            html: HtmlText::new(),
            default_max_length,
        }
    }

    pub async fn fetch(&self, url: &str, max_length: usize) -> Result<String, String> {
        info!("Fetching URL: {}", url);

        let response = self.client.get(url).send().await.map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("Failed to fetch page: HTTP {}", response.status().as_u16()));
        }
        let body = response.text().await.map_err(|e| e.to_string())?;

        let text = self.html.extract(&body);
        Ok(match text.char_indices().nth(max_length) {
            Some((idx, _)) => format!("{}{}", &text[..idx], TRUNCATION_MARKER),
            None => text,
        })
    }
}

#[async_trait]
impl Tool for FetchUrlTool {
    fn name(&self) -> &str {
        "fetch_url"
    }

    fn description(&self) -> &str {
        "Fetch the page at a URL and return its text content."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "url": {
                    "type": "string",
                    "description": "URL of the page to fetch"
                },
                "max_length": {
                    "type": "integer",
                    "description": "Maximum characters to return, defaults to 5000",
                    "default": 5000
                }
            },
            "required": ["url"]
        })
    }

    async fn execute(&self, input: &ToolInput) -> ToolOutput {
        let url = match input.param_str("url") {
            Ok(u) => u,
            Err(e) => return e.into(),
        };
        let max_length = input
            .param_i64_opt("max_length")
            .filter(|n| *n > 0)
            .map_or(self.default_max_length, |n| n as usize);

        match self.fetch(&url, max_length).await {
            Ok(text) => ToolOutput::text(text),
            Err(e) => ToolOutput::error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_HTML: &str = r#"
<div class="result">
  <a rel="nofollow" class="result__a" href="https://www.rust-lang.org/">Rust Programming Language</a>
  <div><a class="result__snippet" href="x">A language empowering everyone</a></div>
</div>
<div class="result">
  <a rel="nofollow" class="result__a" href="https://doc.rust-lang.org/book/">The Book</a>
  <a class="result__snippet" href="y"> Learn Rust </a>
</div>"#;

    #[test]
    fn test_parse_results() {
        let tool = WebSearchTool::new();
        let results = tool.parse_results(SEARCH_HTML, 5);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].url, "https://www.rust-lang.org/");
        assert_eq!(results[0].title, "Rust Programming Language");
        assert_eq!(results[1].snippet, "Learn Rust");
    }

    #[test]
    fn test_parse_results_respects_limit() {
        let tool = WebSearchTool::new();
        assert_eq!(tool.parse_results(SEARCH_HTML, 1).len(), 1);
        assert!(tool.parse_results("<html></html>", 5).is_empty());
    }

    #[test]
    fn test_extract_text() {
        let html = "<html><head><style>body { color: red; }</style>\
            <script type=\"text/javascript\">alert('x')</script></head>\
            <body><h1>Title</h1>\n\n<p>Fish &amp; chips&nbsp;&lt;3</p></body></html>";
        assert_eq!(HtmlText::new().extract(html), "Title Fish & chips <3");
    }
}

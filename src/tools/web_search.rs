//! Web 搜索工具：DuckDuckGo Instant Answer API
//!
//! 无需 API Key；取 Abstract 摘要与 RelatedTopics（嵌套分组展平），
//! 输出编号文本列表，无结果时返回 "No results."。

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use crate::tools::{bind_args, Tool, ToolError};

const DEFAULT_LIMIT: usize = 5;

/// 一条搜索结果
struct SearchItem {
    title: String,
    link: String,
    snippet: String,
}

/// Web 搜索工具：GET api.duckduckgo.com 并整理结果
pub struct WebSearchTool {
    client: Client,
    limit: usize,
}

impl WebSearchTool {
    pub fn new(timeout_secs: u64, limit: usize) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(concat!("wasp/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();
        Self { client, limit }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WebSearchArgs {
    query: String,
    #[serde(default)]
    limit: Option<usize>,
}

#[async_trait]
impl Tool for WebSearchTool {
    fn name(&self) -> &str {
        "web_search"
    }

    fn description(&self) -> &str {
        "Search the web (DuckDuckGo Instant Answer). Args: {\"query\": \"...\", \"limit\": 5}"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "query": { "type": "string" },
                "limit": { "type": "integer" }
            },
            "required": ["query"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let args: WebSearchArgs = bind_args(&args)?;
        let limit = args.limit.unwrap_or(self.limit).max(1);
        tracing::info!(query = %args.query, "web_search tool execute");

        let data: Value = self
            .client
            .get("https://api.duckduckgo.com/")
            .query(&[
                ("q", args.query.as_str()),
                ("format", "json"),
                ("no_html", "1"),
                ("no_redirect", "1"),
            ])
            .send()
            .await
            .map_err(|e| ToolError::Failed(e.to_string()))?
            .json()
            .await
            .map_err(|e| ToolError::Failed(e.to_string()))?;

        Ok(format_results(&collect_items(&data), limit))
    }
}

/// 从 DDG 响应中收集摘要与 RelatedTopics（Topics 分组递归展平）
fn collect_items(data: &Value) -> Vec<SearchItem> {
    let mut items = Vec::new();

    let abstract_text = data
        .get("AbstractText")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .or_else(|| data.get("Abstract").and_then(Value::as_str).filter(|s| !s.is_empty()));
    if let Some(text) = abstract_text {
        let url = data
            .get("AbstractURL")
            .and_then(Value::as_str)
            .unwrap_or("");
        items.push(SearchItem {
            title: "Summary".to_string(),
            link: url.to_string(),
            snippet: text.to_string(),
        });
    }

    if let Some(related) = data.get("RelatedTopics").and_then(Value::as_array) {
        collect_topics(related, &mut items);
    }
    items
}

fn collect_topics(topics: &[Value], items: &mut Vec<SearchItem>) {
    for topic in topics {
        if let Some(nested) = topic.get("Topics").and_then(Value::as_array) {
            collect_topics(nested, items); // 嵌套分组
            continue;
        }
        let text = topic.get("Text").and_then(Value::as_str).unwrap_or("");
        let url = topic.get("FirstURL").and_then(Value::as_str).unwrap_or("");
        if !text.is_empty() || !url.is_empty() {
            items.push(SearchItem {
                title: text.to_string(),
                link: url.to_string(),
                snippet: String::new(),
            });
        }
    }
}

fn format_results(items: &[SearchItem], limit: usize) -> String {
    let lines: Vec<String> = items
        .iter()
        .take(limit)
        .enumerate()
        .map(|(i, item)| {
            let title = if item.title.is_empty() {
                "(no title)"
            } else {
                &item.title
            };
            if item.link.is_empty() {
                format!("{}. {}\n   {}", i + 1, title, item.snippet)
            } else {
                format!("{}. {}\n   {}\n   {}", i + 1, title, item.link, item.snippet)
            }
        })
        .collect();
    if lines.is_empty() {
        "No results.".to_string()
    } else {
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collects_abstract_and_nested_topics() {
        let data = serde_json::json!({
            "AbstractText": "Rust is a systems language.",
            "AbstractURL": "https://www.rust-lang.org",
            "RelatedTopics": [
                { "Text": "Rust (game)", "FirstURL": "https://example.com/game" },
                { "Topics": [
                    { "Text": "Cargo", "FirstURL": "https://example.com/cargo" }
                ]}
            ]
        });
        let items = collect_items(&data);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "Summary");
        assert_eq!(items[2].title, "Cargo");
    }

    #[test]
    fn empty_response_formats_as_no_results() {
        let items = collect_items(&serde_json::json!({}));
        assert_eq!(format_results(&items, 5), "No results.");
    }

    #[test]
    fn limit_caps_output() {
        let items: Vec<SearchItem> = (0..10)
            .map(|i| SearchItem {
                title: format!("t{i}"),
                link: String::new(),
                snippet: String::new(),
            })
            .collect();
        let out = format_results(&items, 3);
        assert_eq!(out.lines().filter(|l| !l.starts_with("   ")).count(), 3);
    }
}

//! 日程工具：add_event / list_events / remove_event
//!
//! 包装 EventStore 为可分发工具。add_event 成功后向记忆写一条事件备注：
//! 派生任务执行、结果忽略、失败只记日志——备注完成时刻与本次调用返回先后不保证。

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::memory::Memory;
use crate::scheduler::EventStore;
use crate::tools::{bind_args, Tool, ToolError};

/// add_event 工具：解析自然语言时间并持久化事件
pub struct AddEventTool {
    store: Arc<EventStore>,
    memory: Option<Arc<Memory>>,
}

impl AddEventTool {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self {
            store,
            memory: None,
        }
    }

    /// 挂接记忆：新增事件时写入备注（尽力而为）
    pub fn with_memory(mut self, memory: Arc<Memory>) -> Self {
        self.memory = Some(memory);
        self
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct AddEventArgs {
    title: String,
    when: String,
}

#[async_trait]
impl Tool for AddEventTool {
    fn name(&self) -> &str {
        "add_event"
    }

    fn description(&self) -> &str {
        "Schedule an event from a natural-language time. Args: {\"title\": \"...\", \"when\": \"tomorrow at 8AM\"}"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "title": { "type": "string" },
                "when": { "type": "string" }
            },
            "required": ["title", "when"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let args: AddEventArgs = bind_args(&args)?;
        let event_id = self
            .store
            .add_event(&args.title, &args.when, None)
            .map_err(|e| ToolError::Failed(e.to_string()))?;

        // 事件备注写入记忆：派生任务，结果忽略
        if let Some(memory) = self.memory.as_ref().filter(|m| m.has_embedder()) {
            let memory = Arc::clone(memory);
            let note = format!("Event: {} at {} (id={})", args.title, args.when, event_id);
            if let Ok(handle) = tokio::runtime::Handle::try_current() {
                handle.spawn(async move {
                    if let Err(e) = memory.store_text(&note, None).await {
                        tracing::debug!(error = %e, "event memory note skipped");
                    }
                });
            }
        }

        Ok(format!("event_id={event_id}"))
    }
}

/// list_events 工具：按时间升序列出全部事件
pub struct ListEventsTool {
    store: Arc<EventStore>,
}

impl ListEventsTool {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}

#[derive(Deserialize, Default)]
#[serde(deny_unknown_fields)]
struct ListEventsArgs {}

#[async_trait]
impl Tool for ListEventsTool {
    fn name(&self) -> &str {
        "list_events"
    }

    fn description(&self) -> &str {
        "List scheduled events ascending by time. Args: {}"
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let _args: ListEventsArgs = bind_args(&args)?;
        let events = self
            .store
            .list_events()
            .map_err(|e| ToolError::Failed(e.to_string()))?;
        if events.is_empty() {
            return Ok("No events.".to_string());
        }
        let lines: Vec<String> = events
            .iter()
            .map(|e| format!("{}\t{}\t{}", e.id, e.when_ts, e.title))
            .collect();
        Ok(lines.join("\n"))
    }
}

/// remove_event 工具：按 id 删除事件
pub struct RemoveEventTool {
    store: Arc<EventStore>,
}

impl RemoveEventTool {
    pub fn new(store: Arc<EventStore>) -> Self {
        Self { store }
    }
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RemoveEventArgs {
    event_id: i64,
}

#[async_trait]
impl Tool for RemoveEventTool {
    fn name(&self) -> &str {
        "remove_event"
    }

    fn description(&self) -> &str {
        "Remove a scheduled event by id. Args: {\"event_id\": 1}"
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let args: RemoveEventArgs = bind_args(&args)?;
        let removed = self
            .store
            .remove_event(args.event_id)
            .map_err(|e| ToolError::Failed(e.to_string()))?;
        Ok(if removed { "removed" } else { "not_found" }.to_string())
    }
}

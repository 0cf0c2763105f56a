//! Mock LLM 后端（用于测试与无 API Key 场景）
//!
//! 可预置脚本回复（按顺序出队）；脚本耗尽时回显最后一条 User 消息为 respond 动作 JSON，
//! 便于离线跑通「解释 -> 分发」流程。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{ChatMessage, Completion, GenerateOptions, LlmProvider, Role};

/// Mock 后端：脚本队列 + 回显兜底
#[derive(Debug, Default)]
pub struct MockProvider {
    replies: Mutex<VecDeque<String>>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// 预置一组脚本回复，generate 按顺序出队
    pub fn with_replies(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
        }
    }

    /// 追加一条脚本回复
    pub fn push_reply(&self, reply: impl Into<String>) {
        self.replies.lock().unwrap().push_back(reply.into());
    }
}

#[async_trait]
impl LlmProvider for MockProvider {
    async fn generate(
        &self,
        messages: &[ChatMessage],
        _options: &GenerateOptions,
    ) -> Result<Completion, String> {
        if let Some(scripted) = self.replies.lock().unwrap().pop_front() {
            return Ok(Completion {
                text: scripted,
                raw: serde_json::json!({ "mock": true }),
            });
        }

        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, Role::User))
            .map(|m| m.content.as_str())
            .unwrap_or("(no input)");

        let text = serde_json::json!({
            "thought": "mock reply",
            "action": "respond",
            "args": { "message": format!("Echo from Mock: {last_user}") },
        })
        .to_string();

        Ok(Completion {
            text,
            raw: serde_json::json!({ "mock": true }),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scripted_replies_drain_in_order() {
        let mock = MockProvider::with_replies(vec!["one".into(), "two".into()]);
        let options = GenerateOptions::default();
        let messages = [ChatMessage::user("hi")];
        assert_eq!(mock.generate(&messages, &options).await.unwrap().text, "one");
        assert_eq!(mock.generate(&messages, &options).await.unwrap().text, "two");
        // 脚本耗尽后回显兜底
        let fallback = mock.generate(&messages, &options).await.unwrap().text;
        assert!(fallback.contains("Echo from Mock: hi"));
    }
}

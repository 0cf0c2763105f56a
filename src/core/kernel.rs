//! Kernel：上下文组装与记忆增强生成
//!
//! process_input 按序拼消息：system? -> 先前上下文 -> 记忆检索块（尽力而为）-> user，
//! 调用活跃模型，成功后把用户输入与模型输出写回记忆。记忆读写失败只记日志，不中断本轮；
//! 无活跃模型则致命失败。

use std::sync::Arc;

use crate::core::AgentError;
use crate::llm::{ChatMessage, Completion, GenerateOptions, LlmManager, LlmProvider};
use crate::memory::Memory;

/// 记忆检索默认条数
const DEFAULT_MEMORY_TOP_K: usize = 3;

/// 高层编排器：持有模型管理器与可选记忆
pub struct Kernel {
    llm: LlmManager,
    memory: Option<Arc<Memory>>,
    memory_top_k: usize,
}

impl Kernel {
    /// 用单个后端创建 Kernel，注册为 "default" 并激活
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        let mut llm = LlmManager::new();
        llm.load_model("default", provider);
        Self {
            llm,
            memory: None,
            memory_top_k: DEFAULT_MEMORY_TOP_K,
        }
    }

    /// 挂接检索记忆
    pub fn with_memory(mut self, memory: Arc<Memory>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn with_memory_top_k(mut self, top_k: usize) -> Self {
        self.memory_top_k = top_k;
        self
    }

    pub fn memory(&self) -> Option<&Arc<Memory>> {
        self.memory.as_ref()
    }

    /// 暴露模型管理器（加载/切换模型）
    pub fn llm_mut(&mut self) -> &mut LlmManager {
        &mut self.llm
    }

    pub fn llm(&self) -> &LlmManager {
        &self.llm
    }

    /// 单轮处理：拼消息 -> 生成 -> 写回记忆 -> 返回模型文本
    pub async fn process_input(
        &self,
        text: &str,
        system_prompt: Option<&str>,
        context: Option<&[ChatMessage]>,
        options: &GenerateOptions,
    ) -> Result<String, AgentError> {
        let mut messages: Vec<ChatMessage> = Vec::new();
        if let Some(prompt) = system_prompt {
            messages.push(ChatMessage::system(prompt));
        }
        if let Some(prior) = context {
            messages.extend_from_slice(prior);
        }
        if let Some(block) = self.recall_block(text).await {
            messages.push(ChatMessage::system(block));
        }
        messages.push(ChatMessage::user(text));

        let completion = self.llm.generate(&messages, options).await?;
        let output = completion.text;

        // 写回记忆：失败只记 debug 日志，记忆是优化而非正确性要求
        if let Some(memory) = self.memory_with_embedder() {
            if let Err(e) = memory.store_text(text, None).await {
                tracing::debug!(error = %e, "memory store (input) skipped");
            }
            if !output.is_empty() {
                if let Err(e) = memory.store_text(&output, None).await {
                    tracing::debug!(error = %e, "memory store (output) skipped");
                }
            }
        }

        Ok(output)
    }

    /// 底层入口：消息序列直通活跃模型
    pub async fn generate_response(
        &self,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> Result<Completion, AgentError> {
        self.llm.generate(messages, options).await
    }

    fn memory_with_embedder(&self) -> Option<&Arc<Memory>> {
        self.memory.as_ref().filter(|m| m.has_embedder())
    }

    /// 检索相关记忆并拼为一条 system 消息；检索失败视为无命中
    async fn recall_block(&self, query: &str) -> Option<String> {
        let memory = self.memory_with_embedder()?;
        let hits = match memory.retrieve(query, self.memory_top_k).await {
            Ok(hits) => hits,
            Err(e) => {
                tracing::debug!(error = %e, "memory retrieval failed, continuing without it");
                return None;
            }
        };
        let snippets: Vec<String> = hits
            .iter()
            .filter(|h| !h.text.is_empty())
            .map(|h| format!("- {}", h.text))
            .collect();
        if snippets.is_empty() {
            return None;
        }
        Some(format!(
            "Relevant memory items (most similar first):\n{}",
            snippets.join("\n")
        ))
    }
}

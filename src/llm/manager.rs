//! LLM 管理器：按名注册后端与活跃模型选择
//!
//! load_model / unload_model / set_active_model / list_models；generate 走当前活跃模型，
//! 未配置活跃模型属于致命配置错误（NoActiveModel），不做静默回退。

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::AgentError;
use crate::llm::{ChatMessage, Completion, GenerateOptions, LlmProvider};

/// 管理 model_name -> Provider 的映射与活跃模型指针
#[derive(Default)]
pub struct LlmManager {
    models: HashMap<String, Arc<dyn LlmProvider>>,
    active: Option<String>,
}

impl LlmManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册后端实例；同名覆盖。首个注册的模型自动成为活跃模型。
    pub fn load_model(&mut self, model_name: impl Into<String>, provider: Arc<dyn LlmProvider>) {
        let name = model_name.into();
        self.models.insert(name.clone(), provider);
        if self.active.is_none() {
            self.active = Some(name);
        }
    }

    /// 卸载后端；若其为活跃模型则清空活跃指针
    pub fn unload_model(&mut self, model_name: &str) -> bool {
        if self.models.remove(model_name).is_some() {
            if self.active.as_deref() == Some(model_name) {
                self.active = None;
            }
            true
        } else {
            false
        }
    }

    /// 切换活跃模型；仅当目标已注册时生效
    pub fn set_active_model(&mut self, model_name: &str) -> bool {
        if self.models.contains_key(model_name) {
            self.active = Some(model_name.to_string());
            true
        } else {
            false
        }
    }

    pub fn list_models(&self) -> Vec<String> {
        self.models.keys().cloned().collect()
    }

    pub fn active_model(&self) -> Option<&str> {
        self.active.as_deref()
    }

    /// 用活跃模型生成；无活跃模型返回 NoActiveModel，后端失败转 LlmError
    pub async fn generate(
        &self,
        messages: &[ChatMessage],
        options: &GenerateOptions,
    ) -> Result<Completion, AgentError> {
        let provider = self
            .active
            .as_ref()
            .and_then(|name| self.models.get(name))
            .ok_or(AgentError::NoActiveModel)?;
        provider
            .generate(messages, options)
            .await
            .map_err(AgentError::LlmError)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockProvider;

    #[tokio::test]
    async fn no_active_model_is_fatal() {
        let manager = LlmManager::new();
        let err = manager
            .generate(&[ChatMessage::user("hi")], &GenerateOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::NoActiveModel));
    }

    #[tokio::test]
    async fn first_loaded_model_becomes_active() {
        let mut manager = LlmManager::new();
        manager.load_model("default", Arc::new(MockProvider::new()));
        manager.load_model("backup", Arc::new(MockProvider::new()));
        assert_eq!(manager.active_model(), Some("default"));
        assert!(manager
            .generate(&[ChatMessage::user("hi")], &GenerateOptions::default())
            .await
            .is_ok());
    }

    #[test]
    fn unload_clears_active_pointer() {
        let mut manager = LlmManager::new();
        manager.load_model("default", Arc::new(MockProvider::new()));
        assert!(manager.unload_model("default"));
        assert_eq!(manager.active_model(), None);
        assert!(!manager.unload_model("default"));
    }

    #[test]
    fn set_active_requires_registered_name() {
        let mut manager = LlmManager::new();
        manager.load_model("default", Arc::new(MockProvider::new()));
        assert!(!manager.set_active_model("missing"));
        assert_eq!(manager.active_model(), Some("default"));
    }
}

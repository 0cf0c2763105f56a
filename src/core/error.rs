//! 编排层错误类型
//!
//! 仅包含必须上抛的失败：配置缺失（无活跃模型）与 LLM 调用失败。
//! 分发类失败（未知工具、参数错误、工具异常）不走错误通道，降级为用户可见文本。

use thiserror::Error;

/// 单轮处理中会终止本轮的错误
#[derive(Error, Debug)]
pub enum AgentError {
    /// 未配置活跃模型：致命配置错误，不静默回退
    #[error("No active model configured")]
    NoActiveModel,

    #[error("LLM error: {0}")]
    LlmError(String),
}

//! AgentManager：解释 -> 分发的单轮状态机
//!
//! execute 以固定解释 prompt（严格 JSON、低温、限长）经 Kernel 取得动作计划：
//! 解析失败原样返回模型文本；"respond" 取 args.message；未注册工具与工具失败
//! 都降级为用户可见文本，一轮绝不因分发问题崩溃。模型/配置错误照常上抛。

use std::sync::Arc;

use serde_json::Value;

use crate::agent::parse_action;
use crate::core::{AgentError, Kernel};
use crate::llm::GenerateOptions;
use crate::tools::{Tool, ToolError, ToolRegistry};

/// 解释 prompt：要求严格 JSON 输出 thought/action/args
pub const INTERPRETER_SYSTEM_PROMPT: &str = "You are a tool-using agent. Given a user's input, decide whether to use a tool \
and respond in strict JSON ONLY with keys: thought (string), action (string), args (object). \
Use 'respond' as action when a direct answer is sufficient.";

/// 解释步温度：偏确定性
const INTERPRETER_TEMPERATURE: f32 = 0.2;
/// 解释步输出上限
const INTERPRETER_MAX_TOKENS: u32 = 256;

/// 在 Kernel 与工具注册表之间做中介的管理器
pub struct AgentManager {
    kernel: Arc<Kernel>,
    tools: ToolRegistry,
}

impl AgentManager {
    pub fn new(kernel: Arc<Kernel>) -> Self {
        Self {
            kernel,
            tools: ToolRegistry::new(),
        }
    }

    pub fn with_tools(kernel: Arc<Kernel>, tools: ToolRegistry) -> Self {
        Self { kernel, tools }
    }

    /// 注册工具；同名覆盖
    pub fn register_tool(&mut self, tool: impl Tool + 'static) {
        self.tools.register(tool);
    }

    pub fn unregister_tool(&mut self, name: &str) -> bool {
        self.tools.unregister(name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.tool_names()
    }

    pub fn kernel(&self) -> &Arc<Kernel> {
        &self.kernel
    }

    /// 单轮执行：解释用户输入并分发到对应工具或直接回复
    pub async fn execute(&self, user_input: &str) -> Result<String, AgentError> {
        let options = GenerateOptions {
            temperature: INTERPRETER_TEMPERATURE,
            max_tokens: Some(INTERPRETER_MAX_TOKENS),
        };
        let llm_text = self
            .kernel
            .process_input(user_input, Some(INTERPRETER_SYSTEM_PROMPT), None, &options)
            .await?;

        let Some(plan) = parse_action(&llm_text) else {
            // 无法定位动作：原样返回模型文本
            return Ok(llm_text);
        };

        if plan.action == "respond" {
            return Ok(respond_message(&plan.args));
        }

        let Some(tool) = self.tools.get(&plan.action) else {
            return Ok(format!("Unknown tool: {}", plan.action));
        };

        tracing::info!(tool = %plan.action, "dispatching tool");
        match tool.execute(plan.args).await {
            Ok(result) => Ok(result),
            Err(ToolError::InvalidArgs(detail)) => {
                Ok(format!("Tool '{}' argument error: {}", plan.action, detail))
            }
            Err(ToolError::Failed(detail)) => {
                Ok(format!("Tool '{}' failed: {}", plan.action, detail))
            }
        }
    }
}

/// respond 动作的消息取值：缺省空串，非字符串按 JSON 形式渲染
fn respond_message(args: &Value) -> String {
    match args.get("message") {
        None => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn respond_message_handles_shapes() {
        assert_eq!(
            respond_message(&serde_json::json!({ "message": "hi" })),
            "hi"
        );
        assert_eq!(respond_message(&serde_json::json!({})), "");
        assert_eq!(respond_message(&Value::Null), "");
        assert_eq!(respond_message(&serde_json::json!({ "message": 42 })), "42");
    }
}

//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / execute），由 ToolRegistry 按名注册与查找，
//! 同名后注册者覆盖前者。执行错误分两类：InvalidArgs（参数形状不符，由 bind_args 统一产生）
//! 与 Failed（运行期失败），分发层据此给出不同的用户可见提示。

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use thiserror::Error;

/// 工具执行错误：参数错误与运行失败必须可区分
#[derive(Error, Debug)]
pub enum ToolError {
    /// 参数形状不符（缺键 / 多键 / 类型不符）
    #[error("{0}")]
    InvalidArgs(String),

    /// 工具运行期失败
    #[error("{0}")]
    Failed(String),
}

/// 将 JSON args 绑定为工具的类型化参数结构；null 视为空对象。
/// 参数结构体应标注 deny_unknown_fields，使多余键同样报 InvalidArgs。
pub fn bind_args<T: DeserializeOwned>(args: &Value) -> Result<T, ToolError> {
    let value = if args.is_null() {
        Value::Object(serde_json::Map::new())
    } else {
        args.clone()
    };
    serde_json::from_value(value).map_err(|e| ToolError::InvalidArgs(e.to_string()))
}

/// 工具 trait：名称、描述（供 LLM 理解）、参数 schema、异步执行（args 为 JSON）
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（动作 JSON 中的 "action" 字段）
    fn name(&self) -> &str;

    /// 工具描述（供 LLM 理解功能）
    fn description(&self) -> &str;

    /// 参数 JSON Schema（供 LLM 生成正确的参数格式）
    /// 默认返回空对象，表示无参数或参数格式不限
    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }

    /// 执行工具
    async fn execute(&self, args: Value) -> Result<String, ToolError>;
}

/// 工具注册表：按名称存储 Arc<dyn Tool>，register / unregister / get / tool_names
#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册工具；同名覆盖（后注册者生效）
    pub fn register(&mut self, tool: impl Tool + 'static) {
        let name = tool.name().to_string();
        self.tools.insert(name, Arc::new(tool));
    }

    pub fn unregister(&mut self, name: &str) -> bool {
        self.tools.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// 返回 (name, description) 列表，用于生成 prompt 中的 Available tools 段落
    pub fn tool_descriptions(&self) -> Vec<(String, String)> {
        self.tools
            .iter()
            .map(|(name, tool)| (name.clone(), tool.description().to_string()))
            .collect()
    }

    /// 动态生成工具 schema JSON（与实际注册工具一致）
    pub fn to_schema_json(&self) -> String {
        let tools: Vec<serde_json::Value> = self
            .tools
            .iter()
            .map(|(name, tool)| {
                serde_json::json!({
                    "name": name,
                    "description": tool.description(),
                    "parameters": tool.parameters_schema()
                })
            })
            .collect();
        serde_json::to_string_pretty(&tools).unwrap_or_else(|_| "[]".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    #[serde(deny_unknown_fields)]
    struct DemoArgs {
        a: String,
    }

    #[test]
    fn bind_args_rejects_unknown_field() {
        let err = bind_args::<DemoArgs>(&serde_json::json!({ "b": "x" })).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
    }

    #[test]
    fn bind_args_rejects_missing_field() {
        let err = bind_args::<DemoArgs>(&serde_json::json!({})).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
    }

    #[test]
    fn bind_args_treats_null_as_empty_object() {
        #[derive(Deserialize, Default)]
        #[serde(deny_unknown_fields, default)]
        struct OptArgs {
            limit: Option<usize>,
        }
        let args = bind_args::<OptArgs>(&Value::Null).unwrap();
        assert!(args.limit.is_none());
    }

    #[test]
    fn register_last_wins_and_unregister() {
        struct Fixed(&'static str, &'static str);

        #[async_trait]
        impl Tool for Fixed {
            fn name(&self) -> &str {
                self.0
            }
            fn description(&self) -> &str {
                self.1
            }
            async fn execute(&self, _args: Value) -> Result<String, ToolError> {
                Ok(self.1.to_string())
            }
        }

        let mut registry = ToolRegistry::new();
        registry.register(Fixed("dup", "first"));
        registry.register(Fixed("dup", "second"));
        assert_eq!(registry.get("dup").unwrap().description(), "second");
        assert!(registry.unregister("dup"));
        assert!(!registry.unregister("dup"));
        assert!(registry.get("dup").is_none());
    }
}

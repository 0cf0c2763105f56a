//! Echo 工具（测试用）

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::tools::{bind_args, Tool, ToolError};

/// Echo 工具：回显文本
pub struct EchoTool;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct EchoArgs {
    text: String,
}

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo text (for testing). Args: {\"text\": \"message\"}"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": { "text": { "type": "string" } },
            "required": ["text"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let args: EchoArgs = bind_args(&args)?;
        Ok(args.text)
    }
}

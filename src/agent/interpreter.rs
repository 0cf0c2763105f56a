//! 动作解释：从模型文本中提取结构化动作计划
//!
//! 两段式解析：先把整段裁剪文本当 JSON；失败则取首个 '{' 到末个 '}' 的子串再试。
//! 两段都要求解析出的对象含 "action" 键。只认首/末花括号，一轮至多一个动作，
//! 多个或嵌套 JSON 不做消歧。都失败返回 None，调用方应把原文本当作直接回复。

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// 模型产出的动作计划（线格式 {"thought": ..., "action": ..., "args": {...}}）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionPlan {
    /// 诊断用思考过程，不参与分发
    #[serde(default)]
    pub thought: Option<String>,
    /// 工具名，或保留字 "respond"
    pub action: String,
    /// 工具关键字参数；缺省为空对象
    #[serde(default = "empty_args")]
    pub args: Value,
}

fn empty_args() -> Value {
    Value::Object(serde_json::Map::new())
}

/// 从模型文本解析动作计划；无法定位有效动作时返回 None
pub fn parse_action(text: &str) -> Option<ActionPlan> {
    let trimmed = text.trim();

    // 第一段：整段即 JSON
    if let Some(plan) = try_parse(trimmed) {
        return Some(plan);
    }

    // 第二段：首个 '{' 到末个 '}' 的子串（容忍模型把 JSON 包在文字或代码栅栏里）
    let start = trimmed.find('{')?;
    let end = trimmed.rfind('}')?;
    if end <= start {
        return None;
    }
    try_parse(&trimmed[start..=end])
}

fn try_parse(candidate: &str) -> Option<ActionPlan> {
    let value: Value = serde_json::from_str(candidate).ok()?;
    if !value
        .as_object()
        .map(|obj| obj.contains_key("action"))
        .unwrap_or(false)
    {
        return None;
    }
    serde_json::from_value(value).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pure_json() {
        let plan =
            parse_action(r#"{"thought": "use calc", "action": "calculator", "args": {"expression": "1+1"}}"#)
                .unwrap();
        assert_eq!(plan.action, "calculator");
        assert_eq!(plan.thought.as_deref(), Some("use calc"));
        assert_eq!(plan.args["expression"], "1+1");
    }

    #[test]
    fn extracts_json_embedded_in_prose() {
        let plan = parse_action(r#"noise {"action":"x","args":{}} trailing"#).unwrap();
        assert_eq!(plan.action, "x");
    }

    #[test]
    fn extracts_json_from_code_fence() {
        let text = "```json\n{\"action\": \"respond\", \"args\": {\"message\": \"hi\"}}\n```";
        let plan = parse_action(text).unwrap();
        assert_eq!(plan.action, "respond");
        assert_eq!(plan.args["message"], "hi");
    }

    #[test]
    fn no_braces_yields_none() {
        assert!(parse_action("no braces here").is_none());
    }

    #[test]
    fn object_without_action_key_yields_none() {
        assert!(parse_action(r#"{"tool": "calculator"}"#).is_none());
    }

    #[test]
    fn malformed_braces_yield_none() {
        assert!(parse_action("This is not JSON but maybe includes {broken}").is_none());
    }

    #[test]
    fn missing_args_defaults_to_empty_object() {
        let plan = parse_action(r#"{"action": "respond"}"#).unwrap();
        assert!(plan.args.as_object().unwrap().is_empty());
        assert!(plan.thought.is_none());
    }
}

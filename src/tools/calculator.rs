//! 计算器工具：安全表达式求值
//!
//! 仅支持 + - * / % 幂（^ 或 **）、括号与一元正负号；不允许变量、函数或任何标识符。
//! 整数结果不带小数点输出（"2 + 2 * 3" -> "8"）。

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::tools::{bind_args, Tool, ToolError};

/// 计算器工具：对 expression 做受限求值
pub struct CalculatorTool;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct CalculatorArgs {
    expression: String,
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        "calculator"
    }

    fn description(&self) -> &str {
        "Evaluate a math expression (+ - * / % power, parentheses). Args: {\"expression\": \"2 + 2 * 3\"}"
    }

    fn parameters_schema(&self) -> Value {
        serde_json::json!({
            "type": "object",
            "properties": { "expression": { "type": "string" } },
            "required": ["expression"]
        })
    }

    async fn execute(&self, args: Value) -> Result<String, ToolError> {
        let args: CalculatorArgs = bind_args(&args)?;
        let value = evaluate(&args.expression).map_err(ToolError::Failed)?;
        Ok(format_number(value))
    }
}

/// 求值入口：解析整个表达式，尾部残留字符视为非法
pub fn evaluate(expression: &str) -> Result<f64, String> {
    let mut parser = Parser {
        chars: expression.chars().collect(),
        pos: 0,
    };
    let value = parser.parse_expr()?;
    parser.skip_whitespace();
    if parser.peek().is_some() {
        return Err("Disallowed syntax in expression".to_string());
    }
    Ok(value)
}

/// 整数值不带 ".0" 输出，其余用默认浮点格式
fn format_number(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// 递归下降：expr(+ -) -> term(* / %) -> power(^ **，右结合) -> unary(± ) -> atom
struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.pos += 1;
        }
    }

    /// 加减（左结合）
    fn parse_expr(&mut self) -> Result<f64, String> {
        let mut value = self.parse_term()?;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('+') => {
                    self.pos += 1;
                    value += self.parse_term()?;
                }
                Some('-') => {
                    self.pos += 1;
                    value -= self.parse_term()?;
                }
                _ => return Ok(value),
            }
        }
    }

    /// 乘除模（左结合）；"**" 属于幂运算，在 parse_power 处理
    fn parse_term(&mut self) -> Result<f64, String> {
        let mut value = self.parse_power()?;
        loop {
            self.skip_whitespace();
            match self.peek() {
                Some('*') if self.peek_at(1) != Some('*') => {
                    self.pos += 1;
                    value *= self.parse_power()?;
                }
                Some('/') => {
                    self.pos += 1;
                    let divisor = self.parse_power()?;
                    if divisor == 0.0 {
                        return Err("division by zero".to_string());
                    }
                    value /= divisor;
                }
                Some('%') => {
                    self.pos += 1;
                    let divisor = self.parse_power()?;
                    if divisor == 0.0 {
                        return Err("modulo by zero".to_string());
                    }
                    value %= divisor;
                }
                _ => return Ok(value),
            }
        }
    }

    /// 幂（^ 或 **，右结合）
    fn parse_power(&mut self) -> Result<f64, String> {
        let base = self.parse_unary()?;
        self.skip_whitespace();
        match self.peek() {
            Some('^') => {
                self.pos += 1;
                Ok(base.powf(self.parse_power()?))
            }
            Some('*') if self.peek_at(1) == Some('*') => {
                self.pos += 2;
                Ok(base.powf(self.parse_power()?))
            }
            _ => Ok(base),
        }
    }

    /// 一元正负号
    fn parse_unary(&mut self) -> Result<f64, String> {
        self.skip_whitespace();
        match self.peek() {
            Some('-') => {
                self.pos += 1;
                Ok(-self.parse_unary()?)
            }
            Some('+') => {
                self.pos += 1;
                self.parse_unary()
            }
            _ => self.parse_atom(),
        }
    }

    /// 数字或括号
    fn parse_atom(&mut self) -> Result<f64, String> {
        self.skip_whitespace();
        match self.peek() {
            Some('(') => {
                self.pos += 1;
                let value = self.parse_expr()?;
                self.skip_whitespace();
                if self.bump() != Some(')') {
                    return Err("Invalid expression: unbalanced parentheses".to_string());
                }
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.parse_number(),
            Some(_) => Err("Disallowed syntax in expression".to_string()),
            None => Err("Invalid expression: unexpected end".to_string()),
        }
    }

    fn parse_number(&mut self) -> Result<f64, String> {
        let mut literal = String::new();
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            literal.push(self.chars[self.pos]);
            self.pos += 1;
        }
        literal
            .parse::<f64>()
            .map_err(|_| format!("Invalid expression: bad number '{literal}'"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn precedence_and_integer_formatting() {
        let out = CalculatorTool
            .execute(serde_json::json!({ "expression": "2 + 2 * 3" }))
            .await
            .unwrap();
        assert_eq!(out, "8");
    }

    #[test]
    fn parentheses_and_unary() {
        assert_eq!(evaluate("(2 + 2) * 3").unwrap(), 12.0);
        assert_eq!(evaluate("-3 + 5").unwrap(), 2.0);
        assert_eq!(evaluate("+4").unwrap(), 4.0);
    }

    #[test]
    fn power_binds_tighter_than_multiply() {
        assert_eq!(evaluate("2 ^ 10").unwrap(), 1024.0);
        assert_eq!(evaluate("2 * 3 ** 2").unwrap(), 18.0);
        // 幂右结合
        assert_eq!(evaluate("2 ** 3 ** 2").unwrap(), 512.0);
    }

    #[test]
    fn modulo_works() {
        assert_eq!(evaluate("10 % 3").unwrap(), 1.0);
    }

    #[test]
    fn fractional_results_keep_decimals() {
        assert_eq!(format_number(evaluate("7 / 2").unwrap()), "3.5");
    }

    #[test]
    fn identifiers_are_rejected() {
        assert!(evaluate("2 + abs(3)").is_err());
        assert!(evaluate("x + 1").is_err());
    }

    #[test]
    fn division_by_zero_fails() {
        assert!(evaluate("1 / 0").is_err());
        assert!(evaluate("1 % 0").is_err());
    }

    #[test]
    fn unbalanced_parens_fail() {
        assert!(evaluate("(1 + 2").is_err());
        assert!(evaluate("1 + 2)").is_err());
    }

    #[tokio::test]
    async fn missing_expression_is_an_argument_error() {
        let err = CalculatorTool
            .execute(serde_json::json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArgs(_)));
    }
}

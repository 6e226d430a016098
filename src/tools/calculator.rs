//! Calculator tool for general arithmetic
//!
//! Evaluates expressions with `+ - * / %`, powers (`^` or `**`), parentheses,
//! unary signs, the constants `pi` and `e`, and a few single-argument functions.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

use super::tool::{Tool, ToolResult};
use crate::core::InvocationContext;
use crate::llm::{ToolDefinition, ToolInputSchema};

pub const CALCULATOR_TOOL_NAME: &str = "calculator";

/// Bound on parentheses, function calls and unary signs nested in one expression
pub const MAX_NESTING: usize = 64;

#[derive(Debug, Error, PartialEq)]
pub enum CalcError {
    #[error("unexpected character '{ch}' at position {pos}")]
    UnexpectedChar { ch: char, pos: usize },

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unknown identifier '{0}'")]
    UnknownIdentifier(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("result is not a finite number")]
    NotFinite,

    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Evaluate an arithmetic expression
pub fn evaluate(expression: &str) -> Result<f64, CalcError> {
    let mut parser = Parser {
        chars: expression.chars().collect(),
        pos: 0,
        depth: 0,
    };
    let value = parser.expr()?;
    parser.skip_ws();
    if let Some(&ch) = parser.chars.get(parser.pos) {
        return Err(CalcError::UnexpectedChar { ch, pos: parser.pos });
    }
    if !value.is_finite() {
        return Err(CalcError::NotFinite);
    }
    Ok(value)
}

/// Render integral results without a fractional part
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{}", value)
    }
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn skip_ws(&mut self) {
        while self.chars.get(self.pos).is_some_and(|c| c.is_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&mut self) -> Option<char> {
        self.skip_ws();
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    // expr := term (('+' | '-') term)*
    fn expr(&mut self) -> Result<f64, CalcError> {
        let mut value = self.term()?;
        loop {
            if self.eat('+') {
                value += self.term()?;
            } else if self.eat('-') {
                value -= self.term()?;
            } else {
                return Ok(value);
            }
        }
    }

    // term := unary (('*' | '/' | '%') unary)*
    fn term(&mut self) -> Result<f64, CalcError> {
        let mut value = self.unary()?;
        loop {
            match self.peek() {
                Some('*') if self.chars.get(self.pos + 1) != Some(&'*') => {
                    self.pos += 1;
                    value *= self.unary()?;
                }
                Some('/') => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    value /= rhs;
                }
                Some('%') => {
                    self.pos += 1;
                    let rhs = self.unary()?;
                    if rhs == 0.0 {
                        return Err(CalcError::DivisionByZero);
                    }
                    value %= rhs;
                }
                _ => return Ok(value),
            }
        }
    }

    // Every recursive path passes through here
    fn unary(&mut self) -> Result<f64, CalcError> {
        if self.depth >= MAX_NESTING {
            return Err(CalcError::TooDeep(MAX_NESTING));
        }
        self.depth += 1;
        let value = self.signed();
        self.depth -= 1;
        value
    }

    // unary := ('-' | '+') unary | power
    fn signed(&mut self) -> Result<f64, CalcError> {
        if self.eat('-') {
            return Ok(-self.unary()?);
        }
        if self.eat('+') {
            return self.unary();
        }
        self.power()
    }

    // power := primary (('^' | '**') unary)?   right associative
    fn power(&mut self) -> Result<f64, CalcError> {
        let base = self.primary()?;
        if self.eat('^') {
            return Ok(base.powf(self.unary()?));
        }
        if self.peek() == Some('*') && self.chars.get(self.pos + 1) == Some(&'*') {
            self.pos += 2;
            return Ok(base.powf(self.unary()?));
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<f64, CalcError> {
        match self.peek() {
            None => Err(CalcError::UnexpectedEnd),
            Some('(') => {
                self.pos += 1;
                let value = self.expr()?;
                if !self.eat(')') {
                    return match self.peek() {
                        Some(ch) => Err(CalcError::UnexpectedChar { ch, pos: self.pos }),
                        None => Err(CalcError::UnexpectedEnd),
                    };
                }
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            Some(c) if c.is_ascii_alphabetic() => self.identifier(),
            Some(ch) => Err(CalcError::UnexpectedChar { ch, pos: self.pos }),
        }
    }

    fn number(&mut self) -> Result<f64, CalcError> {
        let start = self.pos;
        while self
            .chars
            .get(self.pos)
            .is_some_and(|c| c.is_ascii_digit() || *c == '.')
        {
            self.pos += 1;
        }
        // Scientific notation: 1e3, 2.5E-4
        if self.chars.get(self.pos).is_some_and(|c| *c == 'e' || *c == 'E')
            && self.chars.get(self.pos + 1).is_some_and(|c| {
                c.is_ascii_digit()
                    || ((*c == '-' || *c == '+')
                        && self.chars.get(self.pos + 2).is_some_and(|d| d.is_ascii_digit()))
            })
        {
            self.pos += 2;
            while self.chars.get(self.pos).is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let text: String = self.chars[start..self.pos].iter().collect();
        text.parse::<f64>()
            .map_err(|_| CalcError::InvalidNumber(text))
    }

    fn identifier(&mut self) -> Result<f64, CalcError> {
        let start = self.pos;
        while self
            .chars
            .get(self.pos)
            .is_some_and(|c| c.is_ascii_alphanumeric() || *c == '_')
        {
            self.pos += 1;
        }
        let name: String = self.chars[start..self.pos].iter().collect::<String>().to_lowercase();

        match name.as_str() {
            "pi" => return Ok(std::f64::consts::PI),
            "e" => return Ok(std::f64::consts::E),
            _ => {}
        }

        let func: fn(f64) -> f64 = match name.as_str() {
            "sqrt" => f64::sqrt,
            "abs" => f64::abs,
            "round" => f64::round,
            "floor" => f64::floor,
            "ceil" => f64::ceil,
            "ln" => f64::ln,
            "log" => f64::log10,
            "sin" => f64::sin,
            "cos" => f64::cos,
            "tan" => f64::tan,
            _ => return Err(CalcError::UnknownIdentifier(name)),
        };

        if !self.eat('(') {
            return match self.peek() {
                Some(ch) => Err(CalcError::UnexpectedChar { ch, pos: self.pos }),
                None => Err(CalcError::UnexpectedEnd),
            };
        }
        let arg = self.expr()?;
        if !self.eat(')') {
            return Err(CalcError::UnexpectedEnd);
        }
        Ok(func(arg))
    }
}

/// Input for the calculator tool
#[derive(Debug, Deserialize)]
struct CalculatorInput {
    /// Arithmetic expression to evaluate
    expression: String,
}

/// General arithmetic tool exposed to the orchestrator
#[derive(Debug, Default)]
pub struct CalculatorTool;

impl CalculatorTool {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Tool for CalculatorTool {
    fn name(&self) -> &str {
        CALCULATOR_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Evaluate an arithmetic expression and return the numeric result."
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: CALCULATOR_TOOL_NAME.to_string(),
            description: Some(
                "Evaluates an arithmetic expression. Supports + - * / %, ^ for powers, \
                parentheses, pi, e and sqrt/abs/round/floor/ceil/ln/log/sin/cos/tan."
                    .to_string(),
            ),
            input_schema: ToolInputSchema::new()
                .with_properties(json!({
                    "expression": {
                        "type": "string",
                        "description": "The expression to evaluate, e.g. \"(12.5 * 4) / 2\""
                    }
                }))
                .with_required(&["expression"]),
        }
    }

    async fn execute(&self, input: &Value, _ctx: &InvocationContext) -> Result<ToolResult> {
        let calc_input: CalculatorInput = serde_json::from_value(input.clone())
            .map_err(|e| anyhow::anyhow!("Invalid calculator input: {}", e))?;

        tracing::debug!("[Calculator] Evaluating: {}", calc_input.expression);

        match evaluate(&calc_input.expression) {
            Ok(value) => Ok(ToolResult::success(format_number(value))),
            Err(e) => Ok(ToolResult::error(format!(
                "Cannot evaluate '{}': {}",
                calc_input.expression, e
            ))),
        }
    }
}

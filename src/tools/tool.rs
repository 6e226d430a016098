//! The `Tool` seam
//!
//! Everything the reasoning backend can call implements [`Tool`]: the local
//! calculator, remote tools behind the gateway, and whole sub-agents.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::{InvocationContext, ResponseEnvelope};
use crate::llm::ToolDefinition;

/// What goes back to the model as a `tool_result` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub output: String,
    pub is_error: bool,
}

impl ToolResult {
    pub fn success(output: impl Into<String>) -> Self {
        Self {
            output: output.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            output: message.into(),
            is_error: true,
        }
    }

    /// A sub-agent's answer: the serialized envelope, flagged when it is an error
    pub fn from_envelope(envelope: &ResponseEnvelope) -> Result<Self> {
        let output = envelope.to_json()?;
        Ok(if envelope.is_success() {
            Self::success(output)
        } else {
            Self::error(output)
        })
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;

    fn description(&self) -> &str;

    fn definition(&self) -> ToolDefinition;

    /// `input` follows the tool's input schema. `ctx` carries the caller's
    /// token, trace span and cancellation.
    ///
    /// `Err` means the tool could not run at all; a tool that ran and failed
    /// returns `Ok(ToolResult::error(..))`.
    async fn execute(&self, input: &Value, ctx: &InvocationContext) -> Result<ToolResult>;
}

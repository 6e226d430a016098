//! Named tools in registration order
//!
//! Order matters: definitions reach the reasoning backend in the order tools
//! were registered, which keeps requests stable across turns.

use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use serde_json::Value;

use super::tool::{Tool, ToolResult};
use crate::core::{AgentError, InvocationContext};
use crate::llm::ToolDefinition;

#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        self.register_arc(Arc::new(tool));
    }

    /// A tool with an already registered name replaces it in place
    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        tracing::info!("[ToolRegistry] Registering tool: {}", tool.name());
        match self.tools.iter_mut().find(|t| t.name() == tool.name()) {
            Some(slot) => *slot = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn get_definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition()).collect()
    }

    /// Unknown names fail with [`AgentError::UnknownTool`]
    pub async fn execute(
        &self,
        name: &str,
        input: &Value,
        ctx: &InvocationContext,
    ) -> Result<ToolResult> {
        let tool = self
            .get(name)
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))?;

        tracing::info!("[ToolRegistry] Executing tool: {}", name);
        tracing::debug!("[ToolRegistry] Input: {}", input);

        let result = tool.execute(input, ctx).await?;
        tracing::debug!("[ToolRegistry] {} done, is_error={}", name, result.is_error);
        Ok(result)
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.tool_names()).finish()
    }
}

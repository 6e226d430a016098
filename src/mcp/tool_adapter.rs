//! Remote Tool Adapter
//!
//! Converts MCP tool listings and call results into the crate's types and
//! exposes each allowed remote tool through the [`Tool`] trait.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::capability::CapabilitySet;
use super::gateway::GatewayConnection;
use crate::core::InvocationContext;
use crate::llm::{ToolDefinition, ToolInputSchema};
use crate::tools::{Tool, ToolResult};

/// A tool as listed by a remote registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub input_schema: Map<String, Value>,
}

impl ToolDescriptor {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        let mut input_schema = Map::new();
        input_schema.insert("type".to_string(), Value::String("object".to_string()));
        Self {
            name: name.into(),
            description: Some(description.into()),
            input_schema,
        }
    }

    pub fn with_input_schema(mut self, schema: Map<String, Value>) -> Self {
        self.input_schema = schema;
        self
    }

    /// Tool definition handed to the reasoning backend
    pub fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name.clone(),
            description: self.description.clone(),
            input_schema: ToolInputSchema::from_json(&self.input_schema),
        }
    }
}

/// Convert an rmcp tool listing entry
pub fn descriptor_from_rmcp(tool: &rmcp::model::Tool) -> ToolDescriptor {
    ToolDescriptor {
        name: tool.name.to_string(),
        description: tool.description.as_ref().map(|d| d.to_string()),
        input_schema: tool.input_schema.as_ref().clone(),
    }
}

/// Convert an rmcp call result, joining all content parts
pub fn result_from_rmcp(rmcp_result: rmcp::model::CallToolResult) -> Result<ToolResult> {
    use rmcp::model::RawContent;

    let is_error = rmcp_result.is_error.unwrap_or(false);
    let mut text_parts = Vec::new();

    for content in rmcp_result.content {
        match &content.raw {
            RawContent::Text(text_content) => {
                text_parts.push(text_content.text.clone());
            }
            RawContent::Image(image_content) => {
                text_parts.push(format!("[image: {}]", image_content.mime_type));
            }
            RawContent::Resource(resource_content) => {
                text_parts.push(serde_json::to_string_pretty(&resource_content.resource)?);
            }
            _ => {
                text_parts.push(serde_json::to_string_pretty(&content)?);
            }
        }
    }

    let output = text_parts.join("\n\n");

    if is_error {
        Ok(ToolResult::error(output))
    } else {
        Ok(ToolResult::success(output))
    }
}

/// An allow-listed remote tool bound to an open gateway session
pub struct RemoteTool {
    descriptor: ToolDescriptor,
    definition: ToolDefinition,
    connection: Arc<dyn GatewayConnection>,
    capabilities: Arc<CapabilitySet>,
}

impl RemoteTool {
    pub fn new(
        descriptor: ToolDescriptor,
        connection: Arc<dyn GatewayConnection>,
        capabilities: Arc<CapabilitySet>,
    ) -> Self {
        let definition = descriptor.to_definition();
        Self {
            descriptor,
            definition,
            connection,
            capabilities,
        }
    }

    pub fn descriptor(&self) -> &ToolDescriptor {
        &self.descriptor
    }
}

impl std::fmt::Debug for RemoteTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteTool")
            .field("name", &self.descriptor.name)
            .finish()
    }
}

#[async_trait]
impl Tool for RemoteTool {
    fn name(&self) -> &str {
        &self.descriptor.name
    }

    fn description(&self) -> &str {
        self.descriptor
            .description
            .as_deref()
            .unwrap_or("Remote tool (no description)")
    }

    fn definition(&self) -> ToolDefinition {
        self.definition.clone()
    }

    async fn execute(&self, input: &Value, _ctx: &InvocationContext) -> Result<ToolResult> {
        tracing::debug!("[RemoteTool] {} input: {}", self.descriptor.name, input);
        self.capabilities.check(&self.descriptor.name)?;

        let arguments = input.as_object().cloned().unwrap_or_default();
        let result = self
            .connection
            .call_tool(&self.descriptor.name, arguments)
            .await?;

        tracing::debug!(
            "[RemoteTool] Tool '{}' completed. Is error: {}",
            self.descriptor.name,
            result.is_error
        );

        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_from_rmcp() {
        use rmcp::model::Tool as RmcpTool;

        let input_schema: Map<String, Value> = serde_json::from_value(json!({
            "type": "object",
            "properties": {
                "order_id": {
                    "type": "string",
                    "description": "Order to fetch"
                }
            },
            "required": ["order_id"]
        }))
        .unwrap();

        let rmcp_tool = RmcpTool::new("get_order", "Fetch an order", Arc::new(input_schema));

        let descriptor = descriptor_from_rmcp(&rmcp_tool);
        assert_eq!(descriptor.name, "get_order");
        assert_eq!(descriptor.description.as_deref(), Some("Fetch an order"));

        let definition = descriptor.to_definition();
        assert_eq!(definition.input_schema.required, Some(vec!["order_id".to_string()]));
    }

    #[test]
    fn test_result_from_rmcp_joins_text() {
        use rmcp::model::{CallToolResult, Content};

        let result = CallToolResult::success(vec![
            Content::text("Order #123"),
            Content::text("shipped"),
        ]);
        let converted = result_from_rmcp(result).unwrap();
        assert_eq!(converted, ToolResult::success("Order #123\n\nshipped"));

        let failed = CallToolResult::error(vec![Content::text("not found")]);
        let converted = result_from_rmcp(failed).unwrap();
        assert!(converted.is_error);
        assert_eq!(converted.output, "not found");
    }
}

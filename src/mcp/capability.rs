//! Per-role tool allow-lists

use std::sync::Arc;

use super::gateway::GatewayConnection;
use super::tool_adapter::{RemoteTool, ToolDescriptor};
use crate::core::{AgentError, AgentResult};

/// The fixed set of remote tool names a role may use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilitySet {
    role: String,
    allowed: Vec<String>,
}

impl CapabilitySet {
    pub fn new(role: impl Into<String>, allowed: &[&str]) -> Self {
        Self {
            role: role.into(),
            allowed: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn allowed(&self) -> &[String] {
        &self.allowed
    }

    pub fn allows(&self, name: &str) -> bool {
        self.allowed.iter().any(|a| a == name)
    }

    /// Remote calls go through this before reaching the service
    pub fn check(&self, name: &str) -> AgentResult<()> {
        if self.allows(name) {
            Ok(())
        } else {
            Err(AgentError::UnknownTool(name.to_string()))
        }
    }

    /// Keep only allow-listed tools, in the order the service listed them.
    ///
    /// Allowed names the service did not list are logged and skipped.
    pub fn resolve(
        &self,
        listed: Vec<ToolDescriptor>,
        connection: Arc<dyn GatewayConnection>,
    ) -> Vec<RemoteTool> {
        let shared = Arc::new(self.clone());
        let mut tools = Vec::new();

        for descriptor in listed {
            if self.allows(&descriptor.name) {
                tools.push(RemoteTool::new(descriptor, connection.clone(), shared.clone()));
            } else {
                tracing::debug!(
                    "[{}] Dropping tool '{}' (not in allow-list)",
                    self.role,
                    descriptor.name
                );
            }
        }

        for name in &self.allowed {
            if !tools.iter().any(|t| &t.descriptor().name == name) {
                tracing::warn!("[{}] Allowed tool '{}' not offered by service", self.role, name);
            }
        }

        tools
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::InMemoryConnector;
    use crate::mcp::{GatewayConfig, ToolGateway};
    use crate::core::{InvocationContext, TraceContext};
    use crate::tools::{Tool, ToolResult};
    use serde_json::json;

    #[test]
    fn test_check() {
        let caps = CapabilitySet::new("order", &["get_order", "create_order"]);
        assert!(caps.allows("get_order"));
        assert!(caps.check("create_order").is_ok());
        assert!(matches!(
            caps.check("delete_order"),
            Err(AgentError::UnknownTool(name)) if name == "delete_order"
        ));
    }

    #[tokio::test]
    async fn test_resolve_filters_and_keeps_order() {
        let connector = Arc::new(
            InMemoryConnector::new()
                .with_tool("update_order", "", |_| Ok(ToolResult::success("u")))
                .with_tool("drop_tables", "", |_| Ok(ToolResult::success("!")))
                .with_tool("get_order", "", |_| Ok(ToolResult::success("g"))),
        );
        let gateway = ToolGateway::new(GatewayConfig::new("order", "mem://order"), connector);
        let session = gateway.open(&TraceContext::new_root()).await.unwrap();

        let caps = CapabilitySet::new("order", &["get_order", "update_order", "create_order"]);
        let tools = caps.resolve(session.list_tools().await.unwrap(), session.connection());
        let names: Vec<_> = tools.iter().map(|t| t.descriptor().name.as_str()).collect();
        assert_eq!(names, vec!["update_order", "get_order"]);

        session.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_remote_tool_rejects_name_outside_allow_list() {
        let connector = Arc::new(
            InMemoryConnector::new().with_tool("drop_tables", "", |_| Ok(ToolResult::success("!"))),
        );
        let gateway = ToolGateway::new(GatewayConfig::new("order", "mem://order"), connector.clone());
        let session = gateway.open(&TraceContext::new_root()).await.unwrap();
        let listed = session.list_tools().await.unwrap();

        let caps = Arc::new(CapabilitySet::new("order", &["get_order"]));
        let tool = RemoteTool::new(listed[0].clone(), session.connection(), caps);

        let ctx = InvocationContext::new("s");
        let err = tool.execute(&json!({}), &ctx).await.unwrap_err();
        assert_eq!(err.to_string(), "Unknown tool: drop_tables");
        assert!(connector.calls().is_empty());

        session.close().await.unwrap();
    }
}

//! Sub-Agent
//!
//! A specialized agent (order, inventory) that answers one query by running a
//! bounded tool-call chain against its remote tool registry. Every outcome is
//! reported as a [`ResponseEnvelope`]; the gateway session opened for the
//! invocation is closed on every path.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::time::timeout;

use super::agent_loop::{AgentLoop, LoopLimits};
use super::role::AgentRole;
use crate::core::{AgentError, AgentResult, InvocationContext, ResponseEnvelope, SecurityContext};
use crate::hooks::{CallGuard, HookRegistry};
use crate::llm::{LlmProvider, Message, ToolDefinition, ToolInputSchema};
use crate::mcp::{GatewaySession, ToolGateway};
use crate::tools::{Tool, ToolRegistry, ToolResult};

/// Build the text handed to the sub-agent's reasoning loop
pub fn compose_query(query: &str, security: &SecurityContext) -> AgentResult<String> {
    let context = serde_json::to_string(security)?;
    Ok(format!(
        "User query: {query}\n\
         Context: {context}\n\
         If a tool is required, call it once. Never call the same tool twice. \
         Stop immediately after a successful tool result and return the final answer."
    ))
}

pub struct SubAgent {
    role: AgentRole,
    llm: Arc<dyn LlmProvider>,
    gateway: ToolGateway,
    limits: LoopLimits,
    invocation_timeout: Duration,
}

impl SubAgent {
    pub fn new(role: AgentRole, llm: Arc<dyn LlmProvider>, gateway: ToolGateway) -> Self {
        Self {
            role,
            llm,
            gateway,
            limits: LoopLimits::default(),
            invocation_timeout: Duration::from_secs(180),
        }
    }

    pub fn with_limits(mut self, limits: LoopLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_invocation_timeout(mut self, invocation_timeout: Duration) -> Self {
        self.invocation_timeout = invocation_timeout;
        self
    }

    pub fn role(&self) -> &AgentRole {
        &self.role
    }

    /// Answer one query. Never fails: faults are folded into the envelope.
    pub async fn handle(&self, query: &str, ctx: &InvocationContext) -> ResponseEnvelope {
        tracing::info!("[SubAgent:{}] Routed query", self.role.name);

        let envelope = match self.invoke(query, ctx).await {
            Ok(text) if !text.trim().is_empty() => ResponseEnvelope::success(text),
            Ok(_) => {
                tracing::error!("[SubAgent:{}] Empty result", self.role.name);
                ResponseEnvelope::from_error(&AgentError::EmptyResult)
            }
            Err(e) => {
                tracing::error!("[SubAgent:{}] {}", self.role.name, e);
                ResponseEnvelope::from_error(&e)
            }
        };

        tracing::debug!("[SubAgent:{}] Envelope: {:?}", self.role.name, envelope);
        envelope
    }

    async fn invoke(&self, query: &str, ctx: &InvocationContext) -> AgentResult<String> {
        let token = ctx.token().ok_or(AgentError::AuthMissing)?;

        let child = ctx.child_span();
        let mut security = SecurityContext::new(token, &child.trace);
        if self.role.attach_request_id {
            security = security.with_request_id();
        }

        let session = self.gateway.open(&child.trace).await?;

        let result = tokio::select! {
            biased;
            _ = child.cancel.cancelled() => Err(AgentError::Cancelled),
            outcome = timeout(
                self.invocation_timeout,
                self.run_with_session(&session, query, &security, &child),
            ) => outcome.unwrap_or_else(|_| {
                Err(AgentError::timeout(
                    format!("{} invocation", self.role.tool_name),
                    self.invocation_timeout,
                ))
            }),
        };

        if let Err(e) = session.close().await {
            tracing::warn!("[SubAgent:{}] Failed to close gateway session: {}", self.role.name, e);
        }

        result
    }

    async fn run_with_session(
        &self,
        session: &GatewaySession,
        query: &str,
        security: &SecurityContext,
        ctx: &InvocationContext,
    ) -> AgentResult<String> {
        let listed = session.list_tools().await?;
        let remote = self
            .role
            .capabilities
            .resolve(listed, session.connection());

        let mut tools = ToolRegistry::new();
        for tool in remote {
            tools.register(tool);
        }
        tracing::info!(
            "[SubAgent:{}] Available tools: {:?}",
            self.role.name,
            tools.tool_names()
        );

        let guard = Arc::new(CallGuard::new(&self.role.name, self.role.max_tool_calls));
        let mut hooks = HookRegistry::new();
        guard.install(&mut hooks);

        let agent = AgentLoop::new(
            &self.role.name,
            self.llm.clone(),
            &self.role.instructions,
            tools,
        )
        .with_hooks(hooks)
        .with_limits(self.limits);

        let input = compose_query(query, security)?;
        let outcome = agent.run(vec![Message::user(input)], ctx).await;

        if let Some(last) = guard.last_tool() {
            tracing::debug!("[SubAgent:{}] Last tool: {}", self.role.name, last);
        }

        Ok(outcome?.text)
    }
}

#[async_trait]
impl Tool for SubAgent {
    fn name(&self) -> &str {
        &self.role.tool_name
    }

    fn description(&self) -> &str {
        &self.role.description
    }

    fn definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.role.tool_name.clone(),
            description: Some(self.role.description.clone()),
            input_schema: ToolInputSchema::new()
                .with_properties(json!({
                    "query": {
                        "type": "string",
                        "description": "The user's request, restated with every identifier it mentions"
                    }
                }))
                .with_required(&["query"]),
        }
    }

    async fn execute(&self, input: &Value, ctx: &InvocationContext) -> Result<ToolResult> {
        let query = input
            .get("query")
            .and_then(|v| v.as_str())
            .ok_or_else(|| anyhow::anyhow!("Missing required parameter: query"))?;

        let envelope = self.handle(query, ctx).await;
        ToolResult::from_envelope(&envelope)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::envelope::AUTH_MISSING_REASON;
    use crate::llm::ScriptedProvider;
    use crate::mcp::{GatewayConfig, InMemoryConnector};

    fn order_service() -> Arc<InMemoryConnector> {
        Arc::new(
            InMemoryConnector::new()
                .with_tool("get_order", "Fetch an order", |args| {
                    let id = args.get("order_id").and_then(|v| v.as_str()).unwrap_or("?");
                    Ok(ToolResult::success(format!("{{\"order_id\":\"{id}\",\"status\":\"shipped\"}}")))
                })
                .with_tool("delete_everything", "Not allowed", |_| {
                    Ok(ToolResult::success("deleted"))
                }),
        )
    }

    fn order_agent(llm: Arc<ScriptedProvider>, connector: Arc<InMemoryConnector>) -> SubAgent {
        let gateway = ToolGateway::new(GatewayConfig::new("order", "mem://order"), connector);
        SubAgent::new(AgentRole::order(), llm, gateway)
    }

    #[test]
    fn test_compose_query_embeds_context() {
        let security = SecurityContext::new("jwt-1", &crate::core::TraceContext::new_root());
        let text = compose_query("get order 1", &security).unwrap();
        assert!(text.starts_with("User query: get order 1\n"));
        assert!(text.contains("\"jwt\":\"jwt-1\""));
        assert!(text.contains("Never call the same tool twice"));
    }

    #[tokio::test]
    async fn test_missing_token_opens_nothing() {
        let llm = Arc::new(ScriptedProvider::new().then_text("unused"));
        let connector = order_service();
        let agent = order_agent(llm.clone(), connector.clone());

        let envelope = agent.handle("get order 1", &InvocationContext::new("s")).await;
        assert_eq!(envelope, ResponseEnvelope::error(AUTH_MISSING_REASON));
        assert_eq!(connector.opens(), 0);
        assert!(llm.requests().is_empty());
    }

    #[tokio::test]
    async fn test_success_filters_tools_and_closes() {
        let llm = Arc::new(
            ScriptedProvider::new()
                .then_tool("get_order", json!({"order_id": "123"}))
                .then_text("Order #123: shipped"),
        );
        let connector = order_service();
        let agent = order_agent(llm.clone(), connector.clone());
        let ctx = InvocationContext::new("s").with_token(Some("jwt-1"));

        let envelope = agent.handle("where is order 123", &ctx).await;
        assert_eq!(envelope, ResponseEnvelope::success("Order #123: shipped"));

        let requests = llm.requests();
        assert_eq!(requests[0].tool_names, vec!["get_order"]);
        let input = requests[0].messages[0].text().unwrap_or_default().to_string();
        assert!(input.contains("x-request-id"));

        assert_eq!(connector.calls().len(), 1);
        assert_eq!(connector.opens(), 1);
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test]
    async fn test_empty_answer_is_error_envelope() {
        let llm = Arc::new(ScriptedProvider::new().then_text("   "));
        let connector = order_service();
        let agent = order_agent(llm, connector.clone());
        let ctx = InvocationContext::new("s").with_token(Some("jwt-1"));

        let envelope = agent.handle("hello", &ctx).await;
        assert_eq!(envelope, ResponseEnvelope::from_error(&AgentError::EmptyResult));
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test]
    async fn test_backend_failure_still_closes() {
        let llm = Arc::new(ScriptedProvider::new());
        let connector = order_service();
        let agent = order_agent(llm, connector.clone());
        let ctx = InvocationContext::new("s").with_token(Some("jwt-1"));

        let envelope = agent.handle("hello", &ctx).await;
        assert!(!envelope.is_success());
        assert!(envelope.message().starts_with("Error processing your query: "));
        assert_eq!(connector.opens(), 1);
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test]
    async fn test_as_tool_serializes_envelope() {
        let llm = Arc::new(ScriptedProvider::new().then_text("pong"));
        let agent = order_agent(llm, order_service());
        let ctx = InvocationContext::new("s").with_token(Some("jwt-1"));

        let result = agent.execute(&json!({"query": "ping"}), &ctx).await.unwrap();
        assert_eq!(result.output, r#"{"status":"success","response":"pong"}"#);
        assert!(!result.is_error);

        assert!(agent.execute(&json!({}), &ctx).await.is_err());
    }
}

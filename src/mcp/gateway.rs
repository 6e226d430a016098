//! Tool Gateway
//!
//! Scoped access to a remote tool registry. Every sub-agent invocation opens
//! its own [`GatewaySession`], with the current trace headers injected into the
//! outgoing requests, and must close it on every exit path.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rmcp::model::{CallToolRequestParams, ListToolsResult};
use rmcp::service::RunningService;
use rmcp::transport::{
    streamable_http_client::StreamableHttpClientTransportConfig, StreamableHttpClientTransport,
};
use rmcp::{RoleClient, ServiceExt};
use serde_json::{Map, Value};
use tokio::sync::RwLock;
use tokio::time::timeout;

use super::config::GatewayConfig;
use super::tool_adapter::{descriptor_from_rmcp, result_from_rmcp, ToolDescriptor};
use crate::core::{AgentError, AgentResult, TraceContext};
use crate::tools::ToolResult;

/// The concrete transport type we use for HTTP MCP connections
pub type HttpClientTransport = StreamableHttpClientTransport<reqwest::Client>;

/// A live connection to one tool service
#[async_trait]
pub trait GatewayConnection: Send + Sync {
    /// List tools in the order the service reports them
    async fn list_tools(&self) -> AgentResult<Vec<ToolDescriptor>>;

    /// Invoke a tool by name
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>)
        -> AgentResult<ToolResult>;

    /// Release the connection; later calls fail
    async fn close(&self) -> AgentResult<()>;
}

/// Opens connections with a given set of outgoing headers
#[async_trait]
pub trait GatewayConnector: Send + Sync {
    async fn connect(
        &self,
        config: &GatewayConfig,
        headers: &BTreeMap<String, String>,
    ) -> AgentResult<Arc<dyn GatewayConnection>>;
}

// ============================================================================
// ToolGateway / GatewaySession
// ============================================================================

/// Per-sub-agent handle to a remote tool registry
#[derive(Clone)]
pub struct ToolGateway {
    config: GatewayConfig,
    connector: Arc<dyn GatewayConnector>,
}

impl std::fmt::Debug for ToolGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolGateway")
            .field("id", &self.config.id)
            .field("uri", &self.config.uri)
            .finish()
    }
}

impl ToolGateway {
    pub fn new(config: GatewayConfig, connector: Arc<dyn GatewayConnector>) -> Self {
        Self { config, connector }
    }

    /// Gateway over MCP streamable HTTP
    pub fn rmcp(config: GatewayConfig) -> Self {
        Self::new(config, Arc::new(RmcpConnector))
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.config
    }

    /// Inject trace headers and connect
    pub async fn open(&self, trace: &TraceContext) -> AgentResult<GatewaySession> {
        let mut headers = self.config.headers.clone();
        trace.inject(&mut headers);

        tracing::info!(
            "[ToolGateway] Opening session to '{}' at {} (trace {})",
            self.config.id,
            self.config.uri,
            trace.trace_id()
        );

        let connect = self.connector.connect(&self.config, &headers);
        let connection = timeout(self.config.timeout(), connect)
            .await
            .map_err(|_| {
                AgentError::timeout(format!("connect to '{}'", self.config.id), self.config.timeout())
            })??;

        Ok(GatewaySession {
            server_id: self.config.id.clone(),
            connection,
            closed: false,
        })
    }
}

/// An open gateway session; call [`close`](Self::close) when done
pub struct GatewaySession {
    server_id: String,
    connection: Arc<dyn GatewayConnection>,
    closed: bool,
}

impl GatewaySession {
    pub fn server_id(&self) -> &str {
        &self.server_id
    }

    pub async fn list_tools(&self) -> AgentResult<Vec<ToolDescriptor>> {
        self.connection.list_tools().await
    }

    pub async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> AgentResult<ToolResult> {
        self.connection.call_tool(name, arguments).await
    }

    /// Shared handle for tools bound to this session
    pub fn connection(&self) -> Arc<dyn GatewayConnection> {
        self.connection.clone()
    }

    pub async fn close(mut self) -> AgentResult<()> {
        self.closed = true;
        tracing::info!("[ToolGateway] Closing session to '{}'", self.server_id);
        self.connection.close().await
    }
}

impl Drop for GatewaySession {
    fn drop(&mut self) {
        if !self.closed {
            tracing::warn!(
                "[ToolGateway] Session to '{}' dropped without close",
                self.server_id
            );
        }
    }
}

// ============================================================================
// rmcp streamable HTTP implementation
// ============================================================================

/// Connects over MCP streamable HTTP with the given headers as client defaults
#[derive(Debug, Default, Clone, Copy)]
pub struct RmcpConnector;

fn header_map(headers: &BTreeMap<String, String>) -> AgentResult<HeaderMap> {
    let mut map = HeaderMap::new();
    for (name, value) in headers {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| AgentError::gateway(format!("invalid header name '{}': {}", name, e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| {
                AgentError::gateway(format!("invalid value for header '{}': {}", name.as_str(), e))
            })?;
        map.insert(name, value);
    }
    Ok(map)
}

#[async_trait]
impl GatewayConnector for RmcpConnector {
    async fn connect(
        &self,
        config: &GatewayConfig,
        headers: &BTreeMap<String, String>,
    ) -> AgentResult<Arc<dyn GatewayConnection>> {
        let client = reqwest::Client::builder()
            .default_headers(header_map(headers)?)
            .build()
            .map_err(|e| AgentError::gateway(format!("failed to build HTTP client: {}", e)))?;

        let transport_config = StreamableHttpClientTransportConfig::with_uri(config.uri.clone());
        let transport: HttpClientTransport =
            HttpClientTransport::with_client(client, transport_config);

        let service = ().serve(transport).await.map_err(|e| {
            AgentError::gateway(format!("failed to connect to '{}': {}", config.id, e))
        })?;

        tracing::debug!("[RmcpConnection] Connected to '{}'", config.id);

        Ok(Arc::new(RmcpConnection {
            id: config.id.clone(),
            timeout: config.timeout(),
            service: RwLock::new(Some(service)),
        }))
    }
}

/// Wrapper around an rmcp service connection
pub struct RmcpConnection {
    id: String,
    timeout: Duration,
    service: RwLock<Option<RunningService<RoleClient, ()>>>,
}

#[async_trait]
impl GatewayConnection for RmcpConnection {
    async fn list_tools(&self) -> AgentResult<Vec<ToolDescriptor>> {
        let service_guard = self.service.read().await;
        let service = service_guard
            .as_ref()
            .ok_or_else(|| AgentError::gateway(format!("session to '{}' is closed", self.id)))?;

        let result: ListToolsResult = timeout(self.timeout, service.list_tools(Default::default()))
            .await
            .map_err(|_| AgentError::timeout(format!("list tools on '{}'", self.id), self.timeout))?
            .map_err(|e| AgentError::gateway(format!("list tools on '{}': {}", self.id, e)))?;

        tracing::info!(
            "[RmcpConnection] Got {} tools from '{}'",
            result.tools.len(),
            self.id
        );

        Ok(result.tools.iter().map(descriptor_from_rmcp).collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> AgentResult<ToolResult> {
        let service_guard = self.service.read().await;
        let service = service_guard
            .as_ref()
            .ok_or_else(|| AgentError::gateway(format!("session to '{}' is closed", self.id)))?;

        tracing::info!("[RmcpConnection] Calling tool '{}' on '{}'", name, self.id);

        let call = service.call_tool(CallToolRequestParams {
            meta: None,
            name: name.to_string().into(),
            arguments: Some(arguments),
            task: None,
        });

        let result = timeout(self.timeout, call)
            .await
            .map_err(|_| AgentError::timeout(format!("tool '{}'", name), self.timeout))?
            .map_err(|e| AgentError::ToolFault {
                tool: name.to_string(),
                message: e.to_string(),
            })?;

        result_from_rmcp(result).map_err(|e| AgentError::ToolFault {
            tool: name.to_string(),
            message: e.to_string(),
        })
    }

    async fn close(&self) -> AgentResult<()> {
        let service = self.service.write().await.take();
        if let Some(service) = service {
            service
                .cancel()
                .await
                .map_err(|e| AgentError::gateway(format!("close '{}': {}", self.id, e)))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::trace::TRACEPARENT_HEADER;
    use crate::mcp::InMemoryConnector;
    use serde_json::json;

    #[test]
    fn test_header_map_rejects_invalid_names() {
        let mut headers = BTreeMap::new();
        headers.insert("bad header".to_string(), "x".to_string());
        assert!(header_map(&headers).is_err());

        let mut headers = BTreeMap::new();
        headers.insert(TRACEPARENT_HEADER.to_string(), "00-abc-def-01".to_string());
        assert_eq!(header_map(&headers).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_injects_trace_headers() {
        let connector = Arc::new(InMemoryConnector::new().with_tool(
            "get_order",
            "Fetch an order",
            |_args| Ok(ToolResult::success("ok")),
        ));
        let gateway = ToolGateway::new(
            GatewayConfig::new("order", "mem://order").with_header("x-static", "1"),
            connector.clone(),
        );

        let trace = TraceContext::new_root();
        let session = gateway.open(&trace).await.unwrap();
        let headers = connector.last_headers().unwrap();
        assert_eq!(headers[TRACEPARENT_HEADER], trace.traceparent());
        assert_eq!(headers["x-static"], "1");

        let tools = session.list_tools().await.unwrap();
        assert_eq!(tools[0].name, "get_order");

        let result = session.call_tool("get_order", Map::new()).await.unwrap();
        assert_eq!(result.output, "ok");

        session.close().await.unwrap();
        assert_eq!(connector.opens(), 1);
        assert_eq!(connector.closes(), 1);
    }

    #[tokio::test]
    async fn test_closed_connection_rejects_calls() {
        let connector = Arc::new(InMemoryConnector::new().with_tool("ping", "", |_args| {
            Ok(ToolResult::success("pong"))
        }));
        let gateway = ToolGateway::new(GatewayConfig::new("svc", "mem://svc"), connector);

        let session = gateway.open(&TraceContext::new_root()).await.unwrap();
        let connection = session.connection();
        session.close().await.unwrap();

        let err = connection
            .call_tool("ping", json!({}).as_object().cloned().unwrap_or_default())
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::Gateway(_)));
    }
}

//! MCP (Model Context Protocol) Support
//!
//! Sub-agents reach their remote tool registries through a [`ToolGateway`].
//!
//! # Architecture
//!
//! - `ToolGateway`: opens a [`GatewaySession`] per invocation with trace headers injected
//! - `GatewayConnector` / `GatewayConnection`: transport seam (rmcp streamable HTTP or in-memory)
//! - `CapabilitySet`: the fixed allow-list of remote tool names for one role
//! - `RemoteTool`: adapts an allowed remote tool to the `Tool` trait
//!
//! # Usage
//!
//! ```ignore
//! use commerce_orchestrator::mcp::{CapabilitySet, GatewayConfig, ToolGateway};
//!
//! let gateway = ToolGateway::rmcp(GatewayConfig::new("order", "http://localhost:9001/mcp"));
//! let session = gateway.open(&ctx.trace).await?;
//! let caps = CapabilitySet::new("order", &["get_order"]);
//! let tools = caps.resolve(session.list_tools().await?, session.connection());
//! // ... run the agent ...
//! session.close().await?;
//! ```

mod capability;
mod config;
mod gateway;
mod memory;
mod tool_adapter;

pub use capability::CapabilitySet;
pub use config::GatewayConfig;
pub use gateway::{
    GatewayConnection, GatewayConnector, GatewaySession, HttpClientTransport, RmcpConnection,
    RmcpConnector, ToolGateway,
};
pub use memory::{InMemoryConnector, RecordedCall};
pub use tool_adapter::{descriptor_from_rmcp, result_from_rmcp, RemoteTool, ToolDescriptor};

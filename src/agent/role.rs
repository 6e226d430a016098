//! Sub-agent role definitions

use crate::hooks::DEFAULT_MAX_TOOL_CALLS;
use crate::mcp::CapabilitySet;

use super::system_prompt::{inventory_prompt, order_prompt};

pub const ORDER_AGENT_TOOL: &str = "order_agent";
pub const INVENTORY_AGENT_TOOL: &str = "inventory_agent";

pub const ORDER_TOOLS: &[&str] = &[
    "order_health",
    "get_order",
    "create_order",
    "checkout_order",
    "update_order",
];

pub const INVENTORY_TOOLS: &[&str] = &[
    "inventory_healthy",
    "get_inventory",
    "create_inventory",
    "get_product",
    "update_inventory",
];

/// Everything that distinguishes one sub-agent from another
#[derive(Debug, Clone)]
pub struct AgentRole {
    /// Name used in logs and hook contexts
    pub name: String,

    /// Name under which the orchestrator sees this sub-agent
    pub tool_name: String,

    /// Tool description shown to the orchestrator's backend
    pub description: String,

    pub instructions: String,

    pub capabilities: CapabilitySet,

    /// Tool calls allowed per invocation
    pub max_tool_calls: u32,

    /// Attach a fresh `x-request-id` to every invocation's security context
    pub attach_request_id: bool,
}

impl AgentRole {
    pub fn order() -> Self {
        Self {
            name: "order".to_string(),
            tool_name: ORDER_AGENT_TOOL.to_string(),
            description: "Process and respond to all ORDER queries: get an order and its details, \
                create, checkout or update an order, and check order service health."
                .to_string(),
            instructions: order_prompt(),
            capabilities: CapabilitySet::new("order", ORDER_TOOLS),
            max_tool_calls: DEFAULT_MAX_TOOL_CALLS,
            attach_request_id: true,
        }
    }

    pub fn inventory() -> Self {
        Self {
            name: "inventory".to_string(),
            tool_name: INVENTORY_AGENT_TOOL.to_string(),
            description: "Process and respond to all INVENTORY queries: product details, create a \
                product and its inventory, get or update inventory quantities, and check inventory \
                service health."
                .to_string(),
            instructions: inventory_prompt(),
            capabilities: CapabilitySet::new("inventory", INVENTORY_TOOLS),
            max_tool_calls: DEFAULT_MAX_TOOL_CALLS,
            attach_request_id: false,
        }
    }

    pub fn with_max_tool_calls(mut self, max_tool_calls: u32) -> Self {
        self.max_tool_calls = max_tool_calls;
        self
    }

    pub fn with_request_id(mut self, attach: bool) -> Self {
        self.attach_request_id = attach;
        self
    }
}

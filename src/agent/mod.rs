//! Agents
//!
//! - `AgentLoop` - the reasoning loop shared by every agent
//! - `SubAgent` - order / inventory agents behind a tool gateway, exposed as tools
//! - `Orchestrator` - the top-level agent that owns the conversation

pub mod agent_loop;
pub mod orchestrator;
pub mod role;
pub mod sub_agent;
pub mod system_prompt;
pub mod thinking;

pub use agent_loop::{AgentLoop, LoopLimits, LoopOutcome};
pub use orchestrator::{Orchestrator, MAIN_AGENT_NAME};
pub use role::{AgentRole, INVENTORY_AGENT_TOOL, INVENTORY_TOOLS, ORDER_AGENT_TOOL, ORDER_TOOLS};
pub use sub_agent::{compose_query, SubAgent};
pub use system_prompt::{inventory_prompt, main_prompt, order_prompt};
pub use thinking::strip_thinking;

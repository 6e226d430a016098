//! Tool system
//!
//! This module provides:
//! - `Tool` trait - Interface shared by local tools, remote tools and sub-agents
//! - `ToolResult` - Result type for tool execution
//! - `ToolRegistry` - Registry for managing available tools
//! - `CalculatorTool` - General arithmetic

mod calculator;
mod registry;
mod tool;

pub use calculator::{evaluate, format_number, CalcError, CalculatorTool, CALCULATOR_TOOL_NAME};
pub use registry::ToolRegistry;
pub use tool::{Tool, ToolResult};

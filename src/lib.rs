pub mod core;
pub mod session;
pub mod tools;

// Model backends
pub mod llm;

// Hooks for intercepting agent behavior
pub mod hooks;

// MCP (Model Context Protocol) gateway to the order and inventory services
pub mod mcp;

// Orchestrator and sub-agents
pub mod agent;

// Process wiring
pub mod cli;
pub mod config;
pub mod logging;

//! Error types shared by the orchestrator, sub-agents and tool gateway

use thiserror::Error;

/// Errors that can occur while handling a turn
#[derive(Error, Debug)]
pub enum AgentError {
    /// No identity token present for a tool-bearing path
    #[error("No JWT token available")]
    AuthMissing,

    /// The call guard stopped the invocation
    #[error("{0}")]
    LoopGuardTripped(String),

    /// A remote tool call failed
    #[error("Tool '{tool}' failed: {message}")]
    ToolFault { tool: String, message: String },

    /// The reasoning backend produced no usable text
    #[error("Empty result from reasoning backend")]
    EmptyResult,

    /// A tool name outside the role's allow-list
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// An operation exceeded its time budget
    #[error("{operation} timed out after {secs}s")]
    Timeout { operation: String, secs: u64 },

    /// The turn was cancelled
    #[error("Operation cancelled")]
    Cancelled,

    /// Connection-level failure talking to a tool service
    #[error("Gateway error: {0}")]
    Gateway(String),

    /// Failure talking to the reasoning backend
    #[error("LLM error: {0}")]
    Llm(String),

    /// Invalid or missing configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl AgentError {
    /// Create a generic error from a string
    pub fn other(msg: impl Into<String>) -> Self {
        AgentError::Other(msg.into())
    }

    /// Create a gateway error
    pub fn gateway(msg: impl Into<String>) -> Self {
        AgentError::Gateway(msg.into())
    }

    /// Create a timeout error for a named operation
    pub fn timeout(operation: impl Into<String>, duration: std::time::Duration) -> Self {
        AgentError::Timeout {
            operation: operation.into(),
            secs: duration.as_secs(),
        }
    }
}

/// Result type alias for agent operations
pub type AgentResult<T> = Result<T, AgentError>;

pub mod anthropic;
pub mod auth;
pub mod provider;
pub mod scripted;
pub mod types;

pub use anthropic::AnthropicProvider;
pub use auth::AuthConfig;
pub use provider::LlmProvider;
pub use scripted::{RecordedRequest, ScriptedProvider};
pub use types::{
    ContentBlock, Message, MessageContent, MessageRequest, MessageResponse, Role, StopReason,
    ToolCall, ToolDefinition, ToolInputSchema, Usage,
};

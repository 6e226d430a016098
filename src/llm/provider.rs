//! LLM Provider trait
//!
//! Abstracts the reasoning backend so the agent loop can run against a real
//! HTTP endpoint or a scripted stub.

use anyhow::Result;

use super::types::{Message, MessageResponse, ToolDefinition};

/// Trait for reasoning backends used by [`AgentLoop`](crate::agent::AgentLoop).
///
/// Output is non-deterministic for real backends; tests use
/// [`ScriptedProvider`](super::ScriptedProvider).
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a request with tools and system prompt, returning the full response.
    async fn send_with_tools(
        &self,
        messages: Vec<Message>,
        system: Option<&str>,
        tools: Vec<ToolDefinition>,
    ) -> Result<MessageResponse>;

    /// Get the current model name.
    fn model(&self) -> String;

    /// Get the provider name (e.g., "anthropic", "scripted").
    fn provider_name(&self) -> &str;
}

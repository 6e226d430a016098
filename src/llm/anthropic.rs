//! Messages API provider over reqwest
//!
//! Non-streaming: the orchestrator only ever shows the final answer.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;

use super::auth::AuthConfig;
use super::provider::LlmProvider;
use super::types::{ApiError, Message, MessageRequest, MessageResponse, ToolDefinition};

const API_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Reasoning backend speaking the Messages API
pub struct AnthropicProvider {
    client: Client,
    auth: AuthConfig,
    model: String,
    max_tokens: u32,
    temperature: f32,
    region: Option<String>,
}

impl AnthropicProvider {
    /// Create a provider for `model`; `timeout` bounds every HTTP request
    pub fn new(auth: AuthConfig, model: impl Into<String>, timeout: Duration) -> Result<Self> {
        let model = model.into();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client for LLM provider")?;

        tracing::info!("[Anthropic] Using model: {}", model);
        tracing::info!("[Anthropic] Endpoint: {}", auth.endpoint());

        Ok(Self {
            client,
            auth,
            model,
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: 0.0,
            region: None,
        })
    }

    /// Set the max tokens for responses
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Region hint forwarded to regional gateways
    pub fn with_region(mut self, region: Option<String>) -> Self {
        self.region = region;
        self
    }

    fn build_request(
        &self,
        messages: Vec<Message>,
        system: Option<&str>,
        tools: Vec<ToolDefinition>,
    ) -> MessageRequest {
        MessageRequest {
            model: self.model.clone(),
            max_tokens: self.max_tokens,
            messages,
            system: system.map(str::to_string),
            tools,
            temperature: self.temperature,
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    async fn send_with_tools(
        &self,
        messages: Vec<Message>,
        system: Option<&str>,
        tools: Vec<ToolDefinition>,
    ) -> Result<MessageResponse> {
        let request = self.build_request(messages, system, tools);
        tracing::debug!(
            "[Anthropic] Sending {} messages with {} tools",
            request.messages.len(),
            request.tools.len()
        );

        let mut request_builder = self
            .client
            .post(self.auth.endpoint())
            .header("content-type", "application/json")
            .header("x-api-key", &self.auth.api_key)
            .header("anthropic-version", API_VERSION);

        if let Some(region) = &self.region {
            request_builder = request_builder.header("x-region", region);
        }

        let response = request_builder
            .json(&request)
            .send()
            .await
            .context("Failed to send request to Messages API")?;

        let status = response.status();
        let response_text = response
            .text()
            .await
            .context("Failed to read Messages API response body")?;

        tracing::debug!("[Anthropic] Response status: {}", status);

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&response_text)
                .map(|e| format!("{}: {}", e.error.kind, e.error.message))
                .unwrap_or(response_text);
            tracing::error!("[Anthropic] API error: {} - {}", status, message);
            anyhow::bail!("Messages API error ({}): {}", status, message);
        }

        let parsed: MessageResponse = serde_json::from_str(&response_text)
            .context("Failed to parse Messages API response")?;

        tracing::debug!(
            "[Anthropic] stop_reason={:?}, tokens in/out={}/{}",
            parsed.stop_reason,
            parsed.usage.input_tokens,
            parsed.usage.output_tokens
        );

        Ok(parsed)
    }

    fn model(&self) -> String {
        self.model.clone()
    }

    fn provider_name(&self) -> &str {
        "anthropic"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::types::ToolInputSchema;

    fn provider() -> AnthropicProvider {
        AnthropicProvider::new(AuthConfig::new("k"), "claude-test", Duration::from_secs(5))
            .unwrap()
    }

    #[test]
    fn test_request_is_deterministic_and_omits_empty_tools() {
        let request = provider().build_request(vec![Message::user("hi")], Some("sys"), vec![]);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["temperature"], 0.0);
        assert_eq!(value["system"], "sys");
        assert!(value.get("tools").is_none());
    }

    #[test]
    fn test_request_includes_tools() {
        let tool = ToolDefinition {
            name: "calculator".into(),
            description: Some("math".into()),
            input_schema: ToolInputSchema::new(),
        };
        let request = provider().build_request(vec![Message::user("hi")], None, vec![tool]);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["tools"][0]["name"], "calculator");
        assert!(value.get("system").is_none());
    }
}

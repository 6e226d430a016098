//! Scripted provider
//!
//! Replays a fixed sequence of responses, including tool-call triggers, and
//! records every request it receives. Used in tests and for offline demos.

use std::collections::VecDeque;
use std::sync::Mutex;

use anyhow::Result;
use serde_json::Value;

use super::provider::LlmProvider;
use super::types::{ContentBlock, Message, MessageResponse, StopReason, ToolDefinition};

/// One request seen by the scripted provider
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub system: Option<String>,
    pub tool_names: Vec<String>,
    pub messages: Vec<Message>,
}

#[derive(Debug, Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<MessageResponse>>,
    requests: Mutex<Vec<RecordedRequest>>,
    next_id: Mutex<u64>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a final text answer
    pub fn then_text(self, text: impl Into<String>) -> Self {
        self.push(vec![ContentBlock::text(text)], StopReason::EndTurn)
    }

    /// Queue a single tool call
    pub fn then_tool(self, name: impl Into<String>, input: Value) -> Self {
        let id = self.next_tool_id();
        self.push(vec![ContentBlock::tool_use(id, name, input)], StopReason::ToolUse)
    }

    /// Queue an arbitrary response
    pub fn then_blocks(self, blocks: Vec<ContentBlock>, stop_reason: StopReason) -> Self {
        self.push(blocks, stop_reason)
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    /// Number of responses not yet consumed
    pub fn remaining(&self) -> usize {
        self.responses.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn push(self, content: Vec<ContentBlock>, stop_reason: StopReason) -> Self {
        if let Ok(mut responses) = self.responses.lock() {
            let id = format!("msg_scripted_{}", responses.len());
            let mut response = MessageResponse::new(content, stop_reason);
            response.id = id;
            response.model = "scripted".to_string();
            responses.push_back(response);
        }
        self
    }

    fn next_tool_id(&self) -> String {
        let mut next = self.next_id.lock().unwrap_or_else(|e| e.into_inner());
        *next += 1;
        format!("toolu_scripted_{}", *next)
    }
}

#[async_trait::async_trait]
impl LlmProvider for ScriptedProvider {
    async fn send_with_tools(
        &self,
        messages: Vec<Message>,
        system: Option<&str>,
        tools: Vec<ToolDefinition>,
    ) -> Result<MessageResponse> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(RecordedRequest {
                system: system.map(str::to_string),
                tool_names: tools.into_iter().map(|t| t.name).collect(),
                messages,
            });
        }

        let next = self
            .responses
            .lock()
            .map_err(|_| anyhow::anyhow!("Scripted provider lock poisoned"))?
            .pop_front();

        next.ok_or_else(|| anyhow::anyhow!("Scripted provider has no more responses"))
    }

    fn model(&self) -> String {
        "scripted".to_string()
    }

    fn provider_name(&self) -> &str {
        "scripted"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_replays_in_order_and_records() {
        let provider = ScriptedProvider::new()
            .then_tool("get_order", json!({"order_id": "1"}))
            .then_text("done");

        let first = provider
            .send_with_tools(vec![Message::user("q")], Some("sys"), vec![])
            .await
            .unwrap();
        assert_eq!(first.tool_calls().len(), 1);

        let second = provider.send_with_tools(vec![], None, vec![]).await.unwrap();
        assert_eq!(second.text(), "done");

        assert!(provider.send_with_tools(vec![], None, vec![]).await.is_err());

        let requests = provider.requests();
        assert_eq!(requests.len(), 3);
        assert_eq!(requests[0].system.as_deref(), Some("sys"));
    }

    #[test]
    fn test_tool_ids_are_unique() {
        let provider = ScriptedProvider::new()
            .then_tool("a", json!({}))
            .then_tool("b", json!({}));
        let responses = provider.responses.lock().unwrap();
        let ids: Vec<_> = responses
            .iter()
            .filter_map(|r| r.tool_calls().first().map(|call| call.id.to_string()))
            .collect();
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
    }
}

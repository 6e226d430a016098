//! Reasoning loop
//!
//! Input → LLM → Tools → Output cycle shared by the orchestrator and the
//! sub-agents. Hooks fire around the invocation and around every tool call;
//! an `Aborted` result from a `PreToolUse` hook ends the invocation.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::time::timeout;

use crate::core::{AgentError, AgentResult, InvocationContext};
use crate::hooks::{HookContext, HookRegistry, HookResult};
use crate::llm::{ContentBlock, LlmProvider, Message, MessageResponse, StopReason};
use crate::tools::{ToolRegistry, ToolResult};

/// Time and iteration budgets for one invocation
#[derive(Debug, Clone, Copy)]
pub struct LoopLimits {
    /// LLM round trips before giving up
    pub max_iterations: usize,
    pub llm_timeout: Duration,
    pub tool_timeout: Duration,
}

impl Default for LoopLimits {
    fn default() -> Self {
        Self {
            max_iterations: 10,
            llm_timeout: Duration::from_secs(60),
            tool_timeout: Duration::from_secs(30),
        }
    }
}

/// Result of a completed invocation
#[derive(Debug, Clone)]
pub struct LoopOutcome {
    /// Final answer text (may be empty)
    pub text: String,

    /// Messages produced during the invocation, in order
    pub messages: Vec<Message>,
}

/// A reasoning loop bound to one backend, instruction text and tool set
///
/// # Example
///
/// ```ignore
/// let agent = AgentLoop::new("main", llm, main_prompt(), tools)
///     .with_hooks(hooks)
///     .with_limits(limits);
///
/// let outcome = agent.run(vec![Message::user("what is 2+2?")], &ctx).await?;
/// ```
pub struct AgentLoop {
    name: String,
    llm: Arc<dyn LlmProvider>,
    system_prompt: String,
    tools: ToolRegistry,
    hooks: HookRegistry,
    limits: LoopLimits,
}

impl AgentLoop {
    pub fn new(
        name: impl Into<String>,
        llm: Arc<dyn LlmProvider>,
        system_prompt: impl Into<String>,
        tools: ToolRegistry,
    ) -> Self {
        Self {
            name: name.into(),
            llm,
            system_prompt: system_prompt.into(),
            tools,
            hooks: HookRegistry::new(),
            limits: LoopLimits::default(),
        }
    }

    pub fn with_hooks(mut self, hooks: HookRegistry) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_limits(mut self, limits: LoopLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Run one invocation over `history`, which must end with the new user message.
    ///
    /// `AfterInvocation` hooks run on every exit path.
    pub async fn run(
        &self,
        history: Vec<Message>,
        ctx: &InvocationContext,
    ) -> AgentResult<LoopOutcome> {
        self.hooks.run(&HookContext::before_invocation(&self.name));

        let result = self.process_turn(history, ctx).await;

        let error = result.as_ref().err().map(|e| e.to_string());
        self.hooks
            .run(&HookContext::after_invocation(&self.name, error.as_deref()));

        result
    }

    async fn process_turn(
        &self,
        mut history: Vec<Message>,
        ctx: &InvocationContext,
    ) -> AgentResult<LoopOutcome> {
        let tool_definitions = self.tools.get_definitions();
        let mut produced: Vec<Message> = Vec::new();
        let mut iterations = 0;

        loop {
            iterations += 1;
            if iterations > self.limits.max_iterations {
                tracing::warn!(
                    "[AgentLoop:{}] Max tool iterations ({}) reached",
                    self.name,
                    self.limits.max_iterations
                );
                return Err(AgentError::other(format!(
                    "Max tool iterations ({}) reached",
                    self.limits.max_iterations
                )));
            }

            tracing::info!(
                "[AgentLoop:{}] Calling LLM with {} messages (iteration {})",
                self.name,
                history.len(),
                iterations
            );

            let response = self
                .call_llm(history.clone(), tool_definitions.clone(), ctx)
                .await?;

            tracing::info!(
                "[AgentLoop:{}] LLM response: stop_reason={:?}",
                self.name,
                response.stop_reason
            );

            let tool_calls: Vec<(String, String, Value)> = response
                .tool_calls()
                .into_iter()
                .map(|call| (call.id.to_string(), call.name.to_string(), call.input.clone()))
                .collect();

            if tool_calls.is_empty() {
                if response.stop_reason == Some(StopReason::MaxTokens) {
                    tracing::warn!("[AgentLoop:{}] Response truncated (max tokens)", self.name);
                }

                let text = response.text();
                if !response.content.is_empty() {
                    produced.push(Message::assistant_with_blocks(response.content));
                }
                return Ok(LoopOutcome {
                    text,
                    messages: produced,
                });
            }

            let assistant = Message::assistant_with_blocks(response.content);
            history.push(assistant.clone());
            produced.push(assistant);

            let mut result_blocks = Vec::with_capacity(tool_calls.len());
            for (id, name, input) in tool_calls {
                tracing::info!("[AgentLoop:{}] Tool use: {} ({})", self.name, name, id);

                let result = self.execute_tool(&id, &name, &input, ctx).await?;
                result_blocks.push(ContentBlock::tool_result(&id, &result.output, result.is_error));
            }

            let results = Message::user_with_blocks(result_blocks);
            history.push(results.clone());
            produced.push(results);
        }
    }

    async fn call_llm(
        &self,
        messages: Vec<Message>,
        tools: Vec<crate::llm::ToolDefinition>,
        ctx: &InvocationContext,
    ) -> AgentResult<MessageResponse> {
        let request = self
            .llm
            .send_with_tools(messages, Some(&self.system_prompt), tools);

        tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => Err(AgentError::Cancelled),
            outcome = timeout(self.limits.llm_timeout, request) => match outcome {
                Err(_) => Err(AgentError::timeout("LLM call", self.limits.llm_timeout)),
                Ok(Err(e)) => {
                    tracing::error!("[AgentLoop:{}] LLM call failed: {:#}", self.name, e);
                    Err(AgentError::Llm(format!("{e:#}")))
                }
                Ok(Ok(response)) => Ok(response),
            },
        }
    }

    /// Run hooks around one tool call; tool failures become error results
    async fn execute_tool(
        &self,
        id: &str,
        name: &str,
        input: &Value,
        ctx: &InvocationContext,
    ) -> AgentResult<ToolResult> {
        let pre = HookContext::pre_tool_use(&self.name, name, input, id);
        if let HookResult::Aborted(reason) = self.hooks.run(&pre) {
            tracing::warn!("[AgentLoop:{}] Invocation aborted: {}", self.name, reason);
            return Err(AgentError::LoopGuardTripped(reason));
        }

        let execution = self.tools.execute(name, input, ctx);
        let outcome = tokio::select! {
            biased;
            _ = ctx.cancel.cancelled() => return Err(AgentError::Cancelled),
            outcome = timeout(self.limits.tool_timeout, execution) => outcome,
        };

        let failure = match outcome {
            Ok(Ok(result)) => {
                self.hooks
                    .run(&HookContext::post_tool_use(&self.name, name, id, &result));
                return Ok(result);
            }
            Ok(Err(e)) => format!("Tool execution failed: {e:#}"),
            Err(_) => format!(
                "Tool execution failed: {} timed out after {}s",
                name,
                self.limits.tool_timeout.as_secs()
            ),
        };

        tracing::error!("[AgentLoop:{}] {}", self.name, failure);
        self.hooks
            .run(&HookContext::post_tool_use_failure(&self.name, name, id, &failure));
        Ok(ToolResult::error(failure))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hooks::{CallGuard, HookEvent};
    use crate::llm::ScriptedProvider;
    use crate::tools::CalculatorTool;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn calculator_tools() -> ToolRegistry {
        let mut tools = ToolRegistry::new();
        tools.register(CalculatorTool::new());
        tools
    }

    #[tokio::test]
    async fn test_tool_round_trip() {
        let llm = Arc::new(
            ScriptedProvider::new()
                .then_tool("calculator", json!({"expression": "6*7"}))
                .then_text("The answer is 42"),
        );
        let agent = AgentLoop::new("main", llm.clone(), "be terse", calculator_tools());

        let outcome = agent
            .run(vec![Message::user("6 times 7?")], &InvocationContext::new("s"))
            .await
            .unwrap();

        assert_eq!(outcome.text, "The answer is 42");
        assert_eq!(outcome.messages.len(), 3);
        assert!(outcome.messages[0].has_tool_use());
        assert!(outcome.messages[1].has_tool_results());

        let requests = llm.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].system.as_deref(), Some("be terse"));
        assert_eq!(requests[0].tool_names, vec!["calculator"]);
        assert_eq!(requests[1].messages.len(), 3);
    }

    #[tokio::test]
    async fn test_unknown_tool_is_fed_back_as_error() {
        let llm = Arc::new(
            ScriptedProvider::new()
                .then_tool("missing", json!({}))
                .then_text("sorry"),
        );
        let agent = AgentLoop::new("main", llm.clone(), "", calculator_tools());

        let outcome = agent
            .run(vec![Message::user("hi")], &InvocationContext::new("s"))
            .await
            .unwrap();
        assert_eq!(outcome.text, "sorry");

        let fed_back = &llm.requests()[1].messages[2];
        match &fed_back.blocks()[0] {
            ContentBlock::ToolResult { is_error, content, .. } => {
                assert_eq!(*is_error, Some(true));
                assert!(content.as_deref().unwrap_or("").contains("Unknown tool: missing"));
            }
            other => panic!("unexpected block: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_guard_abort_ends_invocation() {
        let llm = Arc::new(
            ScriptedProvider::new()
                .then_tool("calculator", json!({"expression": "1"}))
                .then_tool("calculator", json!({"expression": "2"}))
                .then_text("never reached"),
        );
        let guard = Arc::new(CallGuard::new("main", 1));
        let mut hooks = HookRegistry::new();
        guard.install(&mut hooks);

        let agent = AgentLoop::new("main", llm.clone(), "", calculator_tools()).with_hooks(hooks);
        let err = agent
            .run(vec![Message::user("loop")], &InvocationContext::new("s"))
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::LoopGuardTripped(_)));
        assert_eq!(guard.tool_calls(), 2);
        assert_eq!(guard.metrics().total_requests, 1);
        assert_eq!(llm.remaining(), 1);
    }

    #[tokio::test]
    async fn test_after_invocation_runs_on_error() {
        let llm = Arc::new(ScriptedProvider::new());
        let ended = Arc::new(AtomicUsize::new(0));
        let counter = ended.clone();

        let mut hooks = HookRegistry::new();
        hooks.add(HookEvent::AfterInvocation, move |ctx: &HookContext<'_>| {
            assert!(ctx.error.is_some());
            counter.fetch_add(1, Ordering::SeqCst);
            HookResult::none()
        });

        let agent = AgentLoop::new("main", llm, "", ToolRegistry::new()).with_hooks(hooks);
        let err = agent
            .run(vec![Message::user("hi")], &InvocationContext::new("s"))
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Llm(_)));
        assert_eq!(ended.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cancelled_before_llm_call() {
        let llm = Arc::new(ScriptedProvider::new().then_text("late"));
        let agent = AgentLoop::new("main", llm, "", ToolRegistry::new());

        let ctx = InvocationContext::new("s");
        ctx.cancel.cancel();

        let err = agent.run(vec![Message::user("hi")], &ctx).await.unwrap_err();
        assert!(matches!(err, AgentError::Cancelled));
    }
}

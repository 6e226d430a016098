//! Orchestrator
//!
//! The top-level agent. Routes each user turn to the order or inventory
//! sub-agent or the calculator, keeps the windowed transcript and persists it
//! after every successful turn.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::agent_loop::{AgentLoop, LoopLimits};
use super::sub_agent::SubAgent;
use super::system_prompt::main_prompt;
use super::thinking::strip_thinking;
use crate::core::{AgentResult, InvocationContext};
use crate::llm::{LlmProvider, Message};
use crate::session::{ConversationSession, SlidingWindow};
use crate::tools::{CalculatorTool, ToolRegistry};

pub const MAIN_AGENT_NAME: &str = "main";

pub struct Orchestrator {
    agent: AgentLoop,
    session: ConversationSession,
    window: SlidingWindow,
    cancel: CancellationToken,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        order: SubAgent,
        inventory: SubAgent,
        session: ConversationSession,
        window: SlidingWindow,
    ) -> Self {
        let mut tools = ToolRegistry::new();
        tools.register(order);
        tools.register(inventory);
        tools.register(CalculatorTool::new());

        Self::with_tools(llm, tools, session, window)
    }

    /// Build over an arbitrary tool set
    pub fn with_tools(
        llm: Arc<dyn LlmProvider>,
        tools: ToolRegistry,
        mut session: ConversationSession,
        window: SlidingWindow,
    ) -> Self {
        let mut history = session.history().to_vec();
        if window.apply(&mut history) {
            session.replace_messages(history);
        }

        Self {
            agent: AgentLoop::new(MAIN_AGENT_NAME, llm, main_prompt(), tools),
            session,
            window,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_limits(mut self, limits: LoopLimits) -> Self {
        self.agent = self.agent.with_limits(limits);
        self
    }

    /// Tie every turn to a process-wide cancellation token
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn session(&self) -> &ConversationSession {
        &self.session
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.agent.tools().tool_names()
    }

    /// Answer one user turn with the caller's token.
    ///
    /// The transcript is only updated and persisted when the turn succeeds.
    pub async fn respond(&mut self, user_text: &str, token: Option<&str>) -> AgentResult<String> {
        let ctx = InvocationContext::new(self.session.session_id())
            .with_token(token)
            .with_cancel(self.cancel.child_token());

        tracing::info!(
            "[Orchestrator] Turn started (trace {})",
            ctx.trace.trace_id()
        );

        let user = Message::user(user_text.trim());
        let mut history = self.session.history().to_vec();
        history.push(user.clone());

        let outcome = self.agent.run(history, &ctx).await?;

        let mut transcript = self.session.history().to_vec();
        transcript.push(user);
        transcript.extend(outcome.messages);
        self.window.apply(&mut transcript);

        self.session.replace_messages(transcript);
        self.session.save()?;

        tracing::info!(
            "[Orchestrator] Turn complete, transcript has {} messages",
            self.session.history().len()
        );

        Ok(strip_thinking(&outcome.text))
    }
}

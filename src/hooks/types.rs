use std::fmt;

use serde_json::Value;

use crate::tools::ToolResult;

/// Points in an invocation where hooks run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HookEvent {
    BeforeInvocation,
    /// The only event whose `Aborted` result changes control flow
    PreToolUse,
    PostToolUse,
    PostToolUseFailure,
    /// Fires on success and on error
    AfterInvocation,
}

impl HookEvent {
    pub fn is_tool_event(&self) -> bool {
        matches!(
            self,
            HookEvent::PreToolUse | HookEvent::PostToolUse | HookEvent::PostToolUseFailure
        )
    }
}

impl fmt::Display for HookEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// The tool call a tool event is about
#[derive(Debug, Clone, Copy)]
pub struct ToolEvent<'a> {
    pub name: &'a str,
    pub use_id: &'a str,
    pub input: Option<&'a Value>,
    pub result: Option<&'a ToolResult>,
}

/// What a hook gets to see. Everything is borrowed from the running loop.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    pub event: HookEvent,
    pub agent_name: &'a str,
    pub tool: Option<ToolEvent<'a>>,
    /// Failure text for `PostToolUseFailure` and failed `AfterInvocation`
    pub error: Option<&'a str>,
}

impl<'a> HookContext<'a> {
    fn bare(event: HookEvent, agent_name: &'a str) -> Self {
        Self {
            event,
            agent_name,
            tool: None,
            error: None,
        }
    }

    fn for_tool(event: HookEvent, agent_name: &'a str, name: &'a str, use_id: &'a str) -> Self {
        Self {
            tool: Some(ToolEvent {
                name,
                use_id,
                input: None,
                result: None,
            }),
            ..Self::bare(event, agent_name)
        }
    }

    pub fn before_invocation(agent_name: &'a str) -> Self {
        Self::bare(HookEvent::BeforeInvocation, agent_name)
    }

    pub fn after_invocation(agent_name: &'a str, error: Option<&'a str>) -> Self {
        Self {
            error,
            ..Self::bare(HookEvent::AfterInvocation, agent_name)
        }
    }

    pub fn pre_tool_use(
        agent_name: &'a str,
        tool_name: &'a str,
        input: &'a Value,
        use_id: &'a str,
    ) -> Self {
        let mut ctx = Self::for_tool(HookEvent::PreToolUse, agent_name, tool_name, use_id);
        if let Some(tool) = ctx.tool.as_mut() {
            tool.input = Some(input);
        }
        ctx
    }

    pub fn post_tool_use(
        agent_name: &'a str,
        tool_name: &'a str,
        use_id: &'a str,
        result: &'a ToolResult,
    ) -> Self {
        let mut ctx = Self::for_tool(HookEvent::PostToolUse, agent_name, tool_name, use_id);
        if let Some(tool) = ctx.tool.as_mut() {
            tool.result = Some(result);
        }
        ctx
    }

    pub fn post_tool_use_failure(
        agent_name: &'a str,
        tool_name: &'a str,
        use_id: &'a str,
        error: &'a str,
    ) -> Self {
        Self {
            error: Some(error),
            ..Self::for_tool(HookEvent::PostToolUseFailure, agent_name, tool_name, use_id)
        }
    }

    pub fn tool_name(&self) -> Option<&'a str> {
        self.tool.map(|t| t.name)
    }
}

/// Decision returned from a hook, checked explicitly by the agent loop
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum HookResult {
    #[default]
    Continue,
    /// End the invocation with this reason
    Aborted(String),
}

impl HookResult {
    pub fn none() -> Self {
        HookResult::Continue
    }

    pub fn abort(reason: impl Into<String>) -> Self {
        HookResult::Aborted(reason.into())
    }

    pub fn is_aborted(&self) -> bool {
        matches!(self, HookResult::Aborted(_))
    }
}

//! Hooks Module
//!
//! Intercept agent invocations at key execution points.
//!
//! # Overview
//!
//! Hooks let you:
//! - Bound the number of tool calls in one invocation (see [`CallGuard`])
//! - Measure invocation timing
//! - Log and audit tool calls
//!
//! # Hook Events
//!
//! | Event | When | Can abort |
//! |-------|------|-----------|
//! | `BeforeInvocation` | Agent invocation starts | no |
//! | `PreToolUse` | Before tool executes | yes |
//! | `PostToolUse` | After tool succeeds | no |
//! | `PostToolUseFailure` | After tool fails | no |
//! | `AfterInvocation` | Agent invocation ends | no |
//!
//! # HookResult
//!
//! | Value | Effect |
//! |-------|--------|
//! | `HookResult::Continue` | Continue normally |
//! | `HookResult::Aborted(reason)` | End the whole invocation with `reason` |

mod call_guard;
mod registry;
mod types;

pub use call_guard::{
    CallGuard, GuardPhase, InvocationMetrics, DEFAULT_MAX_TOOL_CALLS, LOOP_GUARD_REASON,
};
pub use registry::{ArcHook, Hook, HookRegistry};
pub use types::{HookContext, HookEvent, HookResult, ToolEvent};

//! Call guard
//!
//! Interceptor around one sub-agent invocation. It bounds the number of tool
//! calls, measures the invocation duration and keeps EWMA timing metrics.
//! A new guard is built for every invocation, so metrics never accumulate
//! across invocations.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use super::registry::{Hook, HookRegistry};
use super::types::{HookContext, HookEvent, HookResult};

/// Default bound on tool calls per invocation
pub const DEFAULT_MAX_TOOL_CALLS: u32 = 3;

/// Reason reported when the bound is exceeded
pub const LOOP_GUARD_REASON: &str = "Too many tool calls, aborting to avoid loop";

const EWMA_DECAY: f64 = 0.9;

/// Lifecycle phase of the guarded invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardPhase {
    Idle,
    Started,
    ToolPending,
    ToolCompleted,
    Ended,
}

/// Timing metrics for one guard
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct InvocationMetrics {
    pub total_requests: u64,
    /// Seconds, exponentially weighted
    pub avg_duration: f64,
}

impl InvocationMetrics {
    /// Record one finished invocation: `avg = 0.9 * avg + 0.1 * duration`
    pub fn record(&mut self, duration_secs: f64) {
        self.total_requests += 1;
        self.avg_duration = EWMA_DECAY * self.avg_duration + (1.0 - EWMA_DECAY) * duration_secs;
    }
}

#[derive(Debug)]
struct GuardState {
    phase: GuardPhase,
    started_at: Option<Instant>,
    tool_calls: u32,
    last_tool: Option<String>,
    metrics: InvocationMetrics,
}

#[derive(Debug)]
pub struct CallGuard {
    agent_name: String,
    max_tool_calls: u32,
    state: Mutex<GuardState>,
}

impl CallGuard {
    pub fn new(agent_name: impl Into<String>, max_tool_calls: u32) -> Self {
        Self {
            agent_name: agent_name.into(),
            max_tool_calls,
            state: Mutex::new(GuardState {
                phase: GuardPhase::Idle,
                started_at: None,
                tool_calls: 0,
                last_tool: None,
                metrics: InvocationMetrics::default(),
            }),
        }
    }

    /// Register this guard for every lifecycle event
    pub fn install(self: &Arc<Self>, hooks: &mut HookRegistry) {
        for event in [
            HookEvent::BeforeInvocation,
            HookEvent::PreToolUse,
            HookEvent::PostToolUse,
            HookEvent::PostToolUseFailure,
            HookEvent::AfterInvocation,
        ] {
            hooks.add_arc(event, self.clone());
        }
    }

    pub fn phase(&self) -> GuardPhase {
        self.lock().phase
    }

    pub fn tool_calls(&self) -> u32 {
        self.lock().tool_calls
    }

    pub fn last_tool(&self) -> Option<String> {
        self.lock().last_tool.clone()
    }

    pub fn metrics(&self) -> InvocationMetrics {
        self.lock().metrics
    }

    pub fn on_start(&self) {
        let mut state = self.lock();
        state.phase = GuardPhase::Started;
        state.started_at = Some(Instant::now());
        state.tool_calls = 0;
        state.last_tool = None;
    }

    /// Count a tool call attempt; the call past the bound aborts the invocation
    pub fn on_tool_pending(&self, tool_name: &str) -> HookResult {
        let mut state = self.lock();
        state.phase = GuardPhase::ToolPending;
        state.tool_calls += 1;

        if state.tool_calls > self.max_tool_calls {
            tracing::warn!(
                "[CallGuard] {} attempted tool call #{} ({}), bound is {}",
                self.agent_name,
                state.tool_calls,
                tool_name,
                self.max_tool_calls
            );
            return HookResult::abort(LOOP_GUARD_REASON);
        }

        tracing::debug!(
            "[CallGuard] {} tool call #{}: {}",
            self.agent_name,
            state.tool_calls,
            tool_name
        );
        HookResult::none()
    }

    pub fn on_tool_completed(&self, tool_name: &str) {
        let mut state = self.lock();
        state.phase = GuardPhase::ToolCompleted;
        state.last_tool = Some(tool_name.to_string());
        tracing::info!("[CallGuard] {} finished tool {}", self.agent_name, tool_name);
    }

    pub fn on_end(&self) {
        let mut state = self.lock();
        let duration = state
            .started_at
            .map(|start| start.elapsed().as_secs_f64())
            .unwrap_or(0.0);

        state.phase = GuardPhase::Ended;
        state.metrics.record(duration);

        tracing::info!(
            "[CallGuard] {} ended after {:.3}s: total_requests={}, avg_duration={:.3}s",
            self.agent_name,
            duration,
            state.metrics.total_requests,
            state.metrics.avg_duration
        );
    }

    fn lock(&self) -> MutexGuard<'_, GuardState> {
        // State stays consistent even if a holder panicked
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Hook for CallGuard {
    fn call(&self, ctx: &HookContext<'_>) -> HookResult {
        let tool_name = ctx.tool_name().unwrap_or("<unknown>");
        match ctx.event {
            HookEvent::BeforeInvocation => self.on_start(),
            HookEvent::PreToolUse => return self.on_tool_pending(tool_name),
            HookEvent::PostToolUse | HookEvent::PostToolUseFailure => {
                self.on_tool_completed(tool_name)
            }
            HookEvent::AfterInvocation => self.on_end(),
        }
        HookResult::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ewma_first_sample() {
        let mut metrics = InvocationMetrics::default();
        metrics.record(2.0);
        assert_eq!(metrics.total_requests, 1);
        assert!((metrics.avg_duration - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_ewma_update_law() {
        let mut metrics = InvocationMetrics {
            total_requests: 4,
            avg_duration: 1.5,
        };
        metrics.record(3.0);
        assert_eq!(metrics.total_requests, 5);
        assert!((metrics.avg_duration - (0.9 * 1.5 + 0.1 * 3.0)).abs() < 1e-12);
    }

    #[test]
    fn test_bound_allows_three_calls() {
        let guard = CallGuard::new("order", 3);
        guard.on_start();

        for _ in 0..3 {
            assert_eq!(guard.on_tool_pending("get_order"), HookResult::Continue);
            guard.on_tool_completed("get_order");
        }
        assert_eq!(
            guard.on_tool_pending("get_order"),
            HookResult::abort(LOOP_GUARD_REASON)
        );
        assert_eq!(guard.tool_calls(), 4);
    }

    #[test]
    fn test_lifecycle_phases() {
        let guard = CallGuard::new("inventory", 3);
        assert_eq!(guard.phase(), GuardPhase::Idle);

        guard.on_start();
        assert_eq!(guard.phase(), GuardPhase::Started);

        guard.on_tool_pending("get_product");
        assert_eq!(guard.phase(), GuardPhase::ToolPending);

        guard.on_tool_completed("get_product");
        assert_eq!(guard.phase(), GuardPhase::ToolCompleted);
        assert_eq!(guard.last_tool().as_deref(), Some("get_product"));

        guard.on_end();
        assert_eq!(guard.phase(), GuardPhase::Ended);
        assert_eq!(guard.metrics().total_requests, 1);
    }

    #[test]
    fn test_fresh_guard_resets_metrics() {
        let first = CallGuard::new("order", 3);
        first.on_start();
        first.on_end();
        assert_eq!(first.metrics().total_requests, 1);

        let second = CallGuard::new("order", 3);
        assert_eq!(second.metrics(), InvocationMetrics::default());
    }

    #[test]
    fn test_installed_guard_aborts_through_registry() {
        let guard = Arc::new(CallGuard::new("order", 1));
        let mut hooks = HookRegistry::new();
        guard.install(&mut hooks);

        hooks.run(&HookContext::before_invocation("order"));

        let input = json!({"order_id": "123"});
        let ctx = HookContext::pre_tool_use("order", "get_order", &input, "t1");
        assert_eq!(hooks.run(&ctx), HookResult::Continue);

        let ctx = HookContext::pre_tool_use("order", "get_order", &input, "t2");
        assert_eq!(hooks.run(&ctx), HookResult::abort(LOOP_GUARD_REASON));

        hooks.run(&HookContext::after_invocation("order", None));
        assert_eq!(guard.phase(), GuardPhase::Ended);
    }
}

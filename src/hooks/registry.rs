use std::fmt;
use std::sync::Arc;

use regex::Regex;

use super::types::{HookContext, HookEvent, HookResult};

/// Something that observes an invocation and may veto a tool call.
///
/// Hooks are synchronous: they decide, they never perform I/O.
pub trait Hook: Send + Sync {
    fn call(&self, ctx: &HookContext<'_>) -> HookResult;
}

impl<F> Hook for F
where
    F: for<'a> Fn(&HookContext<'a>) -> HookResult + Send + Sync,
{
    fn call(&self, ctx: &HookContext<'_>) -> HookResult {
        (self)(ctx)
    }
}

pub type ArcHook = Arc<dyn Hook>;

struct Registration {
    event: HookEvent,
    /// Tool-name filter; only consulted for tool events
    tools: Option<Regex>,
    hook: ArcHook,
}

impl Registration {
    fn applies_to(&self, ctx: &HookContext<'_>) -> bool {
        if self.event != ctx.event {
            return false;
        }
        match (&self.tools, ctx.tool_name()) {
            (Some(pattern), Some(name)) => pattern.is_match(name),
            _ => true,
        }
    }
}

/// Hooks in registration order.
///
/// ```ignore
/// let mut hooks = HookRegistry::new();
/// hooks.add_for_tools(HookEvent::PreToolUse, "^checkout_", |ctx: &HookContext<'_>| {
///     tracing::info!("checkout requested by {}", ctx.agent_name);
///     HookResult::none()
/// })?;
/// ```
#[derive(Default)]
pub struct HookRegistry {
    registrations: Vec<Registration>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<H: Hook + 'static>(&mut self, event: HookEvent, hook: H) -> &mut Self {
        self.add_arc(event, Arc::new(hook))
    }

    /// Register a shared hook, e.g. one [`CallGuard`](super::CallGuard) for several events
    pub fn add_arc(&mut self, event: HookEvent, hook: ArcHook) -> &mut Self {
        self.registrations.push(Registration {
            event,
            tools: None,
            hook,
        });
        self
    }

    /// Register a hook that only sees tools whose name matches `pattern`
    pub fn add_for_tools<H: Hook + 'static>(
        &mut self,
        event: HookEvent,
        pattern: &str,
        hook: H,
    ) -> Result<&mut Self, regex::Error> {
        self.registrations.push(Registration {
            event,
            tools: Some(Regex::new(pattern)?),
            hook: Arc::new(hook),
        });
        Ok(self)
    }

    pub fn count(&self, event: HookEvent) -> usize {
        self.registrations.iter().filter(|r| r.event == event).count()
    }

    /// Run every applicable hook. All of them run so observers always fire;
    /// the first `Aborted` is the result.
    pub fn run(&self, ctx: &HookContext<'_>) -> HookResult {
        let mut outcome = HookResult::Continue;

        for registration in self.registrations.iter().filter(|r| r.applies_to(ctx)) {
            let result = registration.hook.call(ctx);
            if !outcome.is_aborted() {
                outcome = result;
            }
        }

        if let HookResult::Aborted(reason) = &outcome {
            tracing::debug!("[HookRegistry] {} aborted: {}", ctx.event, reason);
        }
        outcome
    }
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.registrations.iter().map(|r| r.event))
            .finish()
    }
}

//! Per-turn invocation context and the security snapshot handed to sub-agents

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::trace::TraceContext;

// ============================================================================
// InvocationContext - state threaded through every tool call of a turn
// ============================================================================

/// Context passed explicitly from the entry point down to every tool.
///
/// Carries the caller's identity token, the ambient trace span and the
/// cancellation token for the current turn. It is NOT exposed in any tool's
/// JSON schema.
#[derive(Clone)]
pub struct InvocationContext {
    /// Session the turn belongs to
    pub session_id: String,

    /// Ambient trace span
    pub trace: TraceContext,

    /// Cancelled when the user interrupts the process
    pub cancel: CancellationToken,

    token: Option<String>,
}

impl fmt::Debug for InvocationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvocationContext")
            .field("session_id", &self.session_id)
            .field("trace", &self.trace.traceparent())
            .field("cancelled", &self.cancel.is_cancelled())
            .field("has_token", &self.token.is_some())
            .finish()
    }
}

impl InvocationContext {
    /// Start a new turn with a fresh root trace
    pub fn new(session_id: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            trace: TraceContext::new_root(),
            cancel: CancellationToken::new(),
            token: None,
        }
    }

    /// Attach the caller's token; blank tokens count as absent
    pub fn with_token(mut self, token: Option<impl Into<String>>) -> Self {
        self.token = token
            .map(Into::into)
            .filter(|t: &String| !t.trim().is_empty());
        self
    }

    /// Tie this context to a parent cancellation token
    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Same caller and cancellation, new trace span
    pub fn child_span(&self) -> Self {
        Self {
            session_id: self.session_id.clone(),
            trace: self.trace.child(),
            cancel: self.cancel.child_token(),
            token: self.token.clone(),
        }
    }
}

// ============================================================================
// SecurityContext - snapshot embedded into sub-agent queries
// ============================================================================

/// Snapshot of the caller's identity and trace data for one sub-agent invocation.
///
/// Serializes with the wire keys the tool services expect:
/// `{"x-request-id": ..., "_trace": {...}, "jwt": ...}`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityContext {
    #[serde(rename = "x-request-id", default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,

    #[serde(rename = "_trace")]
    pub trace_headers: BTreeMap<String, String>,

    #[serde(rename = "jwt")]
    pub token: String,
}

impl fmt::Debug for SecurityContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityContext")
            .field("request_id", &self.request_id)
            .field("trace_headers", &self.trace_headers)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl SecurityContext {
    pub fn new(token: impl Into<String>, trace: &TraceContext) -> Self {
        Self {
            request_id: None,
            trace_headers: trace.headers(),
            token: token.into(),
        }
    }

    /// Attach a fresh request id
    pub fn with_request_id(mut self) -> Self {
        self.request_id = Some(Uuid::new_v4().to_string());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::trace::TRACEPARENT_HEADER;

    #[test]
    fn test_blank_token_is_absent() {
        let ctx = InvocationContext::new("s1").with_token(Some(""));
        assert!(ctx.token().is_none());

        let ctx = InvocationContext::new("s1").with_token(None::<String>);
        assert!(ctx.token().is_none());

        let ctx = InvocationContext::new("s1").with_token(Some("jwt-abc"));
        assert_eq!(ctx.token(), Some("jwt-abc"));
    }

    #[test]
    fn test_child_span_shares_cancellation() {
        let ctx = InvocationContext::new("s1").with_token(Some("t"));
        let child = ctx.child_span();

        assert_eq!(child.trace.trace_id(), ctx.trace.trace_id());
        assert_eq!(child.token(), Some("t"));

        ctx.cancel.cancel();
        assert!(child.cancel.is_cancelled());
    }

    #[test]
    fn test_security_context_wire_keys() {
        let trace = TraceContext::new_root();
        let sec = SecurityContext::new("jwt-abc", &trace).with_request_id();
        let value = serde_json::to_value(&sec).unwrap();

        assert_eq!(value["jwt"], "jwt-abc");
        assert_eq!(value["_trace"][TRACEPARENT_HEADER], trace.traceparent());
        assert!(value["x-request-id"].as_str().is_some());
    }

    #[test]
    fn test_security_context_without_request_id() {
        let trace = TraceContext::new_root();
        let sec = SecurityContext::new("jwt-abc", &trace);
        let value = serde_json::to_value(&sec).unwrap();
        assert!(value.get("x-request-id").is_none());
    }

    #[test]
    fn test_debug_redacts_token() {
        let sec = SecurityContext::new("secret-token", &TraceContext::new_root());
        let printed = format!("{:?}", sec);
        assert!(!printed.contains("secret-token"));
    }
}

//! W3C trace-context propagation
//!
//! Each turn starts a root trace; every sub-agent invocation runs in a child
//! span whose `traceparent` header is injected into outgoing tool requests.

use std::collections::BTreeMap;

use uuid::Uuid;

pub const TRACEPARENT_HEADER: &str = "traceparent";

const VERSION: &str = "00";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    trace_id: String,
    span_id: String,
    sampled: bool,
}

impl TraceContext {
    /// Start a new sampled trace
    pub fn new_root() -> Self {
        Self {
            trace_id: Uuid::new_v4().simple().to_string(),
            span_id: new_span_id(),
            sampled: true,
        }
    }

    /// A new span in the same trace
    pub fn child(&self) -> Self {
        Self {
            trace_id: self.trace_id.clone(),
            span_id: new_span_id(),
            sampled: self.sampled,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn span_id(&self) -> &str {
        &self.span_id
    }

    pub fn traceparent(&self) -> String {
        let flags = if self.sampled { "01" } else { "00" };
        format!("{}-{}-{}-{}", VERSION, self.trace_id, self.span_id, flags)
    }

    /// Propagation headers for this span
    pub fn headers(&self) -> BTreeMap<String, String> {
        let mut headers = BTreeMap::new();
        self.inject(&mut headers);
        headers
    }

    /// Write (or overwrite) the propagation headers into `carrier`
    pub fn inject(&self, carrier: &mut BTreeMap<String, String>) {
        carrier.insert(TRACEPARENT_HEADER.to_string(), self.traceparent());
    }
}

fn new_span_id() -> String {
    let id = Uuid::new_v4().simple().to_string();
    id[..16].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_traceparent_format() {
        let ctx = TraceContext::new_root();
        let header = ctx.traceparent();
        let parts: Vec<&str> = header.split('-').collect();
        assert_eq!(parts.len(), 4);
        assert_eq!(parts[0], "00");
        assert_eq!(parts[1].len(), 32);
        assert_eq!(parts[2].len(), 16);
        assert_eq!(parts[3], "01");
    }

    #[test]
    fn test_child_keeps_trace_id() {
        let root = TraceContext::new_root();
        let child = root.child();
        assert_eq!(child.trace_id(), root.trace_id());
        assert_ne!(child.span_id(), root.span_id());
    }

    #[test]
    fn test_inject_overwrites() {
        let ctx = TraceContext::new_root();
        let mut carrier = BTreeMap::new();
        carrier.insert(TRACEPARENT_HEADER.to_string(), "stale".to_string());
        carrier.insert("x-extra".to_string(), "kept".to_string());

        ctx.inject(&mut carrier);
        assert_eq!(carrier[TRACEPARENT_HEADER], ctx.traceparent());
        assert_eq!(carrier["x-extra"], "kept");
    }
}

//! Tool Gateway Configuration

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for one remote tool service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Identifier used in logs
    pub id: String,

    /// URI of the MCP endpoint (e.g., "http://127.0.0.1:9002/mcp")
    pub uri: String,

    /// Per-request timeout in seconds (connect, list and call)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Static headers sent with every request, before trace headers are injected
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
}

fn default_timeout_secs() -> u64 {
    30
}

impl GatewayConfig {
    /// Create a new gateway configuration
    pub fn new(id: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            uri: uri.into(),
            timeout_secs: default_timeout_secs(),
            headers: BTreeMap::new(),
        }
    }

    /// Set the per-request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_secs = timeout.as_secs().max(1);
        self
    }

    /// Add a static header
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Get the timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

//! In-process tool service used by tests and local runs

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::config::GatewayConfig;
use super::gateway::{GatewayConnection, GatewayConnector};
use super::tool_adapter::ToolDescriptor;
use crate::core::{AgentError, AgentResult};
use crate::tools::ToolResult;

type Handler = Arc<dyn Fn(&Map<String, Value>) -> AgentResult<ToolResult> + Send + Sync>;

/// A recorded tool call
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub name: String,
    pub arguments: Map<String, Value>,
}

#[derive(Default)]
struct Counters {
    opens: AtomicUsize,
    closes: AtomicUsize,
    calls: Mutex<Vec<RecordedCall>>,
    last_headers: Mutex<Option<BTreeMap<String, String>>>,
}

/// Connector that serves a fixed set of tools from closures
#[derive(Clone, Default)]
pub struct InMemoryConnector {
    tools: Vec<(ToolDescriptor, Handler)>,
    counters: Arc<Counters>,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tool<F>(mut self, name: &str, description: &str, handler: F) -> Self
    where
        F: Fn(&Map<String, Value>) -> AgentResult<ToolResult> + Send + Sync + 'static,
    {
        self.tools
            .push((ToolDescriptor::new(name, description), Arc::new(handler)));
        self
    }

    pub fn opens(&self) -> usize {
        self.counters.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.counters
            .calls
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    /// Headers passed to the most recent connect
    pub fn last_headers(&self) -> Option<BTreeMap<String, String>> {
        self.counters
            .last_headers
            .lock()
            .ok()
            .and_then(|h| h.clone())
    }
}

#[async_trait]
impl GatewayConnector for InMemoryConnector {
    async fn connect(
        &self,
        _config: &GatewayConfig,
        headers: &BTreeMap<String, String>,
    ) -> AgentResult<Arc<dyn GatewayConnection>> {
        self.counters.opens.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut last) = self.counters.last_headers.lock() {
            *last = Some(headers.clone());
        }

        Ok(Arc::new(InMemoryConnection {
            tools: self.tools.clone(),
            counters: self.counters.clone(),
            closed: AtomicBool::new(false),
        }))
    }
}

struct InMemoryConnection {
    tools: Vec<(ToolDescriptor, Handler)>,
    counters: Arc<Counters>,
    closed: AtomicBool,
}

impl InMemoryConnection {
    fn ensure_open(&self) -> AgentResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            Err(AgentError::gateway("session is closed"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GatewayConnection for InMemoryConnection {
    async fn list_tools(&self) -> AgentResult<Vec<ToolDescriptor>> {
        self.ensure_open()?;
        Ok(self.tools.iter().map(|(d, _)| d.clone()).collect())
    }

    async fn call_tool(
        &self,
        name: &str,
        arguments: Map<String, Value>,
    ) -> AgentResult<ToolResult> {
        self.ensure_open()?;

        if let Ok(mut calls) = self.counters.calls.lock() {
            calls.push(RecordedCall {
                name: name.to_string(),
                arguments: arguments.clone(),
            });
        }

        let (_, handler) = self
            .tools
            .iter()
            .find(|(d, _)| d.name == name)
            .ok_or_else(|| AgentError::UnknownTool(name.to_string()))?;

        handler(&arguments)
    }

    async fn close(&self) -> AgentResult<()> {
        if !self.closed.swap(true, Ordering::SeqCst) {
            self.counters.closes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }
}

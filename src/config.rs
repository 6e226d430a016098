//! Process configuration
//!
//! Everything is read from environment variables. [`AppConfig::from_lookup`]
//! takes any key lookup so tests never touch the real environment.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use crate::agent::LoopLimits;
use crate::core::{AgentError, AgentResult};
use crate::logging::LogConfig;
use crate::session::window::{DEFAULT_WINDOW_SIZE, MIN_WINDOW_SIZE};

pub const DEFAULT_POD_NAME: &str = "main-agent.localhost";
pub const DEFAULT_SESSION_ID: &str = "main-001";
pub const DEFAULT_INVENTORY_MCP_URL: &str = "http://127.0.0.1:9002/mcp";
pub const DEFAULT_LOG_LEVEL: &str = "INFO";
pub const DEFAULT_SESSION_DIR: &str = "./sessions";

#[derive(Clone)]
pub struct AppConfig {
    pub pod_name: String,
    pub session_id: String,
    pub region: Option<String>,
    pub model_id: String,
    pub llm_api_key: String,
    pub llm_base_url: Option<String>,
    pub order_mcp_url: String,
    pub inventory_mcp_url: String,
    pub log: LogConfig,
    pub session_dir: PathBuf,
    pub window_size: usize,
    pub max_tool_calls: u32,
    pub llm_timeout: Duration,
    pub tool_timeout: Duration,
    pub subagent_timeout: Duration,

    /// Identity token handed over by the login flow
    pub auth_token: Option<String>,
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("pod_name", &self.pod_name)
            .field("session_id", &self.session_id)
            .field("region", &self.region)
            .field("model_id", &self.model_id)
            .field("llm_api_key", &"<redacted>")
            .field("llm_base_url", &self.llm_base_url)
            .field("order_mcp_url", &self.order_mcp_url)
            .field("inventory_mcp_url", &self.inventory_mcp_url)
            .field("log", &self.log)
            .field("session_dir", &self.session_dir)
            .field("window_size", &self.window_size)
            .field("max_tool_calls", &self.max_tool_calls)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> AgentResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> AgentResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let required = |key: &str| {
            read(key).ok_or_else(|| AgentError::Config(format!("{} is required", key)))
        };
        let or_default = |key: &str, default: &str| read(key).unwrap_or_else(|| default.to_string());

        let pod_name = or_default("POD_NAME", DEFAULT_POD_NAME);
        let log = LogConfig {
            level: or_default("LOG_LEVEL", DEFAULT_LOG_LEVEL),
            json_stdout: read("OTEL_STDOUT_LOG_GROUP")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
            directory: read("LOG_GROUP").map(PathBuf::from),
            app_name: pod_name.clone(),
        };

        Ok(Self {
            pod_name,
            session_id: or_default("SESSION_ID", DEFAULT_SESSION_ID),
            region: read("REGION"),
            model_id: required("MODEL_ID")?,
            llm_api_key: required("LLM_API_KEY")?,
            llm_base_url: read("LLM_BASE_URL"),
            order_mcp_url: required("ORDER_MCP_URL")?,
            inventory_mcp_url: or_default("INVENTORY_MCP_URL", DEFAULT_INVENTORY_MCP_URL),
            log,
            session_dir: PathBuf::from(or_default("SESSION_DIR", DEFAULT_SESSION_DIR)),
            window_size: window_size(read("WINDOW_SIZE"))?,
            max_tool_calls: parse_or("MAX_TOOL_CALLS", read("MAX_TOOL_CALLS"), 3u32)?,
            llm_timeout: secs_or("LLM_TIMEOUT_SECS", read("LLM_TIMEOUT_SECS"), 60)?,
            tool_timeout: secs_or("TOOL_TIMEOUT_SECS", read("TOOL_TIMEOUT_SECS"), 30)?,
            subagent_timeout: secs_or("SUBAGENT_TIMEOUT_SECS", read("SUBAGENT_TIMEOUT_SECS"), 180)?,
            auth_token: read("AUTH_TOKEN"),
        })
    }

    /// Budgets for a sub-agent's own loop
    pub fn sub_agent_limits(&self) -> LoopLimits {
        LoopLimits {
            llm_timeout: self.llm_timeout,
            tool_timeout: self.tool_timeout,
            ..LoopLimits::default()
        }
    }

    /// Budgets for the orchestrator; its tools include whole sub-agent invocations
    pub fn orchestrator_limits(&self) -> LoopLimits {
        LoopLimits {
            llm_timeout: self.llm_timeout,
            tool_timeout: self.subagent_timeout,
            ..LoopLimits::default()
        }
    }

    /// Log the startup banner (secrets omitted)
    pub fn log_banner(&self) {
        tracing::info!("{}", "---".repeat(15));
        tracing::info!("POD_NAME: {}", self.pod_name);
        tracing::info!("SESSION_ID: {}", self.session_id);
        tracing::info!("REGION: {}", self.region.as_deref().unwrap_or("<unset>"));
        tracing::info!("MODEL_ID: {}", self.model_id);
        tracing::info!("ORDER_MCP_URL: {}", self.order_mcp_url);
        tracing::info!("INVENTORY_MCP_URL: {}", self.inventory_mcp_url);
        tracing::info!("SESSION_DIR: {}", self.session_dir.display());
        tracing::info!("LOG_LEVEL: {}", self.log.level);
        tracing::info!("{}", "---".repeat(15));
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, value: Option<String>, default: T) -> AgentResult<T> {
    match value {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| {
            AgentError::Config(format!("{} has invalid value '{}'", key, raw))
        }),
    }
}

/// A window must hold at least one plain exchange
fn window_size(value: Option<String>) -> AgentResult<usize> {
    let size = parse_or("WINDOW_SIZE", value, DEFAULT_WINDOW_SIZE)?;
    if size < MIN_WINDOW_SIZE {
        return Err(AgentError::Config(format!(
            "WINDOW_SIZE must be at least {}",
            MIN_WINDOW_SIZE
        )));
    }
    Ok(size)
}

fn secs_or(key: &str, value: Option<String>, default: u64) -> AgentResult<Duration> {
    let secs = parse_or(key, value, default)?;
    if secs == 0 {
        return Err(AgentError::Config(format!("{} must be greater than zero", key)));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const REQUIRED: &[(&str, &str)] = &[
        ("MODEL_ID", "model-x"),
        ("LLM_API_KEY", "sk-test"),
        ("ORDER_MCP_URL", "http://127.0.0.1:9001/mcp"),
    ];

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(REQUIRED)).unwrap();
        assert_eq!(config.pod_name, DEFAULT_POD_NAME);
        assert_eq!(config.session_id, DEFAULT_SESSION_ID);
        assert_eq!(config.inventory_mcp_url, DEFAULT_INVENTORY_MCP_URL);
        assert_eq!(config.session_dir, PathBuf::from("./sessions"));
        assert_eq!(config.window_size, 20);
        assert_eq!(config.max_tool_calls, 3);
        assert_eq!(config.subagent_timeout, Duration::from_secs(180));
        assert_eq!(config.log.level, "INFO");
        assert!(!config.log.json_stdout);
        assert!(config.log.directory.is_none());
        assert!(config.auth_token.is_none());
        assert!(config.region.is_none());
    }

    #[test]
    fn test_missing_required_is_named() {
        let err = AppConfig::from_lookup(lookup(&[("MODEL_ID", "m"), ("LLM_API_KEY", "k")]))
            .unwrap_err();
        assert!(matches!(err, AgentError::Config(ref msg) if msg == "ORDER_MCP_URL is required"));
    }

    #[test]
    fn test_overrides_and_invalid_numbers() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("OTEL_STDOUT_LOG_GROUP", "TRUE"),
            ("LOG_GROUP", "/var/log/agent"),
            ("AUTH_TOKEN", "jwt-abc"),
            ("WINDOW_SIZE", "8"),
            ("REGION", "  "),
        ]);
        let config = AppConfig::from_lookup(lookup(&pairs)).unwrap();
        assert!(config.log.json_stdout);
        assert_eq!(config.log.directory, Some(PathBuf::from("/var/log/agent")));
        assert_eq!(config.auth_token.as_deref(), Some("jwt-abc"));
        assert_eq!(config.window_size, 8);
        assert!(config.region.is_none());

        let mut tiny = REQUIRED.to_vec();
        tiny.push(("WINDOW_SIZE", "1"));
        let err = AppConfig::from_lookup(lookup(&tiny)).unwrap_err();
        assert!(matches!(err, AgentError::Config(ref msg) if msg == "WINDOW_SIZE must be at least 2"));

        pairs.push(("MAX_TOOL_CALLS", "many"));
        assert!(AppConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("AUTH_TOKEN", "jwt-secret"));
        let printed = format!("{:?}", AppConfig::from_lookup(lookup(&pairs)).unwrap());
        assert!(!printed.contains("sk-test"));
        assert!(!printed.contains("jwt-secret"));
    }
}

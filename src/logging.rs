//! Logging setup
//!
//! Human-readable logs go to stderr so they don't interleave with the REPL;
//! JSON logs go to stdout for log shippers. With a log directory configured a
//! daily rolling JSON file is written as well.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Level name, e.g. "INFO" or "debug"
    pub level: String,

    /// Emit JSON on stdout instead of text on stderr
    pub json_stdout: bool,

    /// Directory for the rolling log file
    pub directory: Option<PathBuf>,

    /// File name prefix for the rolling log file
    pub app_name: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            json_stdout: false,
            directory: None,
            app_name: "commerce-orchestrator".to_string(),
        }
    }
}

/// Map a level name onto an `EnvFilter` directive
pub fn level_directive(level: &str) -> &'static str {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" | "warning" => "warn",
        "error" | "critical" | "fatal" => "error",
        "off" => "off",
        _ => "info",
    }
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over the configured level when set. Keep the returned guard
/// alive for the life of the process or buffered file output is lost.
pub fn init_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level_directive(&config.level)))
        .context("Failed to build log filter")?;

    let json_layer = config
        .json_stdout
        .then(|| fmt::layer().json().with_target(false).with_writer(std::io::stdout));
    let text_layer = (!config.json_stdout)
        .then(|| fmt::layer().with_target(false).with_writer(std::io::stderr));

    let (file_layer, guard) = match &config.directory {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender =
                tracing_appender::rolling::daily(dir, format!("{}.log", config.app_name));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().json().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(text_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

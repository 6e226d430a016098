//! Interactive loop
//!
//! Reads one line at a time, routes it through the orchestrator and prints
//! the answer. `exit`/`quit` and Ctrl-C both clear the session directory.

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use super::console::Console;
use crate::agent::Orchestrator;
use crate::core::{AgentError, TokenStore};
use crate::session::SessionManager;

pub const EMPTY_INPUT_NOTICE: &str = "Please enter a valid message.";
pub const NOT_AUTHORIZED_NOTICE: &str = "No JWT provided, NOT AUTHORIZED !!!";

/// What a line of input asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputCommand {
    Exit,
    Empty,
    Message(String),
}

impl InputCommand {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return InputCommand::Empty;
        }
        if trimmed.eq_ignore_ascii_case("exit") || trimmed.eq_ignore_ascii_case("quit") {
            return InputCommand::Exit;
        }
        InputCommand::Message(trimmed.to_string())
    }
}

/// Whether the loop keeps going after a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Why the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplExit {
    UserExit,
    Interrupted,
    EndOfInput,
}

pub struct Repl {
    console: Console,
    orchestrator: Orchestrator,
    sessions: SessionManager,
    session_id: String,
    tokens: TokenStore,
    cancel: CancellationToken,
}

impl Repl {
    pub fn new(
        console: Console,
        orchestrator: Orchestrator,
        sessions: SessionManager,
        session_id: impl Into<String>,
        tokens: TokenStore,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            console,
            orchestrator,
            sessions,
            session_id: session_id.into(),
            tokens,
            cancel,
        }
    }

    /// Run until exit, end of input or interruption
    pub async fn run(&mut self) -> Result<ReplExit> {
        self.console.print_banner();

        loop {
            self.console.print_input_separator();

            let read = tokio::task::spawn_blocking(|| Console::new().read_input());
            let line = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Ok(self.interrupted()),
                joined = read => joined??,
            };

            let Some(line) = line else {
                tracing::info!("[Repl] End of input");
                self.sessions.clear(&self.session_id);
                return Ok(ReplExit::EndOfInput);
            };
            self.console.print_input_separator();

            if self.handle_line(&line).await == Flow::Exit {
                return Ok(ReplExit::UserExit);
            }

            if self.cancel.is_cancelled() {
                return Ok(self.interrupted());
            }
        }
    }

    /// Process one line of input
    pub async fn handle_line(&mut self, line: &str) -> Flow {
        match InputCommand::parse(line) {
            InputCommand::Exit => {
                tracing::info!("[Repl] User requested exit");
                self.console.print_system("\nGoodbye!");
                self.sessions.clear(&self.session_id);
                Flow::Exit
            }
            InputCommand::Empty => {
                self.console.print_system(EMPTY_INPUT_NOTICE);
                Flow::Continue
            }
            InputCommand::Message(text) => {
                let Some(token) = self.tokens.get_token() else {
                    self.console.print_warning(NOT_AUTHORIZED_NOTICE);
                    return Flow::Continue;
                };

                self.console.print_processing();
                match self.orchestrator.respond(&text, Some(&token)).await {
                    Ok(answer) => self.console.print_answer(&answer),
                    Err(AgentError::Cancelled) => {
                        tracing::info!("[Repl] Turn cancelled");
                    }
                    Err(e) => {
                        tracing::error!("[Repl] Turn failed: {}", e);
                        self.console.print_error(&e.to_string());
                    }
                }
                Flow::Continue
            }
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    fn interrupted(&self) -> ReplExit {
        self.console
            .print_system("\n\nExecution interrupted. Exiting...");
        self.sessions.clear(&self.session_id);
        ReplExit::Interrupted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        assert_eq!(InputCommand::parse("exit"), InputCommand::Exit);
        assert_eq!(InputCommand::parse("  QUIT \n"), InputCommand::Exit);
        assert_eq!(InputCommand::parse("   "), InputCommand::Empty);
        assert_eq!(InputCommand::parse(""), InputCommand::Empty);
        assert_eq!(
            InputCommand::parse(" get order 1\n"),
            InputCommand::Message("get order 1".to_string())
        );
        assert_eq!(
            InputCommand::parse("exit now"),
            InputCommand::Message("exit now".to_string())
        );
    }
}

//! Sliding conversation window
//!
//! Keeps the transcript to a fixed number of messages. Trimming removes the
//! oldest messages and never leaves the window starting on an assistant turn
//! or on a tool-result message whose tool call was dropped. A window smaller
//! than the newest turn keeps that turn whole instead of emptying the transcript.

use crate::llm::{ContentBlock, Message};

pub const DEFAULT_WINDOW_SIZE: usize = 20;
/// One user message and its answer
pub const MIN_WINDOW_SIZE: usize = 2;
pub const DEFAULT_MAX_TOOL_RESULT_CHARS: usize = 16_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlidingWindow {
    pub window_size: usize,
    pub max_tool_result_chars: usize,
}

impl Default for SlidingWindow {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            max_tool_result_chars: DEFAULT_MAX_TOOL_RESULT_CHARS,
        }
    }
}

impl SlidingWindow {
    pub fn new(window_size: usize) -> Self {
        Self {
            window_size: window_size.max(1),
            ..Self::default()
        }
    }

    pub fn with_max_tool_result_chars(mut self, max: usize) -> Self {
        self.max_tool_result_chars = max;
        self
    }

    /// Truncate oversized tool results, then trim to the window.
    ///
    /// Returns true when anything changed.
    pub fn apply(&self, messages: &mut Vec<Message>) -> bool {
        let truncated = self.truncate_tool_results(messages);

        let before = messages.len();
        let tail = before.saturating_sub(self.window_size);
        let start = match messages[tail..].iter().position(is_turn_start) {
            Some(offset) => tail + offset,
            // The newest turn alone is longer than the window: keep it whole
            None => messages.iter().rposition(is_turn_start).unwrap_or(before),
        };
        messages.drain(..start);

        if messages.len() != before {
            tracing::debug!(
                "[SlidingWindow] Trimmed transcript from {} to {} messages",
                before,
                messages.len()
            );
        }

        truncated || messages.len() != before
    }

    fn truncate_tool_results(&self, messages: &mut [Message]) -> bool {
        let mut changed = false;
        for message in messages.iter_mut() {
            let Some(blocks) = message.blocks_mut() else {
                continue;
            };
            for block in blocks.iter_mut() {
                if let ContentBlock::ToolResult {
                    content: Some(content),
                    ..
                } = block
                {
                    let total = content.chars().count();
                    if total > self.max_tool_result_chars {
                        let kept: String = content.chars().take(self.max_tool_result_chars).collect();
                        *content = format!(
                            "{}\n... [truncated {} characters]",
                            kept,
                            total - self.max_tool_result_chars
                        );
                        changed = true;
                    }
                }
            }
        }
        changed
    }
}

/// A plain user message: the only valid first message of a window
fn is_turn_start(message: &Message) -> bool {
    message.is_user_turn()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool_exchange(id: &str, output: &str) -> Vec<Message> {
        vec![
            Message::assistant_with_blocks(vec![ContentBlock::tool_use(id, "calculator", json!({}))]),
            Message::user_with_blocks(vec![ContentBlock::tool_result(id, output, false)]),
        ]
    }

    #[test]
    fn test_short_transcript_untouched() {
        let window = SlidingWindow::new(4);
        let mut messages = vec![Message::user("a"), Message::assistant("b")];
        assert!(!window.apply(&mut messages));
        assert_eq!(messages.len(), 2);
    }

    #[test]
    fn test_never_exceeds_size() {
        let window = SlidingWindow::new(20);
        let mut messages = Vec::new();
        for i in 0..30 {
            messages.push(Message::user(format!("q{i}")));
            messages.push(Message::assistant(format!("a{i}")));
        }
        assert!(window.apply(&mut messages));
        assert_eq!(messages.len(), 20);
        assert_eq!(messages[0].text(), Some("q20"));
    }

    #[test]
    fn test_never_starts_with_tool_result() {
        let window = SlidingWindow::new(3);
        let mut messages = vec![Message::user("q1")];
        messages.extend(tool_exchange("t1", "2"));
        messages.push(Message::assistant("two"));
        messages.push(Message::user("q2"));
        messages.push(Message::assistant("ok"));

        window.apply(&mut messages);
        assert_eq!(messages, vec![Message::user("q2"), Message::assistant("ok")]);
    }

    #[test]
    fn test_window_smaller_than_last_turn_keeps_it() {
        let window = SlidingWindow::new(3);
        let mut messages = vec![Message::user("q0"), Message::assistant("a0")];
        messages.push(Message::user("q1"));
        messages.extend(tool_exchange("t1", "2"));
        messages.push(Message::assistant("two"));

        window.apply(&mut messages);
        assert_eq!(messages.len(), 4);
        assert_eq!(messages[0], Message::user("q1"));
        assert_eq!(messages[3], Message::assistant("two"));
    }

    #[test]
    fn test_window_of_one_keeps_latest_exchange() {
        let window = SlidingWindow::new(1);
        let mut messages = vec![
            Message::user("a"),
            Message::assistant("b"),
            Message::user("c"),
            Message::assistant("d"),
        ];

        assert!(window.apply(&mut messages));
        assert_eq!(messages, vec![Message::user("c"), Message::assistant("d")]);
    }

    #[test]
    fn test_truncates_large_tool_results() {
        let window = SlidingWindow::new(20).with_max_tool_result_chars(5);
        let mut messages = vec![Message::user("q")];
        messages.extend(tool_exchange("t1", "0123456789"));

        assert!(window.apply(&mut messages));
        match &messages[2].blocks()[0] {
            ContentBlock::ToolResult { content, .. } => {
                assert_eq!(
                    content.as_deref(),
                    Some("01234\n... [truncated 5 characters]")
                );
            }
            other => panic!("unexpected block: {:?}", other),
        }
    }
}

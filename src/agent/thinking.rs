use std::sync::OnceLock;

use regex::Regex;

fn thinking_block() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<thinking>.*?</thinking>").ok())
        .as_ref()
}

/// Remove every `<thinking>...</thinking>` block and trim the result.
///
/// Repeats until nothing changes, so nested or re-formed tags are removed too.
pub fn strip_thinking(text: &str) -> String {
    let Some(re) = thinking_block() else {
        return text.trim().to_string();
    };
    let mut current = text.to_string();
    loop {
        let next = re.replace_all(&current, "").into_owned();
        if next == current {
            break;
        }
        current = next;
    }
    current.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_thinking() {
        assert_eq!(
            strip_thinking("<thinking>route to order</thinking>Order #123: shipped"),
            "Order #123: shipped"
        );
        assert_eq!(
            strip_thinking("  a <thinking>x\ny</thinking> b <thinking></thinking> "),
            "a  b"
        );
        assert_eq!(strip_thinking("no tags"), "no tags");
    }

    #[test]
    fn test_strip_thinking_idempotent() {
        let once = strip_thinking("<thin<thinking>x</thinking>king>y</thinking>done");
        assert_eq!(once, "done");
        assert_eq!(strip_thinking(&once), once);
    }
}

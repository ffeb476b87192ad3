//! Pulling the edited document out of an assistant reply
//!
//! Replies usually wrap the revised document in a fenced block and add a
//! short explanation around it. Only the document part is applied.

use regex::Regex;
use std::sync::OnceLock;

/// Candidate patterns, tried in order. Group 1 is the document.
fn patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"```markdown\n([\s\S]*?)\n```",
            r"```\n([\s\S]*?)\n```",
            r"```([\s\S]*?)```",
            r"(?:^|\n)(# [\s\S]*?)(?:\n\n|\n$|$)",
        ]
        .iter()
        .filter_map(|p| Regex::new(p).ok())
        .collect()
    })
}

/// Find the Markdown document inside `reply`.
///
/// The first pattern whose first match has non-blank content wins. When no
/// pattern applies, everything from the first line starting with `#` is
/// taken. Returns `None` if that is empty too.
pub fn extract_markdown(reply: &str) -> Option<String> {
    for pattern in patterns() {
        if let Some(found) = pattern
            .captures(reply)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim())
            .filter(|text| !text.is_empty())
        {
            return Some(found.to_string());
        }
    }

    let tail: Vec<&str> = reply
        .split('\n')
        .skip_while(|line| !line.trim().starts_with('#'))
        .collect();
    let tail = tail.join("\n");
    let tail = tail.trim();

    if tail.is_empty() {
        None
    } else {
        Some(tail.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

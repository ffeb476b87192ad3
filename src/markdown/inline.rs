//! Inline span parsing
//!
//! Splits one line of Markdown into styled runs. Only the three delimiter
//! pairs used by the editor toolbar are recognised: `**bold**`, `*italic*`
//! and `` `code` ``. Styles never nest; inner delimiters pass through as
//! literal characters.

use regex::Regex;
use std::sync::OnceLock;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// Set of styles applied to a run.
///
/// `code` is exclusive: a code run never carries bold or italic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InlineStyle {
    pub bold: bool,
    pub italic: bool,
    pub code: bool,
}

impl InlineStyle {
    pub const PLAIN: InlineStyle = InlineStyle {
        bold: false,
        italic: false,
        code: false,
    };

    pub const BOLD: InlineStyle = InlineStyle {
        bold: true,
        italic: false,
        code: false,
    };

    pub const ITALIC: InlineStyle = InlineStyle {
        bold: false,
        italic: true,
        code: false,
    };

    pub const CODE: InlineStyle = InlineStyle {
        bold: false,
        italic: false,
        code: true,
    };

    /// True when no style flag is set.
    pub fn is_plain(&self) -> bool {
        *self == Self::PLAIN
    }
}

/// A contiguous span of text with delimiters stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineRun {
    pub text: String,
    pub style: InlineStyle,
}

impl InlineRun {
    pub fn new(text: impl Into<String>, style: InlineStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new(text, InlineStyle::PLAIN)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parsing
// ─────────────────────────────────────────────────────────────────────────────

/// Bold is tried before single-asterisk italic so the outer pair of a bold
/// span is never read as two italic delimiters.
fn span_pattern() -> Option<&'static Regex> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"\*\*.*?\*\*|\*.*?\*|`.*?`").ok())
        .as_ref()
}

/// Parse a line into inline runs.
///
/// Concatenating the returned texts reproduces `line` minus the delimiters
/// of recognised spans. Adjacent literal segments are merged, so a line
/// without styled spans yields exactly one plain run. An empty line yields
/// no runs.
pub fn parse_inline(line: &str) -> Vec<InlineRun> {
    let mut runs: Vec<InlineRun> = Vec::new();
    let Some(pattern) = span_pattern() else {
        push_literal(&mut runs, line);
        return runs;
    };
    let mut last_end = 0;

    for m in pattern.find_iter(line) {
        push_literal(&mut runs, &line[last_end..m.start()]);
        match classify_segment(m.as_str()) {
            Some(run) => runs.push(run),
            None => push_literal(&mut runs, m.as_str()),
        }
        last_end = m.end();
    }
    push_literal(&mut runs, &line[last_end..]);

    runs
}

/// Decide whether a matched segment is a styled span.
///
/// Segments no longer than their delimiter pair (`**`, `****`, `**`, ``` `` ```)
/// are literal text.
fn classify_segment(segment: &str) -> Option<InlineRun> {
    let len = segment.len();

    if segment.starts_with("**") && segment.ends_with("**") && len > 4 {
        return Some(InlineRun::new(&segment[2..len - 2], InlineStyle::BOLD));
    }

    if segment.starts_with('*') && segment.ends_with('*') && len > 2 && !segment.starts_with("**")
    {
        return Some(InlineRun::new(&segment[1..len - 1], InlineStyle::ITALIC));
    }

    if segment.starts_with('`') && segment.ends_with('`') && len > 2 {
        return Some(InlineRun::new(&segment[1..len - 1], InlineStyle::CODE));
    }

    None
}

/// Append literal text, merging into a trailing plain run.
fn push_literal(runs: &mut Vec<InlineRun>, text: &str) {
    if text.is_empty() {
        return;
    }
    match runs.last_mut() {
        Some(last) if last.style.is_plain() => last.text.push_str(text),
        _ => runs.push(InlineRun::plain(text)),
    }
}

/// Text of the runs joined back together (delimiters stripped).
#[cfg(test)]
pub fn runs_to_text(runs: &[InlineRun]) -> String {
    runs.iter().map(|run| run.text.as_str()).collect()
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

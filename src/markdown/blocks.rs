//! Block classification
//!
//! Turns document text into an ordered list of [`Block`]s in a single
//! forward pass. Every line is trimmed before it is classified. The only
//! lookahead is the fenced code region, which absorbs lines until a closing
//! fence or the end of input.

use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Block Kind
// ─────────────────────────────────────────────────────────────────────────────

/// Classification of a single source line or code-fence region.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BlockKind {
    /// `# ` prefix
    Heading1,
    /// `## ` prefix
    Heading2,
    /// `### ` prefix
    Heading3,
    /// `> ` prefix
    Blockquote,
    /// `- ` or `* ` prefix
    BulletItem,
    /// `<digits>. ` prefix; the digit run is kept verbatim as the display index
    OrderedItem { index: String },
    /// Fenced region; `body` is the trimmed text between the fences
    CodeFence {
        language: Option<String>,
        body: String,
    },
    /// Fallback for any other non-blank line
    Paragraph,
    /// Empty or whitespace-only line
    Blank,
}

impl BlockKind {
    /// Heading level for heading kinds.
    pub fn heading_level(&self) -> Option<u8> {
        match self {
            BlockKind::Heading1 => Some(1),
            BlockKind::Heading2 => Some(2),
            BlockKind::Heading3 => Some(3),
            _ => None,
        }
    }

    /// Short label used in logs and the CLI.
    pub fn label(&self) -> &'static str {
        match self {
            BlockKind::Heading1 => "heading1",
            BlockKind::Heading2 => "heading2",
            BlockKind::Heading3 => "heading3",
            BlockKind::Blockquote => "blockquote",
            BlockKind::BulletItem => "bullet-item",
            BlockKind::OrderedItem { .. } => "ordered-item",
            BlockKind::CodeFence { .. } => "code-fence",
            BlockKind::Paragraph => "paragraph",
            BlockKind::Blank => "blank",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Block
// ─────────────────────────────────────────────────────────────────────────────

/// A classified unit of source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub kind: BlockKind,
    /// Content after the block marker (heading hashes, `> `, list marker).
    /// For code fences, every source line of the region joined with `\n`.
    pub raw_text: String,
    /// 1-based line number where the block starts
    pub line: usize,
}

impl Block {
    pub fn new(kind: BlockKind, raw_text: impl Into<String>, line: usize) -> Self {
        Self {
            kind,
            raw_text: raw_text.into(),
            line,
        }
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{} {:?}", self.line, self.kind.label(), self.raw_text)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Line Classification
// ─────────────────────────────────────────────────────────────────────────────

/// Fence delimiter
const FENCE: &str = "```";

/// Classify one already-trimmed line.
///
/// Returns the kind and the text after the marker. A fence opener returns
/// `CodeFence` with an empty body; [`classify`] fills it in.
///
/// Precedence (first match wins): blank, heading, blockquote, fence opener,
/// bullet, ordered item, paragraph. `####` and deeper fall through to
/// paragraph.
pub fn classify_line(line: &str) -> (BlockKind, &str) {
    if line.is_empty() {
        return (BlockKind::Blank, line);
    }

    if let Some(rest) = line.strip_prefix("# ") {
        return (BlockKind::Heading1, rest);
    }
    if let Some(rest) = line.strip_prefix("## ") {
        return (BlockKind::Heading2, rest);
    }
    if let Some(rest) = line.strip_prefix("### ") {
        return (BlockKind::Heading3, rest);
    }

    if let Some(rest) = line.strip_prefix("> ") {
        return (BlockKind::Blockquote, rest);
    }

    if let Some(info) = line.strip_prefix(FENCE) {
        let language = info.trim();
        let language = (!language.is_empty()).then(|| language.to_string());
        return (
            BlockKind::CodeFence {
                language,
                body: String::new(),
            },
            info,
        );
    }

    if let Some(rest) = line.strip_prefix("- ").or_else(|| line.strip_prefix("* ")) {
        return (BlockKind::BulletItem, rest);
    }

    if let Some((index, rest)) = split_ordered_marker(line) {
        return (
            BlockKind::OrderedItem {
                index: index.to_string(),
            },
            rest,
        );
    }

    (BlockKind::Paragraph, line)
}

/// Split `<digits>. rest` into `(digits, rest)`.
fn split_ordered_marker(line: &str) -> Option<(&str, &str)> {
    let digits_end = line
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(line.len());

    if digits_end == 0 {
        return None;
    }

    line[digits_end..]
        .strip_prefix(". ")
        .map(|rest| (&line[..digits_end], rest))
}

// ─────────────────────────────────────────────────────────────────────────────
// Document Classification
// ─────────────────────────────────────────────────────────────────────────────

/// Classify a whole document.
///
/// Blank lines separate blocks and are not emitted. A code fence without a
/// closing delimiter absorbs every remaining line.
pub fn classify(text: &str) -> Vec<Block> {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i].trim();
        let line_number = i + 1;

        match classify_line(line) {
            (BlockKind::Blank, _) => {}
            (BlockKind::CodeFence { language, .. }, _) => {
                i += 1;
                let start = i;
                while i < lines.len() && !lines[i].trim().starts_with(FENCE) {
                    i += 1;
                }
                let region = &lines[start..i];
                let raw = region.join("\n");
                let body = raw.trim().to_string();
                blocks.push(Block::new(
                    BlockKind::CodeFence { language, body },
                    raw,
                    line_number,
                ));
            }
            (kind, rest) => blocks.push(Block::new(kind, rest, line_number)),
        }

        i += 1;
    }

    blocks
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

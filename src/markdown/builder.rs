//! Document builder
//!
//! Walks classified blocks in order and emits one structural node per block,
//! carrying the formatting metadata exporters need. The spacing and indent
//! values are a fixed builder policy measured in twentieths of a point
//! (twips), the unit WordprocessingML uses.

use super::blocks::{classify, Block, BlockKind};
use super::inline::{parse_inline, InlineRun};
use crate::editor::TextStats;
use chrono::{DateTime, Utc};

// ─────────────────────────────────────────────────────────────────────────────
// Layout Policy
// ─────────────────────────────────────────────────────────────────────────────

/// Space after a level 1 heading
pub const SPACING_HEADING1: u32 = 240;
/// Space after a level 2 heading
pub const SPACING_HEADING2: u32 = 200;
/// Space after a level 3 heading
pub const SPACING_HEADING3: u32 = 160;
/// Space after a blockquote
pub const SPACING_BLOCKQUOTE: u32 = 200;
/// Space after a code block
pub const SPACING_CODE: u32 = 200;
/// Space after a list item
pub const SPACING_LIST_ITEM: u32 = 120;
/// Space after a paragraph
pub const SPACING_PARAGRAPH: u32 = 120;

/// Left indent of a blockquote
pub const INDENT_BLOCKQUOTE: u32 = 720;
/// Left indent of a list item
pub const INDENT_LIST_ITEM: u32 = 360;

// ─────────────────────────────────────────────────────────────────────────────
// Nodes
// ─────────────────────────────────────────────────────────────────────────────

/// What a node renders as.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeContent {
    /// Heading text is kept raw; inline markers are not stripped.
    Heading { level: u8, text: String },
    Paragraph { runs: Vec<InlineRun> },
    Blockquote { runs: Vec<InlineRun> },
    BulletItem { runs: Vec<InlineRun> },
    OrderedItem { index: String, runs: Vec<InlineRun> },
    CodeBlock {
        language: Option<String>,
        body: String,
    },
}

/// One structural node with its layout metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentNode {
    pub content: NodeContent,
    /// Space after the node, in twips
    pub spacing_after: u32,
    /// Left indent, in twips
    pub indent_left: u32,
    /// 1-based source line the node came from
    pub source_line: usize,
}

impl DocumentNode {
    /// Inline runs for node kinds that carry them.
    pub fn runs(&self) -> Option<&[InlineRun]> {
        match &self.content {
            NodeContent::Paragraph { runs }
            | NodeContent::Blockquote { runs }
            | NodeContent::BulletItem { runs }
            | NodeContent::OrderedItem { runs, .. } => Some(runs),
            NodeContent::Heading { .. } | NodeContent::CodeBlock { .. } => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// ExportDocument
// ─────────────────────────────────────────────────────────────────────────────

/// Serialization-ready representation of a whole document.
///
/// Built fresh for every export from the current content and discarded
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportDocument {
    pub title: String,
    pub generated_at: DateTime<Utc>,
    pub stats: TextStats,
    pub nodes: Vec<DocumentNode>,
}

impl ExportDocument {
    /// Classify and build `content` in one step.
    pub fn from_markdown(content: &str, title: &str) -> Self {
        build_document(&classify(content), title, TextStats::from_text(content))
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Description embedded in exported document metadata.
    pub fn description(&self, creator: &str) -> String {
        format!(
            "Generated by {} | {} words | {} characters",
            creator, self.stats.words, self.stats.characters
        )
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Building
// ─────────────────────────────────────────────────────────────────────────────

/// Build one node per non-blank block, preserving order.
pub fn build_document(blocks: &[Block], title: &str, stats: TextStats) -> ExportDocument {
    let nodes = blocks.iter().filter_map(build_node).collect();

    ExportDocument {
        title: title.to_string(),
        generated_at: Utc::now(),
        stats,
        nodes,
    }
}

fn build_node(block: &Block) -> Option<DocumentNode> {
    let (content, spacing_after, indent_left) = match &block.kind {
        BlockKind::Heading1 | BlockKind::Heading2 | BlockKind::Heading3 => {
            let level = block.kind.heading_level().unwrap_or(1);
            let spacing = match level {
                1 => SPACING_HEADING1,
                2 => SPACING_HEADING2,
                _ => SPACING_HEADING3,
            };
            (
                NodeContent::Heading {
                    level,
                    text: block.raw_text.clone(),
                },
                spacing,
                0,
            )
        }
        BlockKind::Blockquote => (
            NodeContent::Blockquote {
                runs: parse_inline(&block.raw_text),
            },
            SPACING_BLOCKQUOTE,
            INDENT_BLOCKQUOTE,
        ),
        BlockKind::BulletItem => (
            NodeContent::BulletItem {
                runs: parse_inline(&block.raw_text),
            },
            SPACING_LIST_ITEM,
            INDENT_LIST_ITEM,
        ),
        BlockKind::OrderedItem { index } => (
            NodeContent::OrderedItem {
                index: index.clone(),
                runs: parse_inline(&block.raw_text),
            },
            SPACING_LIST_ITEM,
            INDENT_LIST_ITEM,
        ),
        BlockKind::CodeFence { language, body } => (
            NodeContent::CodeBlock {
                language: language.clone(),
                body: body.clone(),
            },
            SPACING_CODE,
            0,
        ),
        BlockKind::Paragraph => (
            NodeContent::Paragraph {
                runs: parse_inline(&block.raw_text),
            },
            SPACING_PARAGRAPH,
            0,
        ),
        BlockKind::Blank => return None,
    };

    Some(DocumentNode {
        content,
        spacing_after,
        indent_left,
        source_line: block.line,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markdown::inline::InlineStyle;

    #[test]
    fn test_title_and_bold_paragraph() {
        let doc = ExportDocument::from_markdown("# Title\n\nSome **bold** text", "Notes");
        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(
            doc.nodes[0].content,
            NodeContent::Heading {
                level: 1,
                text: "Title".to_string()
            }
        );
        assert_eq!(
            doc.nodes[1].content,
            NodeContent::Paragraph {
                runs: vec![
                    InlineRun::plain("Some "),
                    InlineRun::new("bold", InlineStyle::BOLD),
                    InlineRun::plain(" text"),
                ]
            }
        );
    }

    #[test]
    fn test_heading_markers_not_stripped() {
        let doc = ExportDocument::from_markdown("## A **loud** heading", "t");
        assert_eq!(
            doc.nodes[0].content,
            NodeContent::Heading {
                level: 2,
                text: "A **loud** heading".to_string()
            }
        );
        assert!(doc.nodes[0].runs().is_none());
    }

    #[test]
    fn test_node_order_matches_blocks_without_merging() {
        let doc = ExportDocument::from_markdown("- one\n- two\n\n1. first\n2. second", "t");
        let lines: Vec<usize> = doc.nodes.iter().map(|n| n.source_line).collect();
        assert_eq!(lines, vec![1, 2, 4, 5]);
        assert!(matches!(
            &doc.nodes[3].content,
            NodeContent::OrderedItem { index, .. } if index == "2"
        ));
    }

    #[test]
    fn test_spacing_policy() {
        let doc = ExportDocument::from_markdown(
            "# h1\n## h2\n### h3\n> quote\n- item\npara\n```\ncode\n```",
            "t",
        );
        let spacing: Vec<u32> = doc.nodes.iter().map(|n| n.spacing_after).collect();
        assert_eq!(spacing, vec![240, 200, 160, 200, 120, 120, 200]);
        assert!(SPACING_HEADING1 > SPACING_BLOCKQUOTE);
        assert!(SPACING_BLOCKQUOTE > SPACING_LIST_ITEM);
        assert!(SPACING_LIST_ITEM >= SPACING_PARAGRAPH);
    }

    #[test]
    fn test_indents() {
        let doc = ExportDocument::from_markdown("> q\n- b\n3. o\np", "t");
        let indents: Vec<u32> = doc.nodes.iter().map(|n| n.indent_left).collect();
        assert_eq!(indents, vec![720, 360, 360, 0]);
    }

    #[test]
    fn test_inline_runs_in_quotes_and_lists() {
        let doc = ExportDocument::from_markdown("> *soft*\n- `code` item", "t");
        let quote_runs = doc.nodes[0].runs().unwrap();
        assert_eq!(quote_runs, &[InlineRun::new("soft", InlineStyle::ITALIC)]);
        let item_runs = doc.nodes[1].runs().unwrap();
        assert_eq!(item_runs[0], InlineRun::new("code", InlineStyle::CODE));
        assert_eq!(item_runs[1], InlineRun::plain(" item"));
    }

    #[test]
    fn test_empty_content_builds_empty_document() {
        let doc = ExportDocument::from_markdown("", "Empty");
        assert!(doc.is_empty());
        assert_eq!(doc.title, "Empty");
        assert_eq!(doc.stats.words, 0);
    }

    #[test]
    fn test_description_contains_counts() {
        let doc = ExportDocument::from_markdown("two words", "t");
        assert_eq!(
            doc.description("Scribe"),
            "Generated by Scribe | 2 words | 9 characters"
        );
    }
}

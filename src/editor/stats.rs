//! Word count and reading time
//!
//! Counts are line based: a paragraph is any line with visible text, which
//! is how the document list and export metadata report them.

use std::fmt;

/// Reading speed behind [`TextStats::reading_minutes`].
pub const WORDS_PER_MINUTE: usize = 200;

/// Counts for one piece of document text.
///
/// ```ignore
/// let stats = TextStats::from_text("# Plan\n\nShip on Friday.");
/// assert_eq!(stats.words, 5);
/// assert_eq!(stats.paragraphs, 2);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TextStats {
    /// Whitespace-separated tokens; Markdown markers count as words
    pub words: usize,
    /// Unicode scalar values, whitespace included
    pub characters: usize,
    pub characters_no_spaces: usize,
    /// `\n`-separated lines; empty text has one
    pub lines: usize,
    /// Lines containing at least one non-whitespace character
    pub paragraphs: usize,
    /// `words / WORDS_PER_MINUTE`, rounded up
    pub reading_minutes: usize,
}

impl TextStats {
    pub fn from_text(text: &str) -> Self {
        let mut stats = Self::default();

        for line in text.split('\n') {
            stats.lines += 1;
            let words = line.split_whitespace().count();
            if words > 0 {
                stats.paragraphs += 1;
                stats.words += words;
            }
        }

        stats.characters = text.chars().count();
        stats.characters_no_spaces = text.chars().filter(|c| !c.is_whitespace()).count();
        stats.reading_minutes = stats.words.div_ceil(WORDS_PER_MINUTE);
        stats
    }

    /// Single-line summary, e.g. `12 words | 80 chars | 3 lines`.
    pub fn format_compact(&self) -> String {
        format!(
            "{} words | {} chars | {} lines",
            self.words, self.characters, self.lines
        )
    }
}

impl fmt::Display for TextStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Words:                  {}", self.words)?;
        writeln!(f, "Characters:             {}", self.characters)?;
        writeln!(f, "Characters (no spaces): {}", self.characters_no_spaces)?;
        writeln!(f, "Lines:                  {}", self.lines)?;
        writeln!(f, "Paragraphs:             {}", self.paragraphs)?;
        write!(f, "Reading time:           {} min", self.reading_minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_text_has_one_line() {
        let stats = TextStats::from_text("");
        assert_eq!(
            stats,
            TextStats {
                lines: 1,
                ..TextStats::default()
            }
        );
    }

    #[test]
    fn test_markdown_document() {
        let stats = TextStats::from_text("# Plan\n\nShip on Friday.");
        assert_eq!(stats.words, 5);
        assert_eq!(stats.lines, 3);
        assert_eq!(stats.paragraphs, 2);
        assert_eq!(stats.characters, 23);
        assert_eq!(stats.characters_no_spaces, 18);
        assert_eq!(stats.reading_minutes, 1);
    }

    #[test]
    fn test_blank_and_trailing_lines() {
        let stats = TextStats::from_text("# Title\n\nLine one\nLine two\n   \n");
        assert_eq!(stats.lines, 6);
        assert_eq!(stats.paragraphs, 3);
        assert_eq!(stats.words, 6);
    }

    #[test]
    fn test_whitespace_only() {
        let stats = TextStats::from_text(" \t\n\n  ");
        assert_eq!(stats.words, 0);
        assert_eq!(stats.paragraphs, 0);
        assert_eq!(stats.characters, 6);
        assert_eq!(stats.characters_no_spaces, 0);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        let stats = TextStats::from_text("Grüße, 世界");
        assert_eq!(stats.words, 2);
        assert_eq!(stats.characters, 9);
        assert_eq!(stats.characters_no_spaces, 8);
    }

    #[test]
    fn test_reading_time_boundaries() {
        let exact = vec!["w"; WORDS_PER_MINUTE].join(" ");
        assert_eq!(TextStats::from_text(&exact).reading_minutes, 1);

        let over = vec!["w"; WORDS_PER_MINUTE + 1].join("\n");
        assert_eq!(TextStats::from_text(&over).reading_minutes, 2);
    }

    #[test]
    fn test_summaries() {
        let stats = TextStats::from_text("one two\nthree");
        assert_eq!(stats.format_compact(), "3 words | 13 chars | 2 lines");
        assert!(stats.to_string().ends_with("Reading time:           1 min"));
    }
}

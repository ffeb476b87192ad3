//! Change preview for proposed edits
//!
//! Compares the live document with a proposed replacement (usually an
//! assistant edit) line by line, so the user can review before committing.
//!
//! The default mode is positional: line `i` is compared with line `i`.
//! An insertion near the top therefore reports every following line as
//! modified. [`DiffMode::Aligned`] is an opt-in LCS alignment that reports
//! insertions and removals once; its output differs from the positional
//! mode for the same input.

use log::warn;
use serde::Serialize;
use std::fmt;

// ─────────────────────────────────────────────────────────────────────────────
// Types
// ─────────────────────────────────────────────────────────────────────────────

/// How a line changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Added,
    Removed,
    Modified,
}

impl ChangeKind {
    /// Single-character marker for terminal output.
    pub fn marker(&self) -> char {
        match self {
            ChangeKind::Added => '+',
            ChangeKind::Removed => '-',
            ChangeKind::Modified => '~',
        }
    }
}

/// One line-level delta between original and proposed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEntry {
    /// 1-based line number
    pub line_number: usize,
    pub old_line: String,
    pub new_line: String,
    pub kind: ChangeKind,
}

impl fmt::Display for ChangeEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = self.kind.marker();
        match self.kind {
            ChangeKind::Added => write!(f, "{} {:>4} {}", marker, self.line_number, self.new_line),
            ChangeKind::Removed => write!(f, "{} {:>4} {}", marker, self.line_number, self.old_line),
            ChangeKind::Modified => write!(
                f,
                "{} {:>4} {} => {}",
                marker, self.line_number, self.old_line, self.new_line
            ),
        }
    }
}

/// Diff strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DiffMode {
    /// Index-aligned comparison (no re-synchronisation)
    #[default]
    Positional,
    /// Longest-common-subsequence alignment
    Aligned,
}

// ─────────────────────────────────────────────────────────────────────────────
// Positional Diff
// ─────────────────────────────────────────────────────────────────────────────

/// Positional line diff.
///
/// A side that is shorter contributes empty lines. An entry is `Added` when
/// the original line is empty, `Removed` when the proposed line is empty,
/// otherwise `Modified`.
pub fn diff(original: &str, proposed: &str) -> Vec<ChangeEntry> {
    let old_lines: Vec<&str> = original.split('\n').collect();
    let new_lines: Vec<&str> = proposed.split('\n').collect();
    let max_len = old_lines.len().max(new_lines.len());

    (0..max_len)
        .filter_map(|i| {
            let old_line = old_lines.get(i).copied().unwrap_or("");
            let new_line = new_lines.get(i).copied().unwrap_or("");
            if old_line == new_line {
                return None;
            }
            let kind = if old_line.is_empty() {
                ChangeKind::Added
            } else if new_line.is_empty() {
                ChangeKind::Removed
            } else {
                ChangeKind::Modified
            };
            Some(ChangeEntry {
                line_number: i + 1,
                old_line: old_line.to_string(),
                new_line: new_line.to_string(),
                kind,
            })
        })
        .collect()
}

/// Diff with an explicit strategy.
pub fn diff_with(original: &str, proposed: &str, mode: DiffMode) -> Vec<ChangeEntry> {
    match mode {
        DiffMode::Positional => diff(original, proposed),
        DiffMode::Aligned => diff_aligned(original, proposed),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Aligned Diff
// ─────────────────────────────────────────────────────────────────────────────

/// Largest LCS table [`DiffMode::Aligned`] will build, in cells.
///
/// The table is `(n + 1) * (m + 1)` for the lines left after trimming the
/// common prefix and suffix. Larger inputs fall back to the positional diff.
pub const MAX_ALIGNED_CELLS: usize = 4_000_000;

/// LCS-aligned diff.
///
/// Removed lines are numbered by their original position, added and
/// modified lines by their proposed position. Within a hunk of removals and
/// additions between two unchanged lines, the k-th removal pairs with the
/// k-th addition as one `Modified` entry; whatever is left over on the
/// longer side is reported as `Removed` or `Added`.
fn diff_aligned(original: &str, proposed: &str) -> Vec<ChangeEntry> {
    let old_lines: Vec<&str> = original.split('\n').collect();
    let new_lines: Vec<&str> = proposed.split('\n').collect();

    let prefix = old_lines
        .iter()
        .zip(&new_lines)
        .take_while(|(a, b)| a == b)
        .count();
    let suffix = old_lines[prefix..]
        .iter()
        .rev()
        .zip(new_lines[prefix..].iter().rev())
        .take_while(|(a, b)| a == b)
        .count();
    let old_mid = &old_lines[prefix..old_lines.len() - suffix];
    let new_mid = &new_lines[prefix..new_lines.len() - suffix];
    let (n, m) = (old_mid.len(), new_mid.len());

    let cells = (n + 1).saturating_mul(m + 1);
    if cells > MAX_ALIGNED_CELLS {
        warn!(
            "Aligned diff of {}x{} lines exceeds {} cells, comparing by position",
            n, m, MAX_ALIGNED_CELLS
        );
        return diff(original, proposed);
    }

    // lcs[i][j] = LCS length of old_mid[i..] and new_mid[j..]
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if old_mid[i] == new_mid[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut entries: Vec<ChangeEntry> = Vec::new();
    let mut removed: Vec<usize> = Vec::new();
    let mut added: Vec<usize> = Vec::new();
    let (mut i, mut j) = (0, 0);

    while i < n || j < m {
        if i < n && j < m && old_mid[i] == new_mid[j] {
            flush_hunk(&mut entries, &mut removed, &mut added, &old_lines, &new_lines);
            i += 1;
            j += 1;
        } else if j < m && (i == n || lcs[i][j + 1] > lcs[i + 1][j]) {
            added.push(prefix + j);
            j += 1;
        } else {
            removed.push(prefix + i);
            i += 1;
        }
    }
    flush_hunk(&mut entries, &mut removed, &mut added, &old_lines, &new_lines);

    entries
}

/// Emit one hunk: index-wise pairs first, then the unpaired remainder.
fn flush_hunk(
    entries: &mut Vec<ChangeEntry>,
    removed: &mut Vec<usize>,
    added: &mut Vec<usize>,
    old_lines: &[&str],
    new_lines: &[&str],
) {
    let paired = removed.len().min(added.len());

    for (&old, &new) in removed.iter().zip(added.iter()) {
        entries.push(ChangeEntry {
            line_number: new + 1,
            old_line: old_lines[old].to_string(),
            new_line: new_lines[new].to_string(),
            kind: ChangeKind::Modified,
        });
    }
    for &old in &removed[paired..] {
        entries.push(ChangeEntry {
            line_number: old + 1,
            old_line: old_lines[old].to_string(),
            new_line: String::new(),
            kind: ChangeKind::Removed,
        });
    }
    for &new in &added[paired..] {
        entries.push(ChangeEntry {
            line_number: new + 1,
            old_line: String::new(),
            new_line: new_lines[new].to_string(),
            kind: ChangeKind::Added,
        });
    }

    removed.clear();
    added.clear();
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(line_number: usize, old_line: &str, new_line: &str, kind: ChangeKind) -> ChangeEntry {
        ChangeEntry {
            line_number,
            old_line: old_line.to_string(),
            new_line: new_line.to_string(),
            kind,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Positional
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_identical_text_has_no_changes() {
        for text in ["", "a", "a\nb\nc", "# Title\n\nbody\n"] {
            assert!(diff(text, text).is_empty());
        }
    }

    #[test]
    fn test_single_modification() {
        assert_eq!(
            diff("a\nb", "a\nc"),
            vec![entry(2, "b", "c", ChangeKind::Modified)]
        );
    }

    #[test]
    fn test_appended_line_is_added() {
        assert_eq!(diff("a", "a\nb"), vec![entry(2, "", "b", ChangeKind::Added)]);
    }

    #[test]
    fn test_truncated_line_is_removed() {
        assert_eq!(diff("a\nb", "a"), vec![entry(2, "b", "", ChangeKind::Removed)]);
    }

    #[test]
    fn test_insertion_cascades_as_modified() {
        let changes = diff("a\nb\nc", "a\nnew\nb\nc");
        assert_eq!(
            changes,
            vec![
                entry(2, "b", "new", ChangeKind::Modified),
                entry(3, "c", "b", ChangeKind::Modified),
                entry(4, "", "c", ChangeKind::Added),
            ]
        );
    }

    #[test]
    fn test_blank_original_line_counts_as_added() {
        assert_eq!(
            diff("a\n\nc", "a\nb\nc"),
            vec![entry(2, "", "b", ChangeKind::Added)]
        );
    }

    #[test]
    fn test_change_entry_display() {
        assert_eq!(
            entry(7, "old", "new", ChangeKind::Modified).to_string(),
            "~    7 old => new"
        );
        assert_eq!(ChangeKind::Added.marker(), '+');
    }

    #[test]
    fn test_change_entry_serializes_camel_case() {
        let json = serde_json::to_string(&entry(1, "", "x", ChangeKind::Added)).unwrap();
        assert!(json.contains("\"lineNumber\":1"));
        assert!(json.contains("\"kind\":\"added\""));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Aligned
    // ─────────────────────────────────────────────────────────────────────────

    #[test]
    fn test_aligned_insertion_reported_once() {
        let changes = diff_with("a\nb\nc", "a\nnew\nb\nc", DiffMode::Aligned);
        assert_eq!(changes, vec![entry(2, "", "new", ChangeKind::Added)]);
    }

    #[test]
    fn test_aligned_deletion_reported_once() {
        let changes = diff_with("a\nb\nc", "a\nc", DiffMode::Aligned);
        assert_eq!(changes, vec![entry(2, "b", "", ChangeKind::Removed)]);
    }

    #[test]
    fn test_aligned_replacement_is_modified() {
        let changes = diff_with("a\nb\nc", "a\nx\nc", DiffMode::Aligned);
        assert_eq!(changes, vec![entry(2, "b", "x", ChangeKind::Modified)]);
    }

    #[test]
    fn test_aligned_two_line_replacement_pairs_by_index() {
        let changes = diff_with("a\nb\nc", "a\nx\ny", DiffMode::Aligned);
        assert_eq!(
            changes,
            vec![
                entry(2, "b", "x", ChangeKind::Modified),
                entry(3, "c", "y", ChangeKind::Modified),
            ]
        );
    }

    #[test]
    fn test_aligned_uneven_hunk_keeps_remainder() {
        let changes = diff_with("a\nb\nc\nd\nz", "a\nx\nz", DiffMode::Aligned);
        assert_eq!(
            changes,
            vec![
                entry(2, "b", "x", ChangeKind::Modified),
                entry(3, "c", "", ChangeKind::Removed),
                entry(4, "d", "", ChangeKind::Removed),
            ]
        );

        let changes = diff_with("a\nb\nz", "a\nx\ny\nz", DiffMode::Aligned);
        assert_eq!(
            changes,
            vec![
                entry(2, "b", "x", ChangeKind::Modified),
                entry(3, "", "y", ChangeKind::Added),
            ]
        );
    }

    #[test]
    fn test_aligned_separate_hunks_stay_separate() {
        let changes = diff_with("a\nb\nc\nd\ne", "x\nb\nc\nd\ny", DiffMode::Aligned);
        assert_eq!(
            changes,
            vec![
                entry(1, "a", "x", ChangeKind::Modified),
                entry(5, "e", "y", ChangeKind::Modified),
            ]
        );
    }

    #[test]
    fn test_aligned_common_ends_do_not_count_toward_limit() {
        // 3000 shared lines on each side would overflow the table untrimmed
        let body: Vec<String> = (0..3000).map(|i| format!("line {}", i)).collect();
        let original = format!("{}\nold\n{}", body.join("\n"), body.join("\n"));
        let proposed = format!("{}\nnew\nextra\n{}", body.join("\n"), body.join("\n"));

        let changes = diff_with(&original, &proposed, DiffMode::Aligned);
        assert_eq!(
            changes,
            vec![
                entry(3001, "old", "new", ChangeKind::Modified),
                entry(3002, "", "extra", ChangeKind::Added),
            ]
        );
    }

    #[test]
    fn test_oversized_aligned_diff_falls_back_to_positional() {
        let body: Vec<String> = (0..2100).map(|i| format!("line {}", i)).collect();
        let original = body.join("\n");
        // Nothing in common at either end, so the table is 2101 x 2103 cells
        let proposed = format!("first\n{}\nlast", body.join("\n"));

        let changes = diff_with(&original, &proposed, DiffMode::Aligned);
        assert_eq!(changes, diff(&original, &proposed));
        assert_eq!(changes.len(), 2102);
    }

    #[test]
    fn test_aligned_identical_is_empty() {
        assert!(diff_with("x\ny", "x\ny", DiffMode::Aligned).is_empty());
    }

    #[test]
    fn test_default_mode_is_positional() {
        assert_eq!(DiffMode::default(), DiffMode::Positional);
        assert_eq!(
            diff_with("a\nb", "a\nc", DiffMode::default()),
            diff("a\nb", "a\nc")
        );
    }
}

//! Persisted record types
//!
//! Field names serialize in camelCase so the stored arrays keep the same
//! shape as the browser build's storage (`lastModified`, `wordCount`, ...).

use crate::editor::TextStats;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Id of the folder every new document lands in.
pub const DEFAULT_FOLDER_ID: &str = "default";

/// Title given to documents created without one.
pub const UNTITLED: &str = "Untitled Document";

// ─────────────────────────────────────────────────────────────────────────────
// DocumentRecord
// ─────────────────────────────────────────────────────────────────────────────

/// One persisted user document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRecord {
    pub id: String,
    pub title: String,
    pub content: String,
    pub last_modified: DateTime<Utc>,
    pub word_count: usize,
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl DocumentRecord {
    /// New record in the default folder with a fresh id.
    pub fn new(title: &str, content: &str) -> Self {
        Self {
            id: new_document_id(),
            title: title.to_string(),
            content: content.to_string(),
            last_modified: Utc::now(),
            word_count: TextStats::from_text(content).words,
            folder: Some(DEFAULT_FOLDER_ID.to_string()),
            tags: Vec::new(),
        }
    }

    /// Replace the content, recomputing the word count and timestamp.
    pub fn set_content(&mut self, content: &str) {
        self.content = content.to_string();
        self.word_count = TextStats::from_text(content).words;
        self.touch();
    }

    pub fn touch(&mut self) {
        self.last_modified = Utc::now();
    }

    /// Case-insensitive match against title, content and tags.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.to_lowercase();
        self.title.to_lowercase().contains(&term)
            || self.content.to_lowercase().contains(&term)
            || self.tags.iter().any(|tag| tag.to_lowercase().contains(&term))
    }
}

pub fn new_document_id() -> String {
    format!("doc_{}", Uuid::new_v4().simple())
}

// ─────────────────────────────────────────────────────────────────────────────
// Folder
// ─────────────────────────────────────────────────────────────────────────────

/// Folder metadata stored alongside the documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: String,
    pub name: String,
    pub color: String,
    #[serde(default)]
    pub document_count: usize,
}

impl Folder {
    pub fn new(name: &str, color: &str) -> Self {
        Self {
            id: format!("folder_{}", Uuid::new_v4().simple()),
            name: name.to_string(),
            color: color.to_string(),
            document_count: 0,
        }
    }

    /// The folder that exists when nothing has been stored yet.
    pub fn default_folder() -> Self {
        Self {
            id: DEFAULT_FOLDER_ID.to_string(),
            name: "My Documents".to_string(),
            color: "#0066cc".to_string(),
            document_count: 0,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Listing
// ─────────────────────────────────────────────────────────────────────────────

/// Sort orders offered by the document list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum SortOrder {
    /// Most recently modified first
    #[default]
    Modified,
    /// Alphabetical by title
    Title,
    /// Longest first
    WordCount,
}

impl SortOrder {
    pub fn sort(&self, documents: &mut [&DocumentRecord]) {
        match self {
            SortOrder::Modified => documents.sort_by(|a, b| b.last_modified.cmp(&a.last_modified)),
            SortOrder::Title => documents.sort_by(|a, b| a.title.cmp(&b.title)),
            SortOrder::WordCount => documents.sort_by(|a, b| b.word_count.cmp(&a.word_count)),
        }
    }
}

/// Summary over the whole collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CollectionStats {
    pub total_documents: usize,
    pub total_words: usize,
    /// Documents modified within the last seven days
    pub recent_documents: usize,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_new_record_defaults() {
        let record = DocumentRecord::new("Draft", "one two three");
        assert!(record.id.starts_with("doc_"));
        assert_eq!(record.word_count, 3);
        assert_eq!(record.folder.as_deref(), Some(DEFAULT_FOLDER_ID));
        assert!(record.tags.is_empty());
    }

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(new_document_id(), new_document_id());
    }

    #[test]
    fn test_set_content_updates_counts_and_time() {
        let mut record = DocumentRecord::new("Draft", "");
        record.last_modified = Utc::now() - Duration::days(3);
        let before = record.last_modified;

        record.set_content("a b c d");
        assert_eq!(record.word_count, 4);
        assert!(record.last_modified > before);
    }

    #[test]
    fn test_matches_is_case_insensitive() {
        let mut record = DocumentRecord::new("Quarterly Report", "Revenue grew");
        record.tags.push("Finance".to_string());
        assert!(record.matches("quarterly"));
        assert!(record.matches("REVENUE"));
        assert!(record.matches("finance"));
        assert!(!record.matches("marketing"));
    }

    #[test]
    fn test_record_json_shape() {
        let record = DocumentRecord::new("T", "x");
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("lastModified").is_some());
        assert!(json.get("wordCount").is_some());
        assert!(json.get("last_modified").is_none());
    }

    #[test]
    fn test_record_without_optional_fields_deserializes() {
        let json = r#"{"id":"doc_1","title":"T","content":"","lastModified":"2024-05-01T10:00:00Z","wordCount":0}"#;
        let record: DocumentRecord = serde_json::from_str(json).unwrap();
        assert!(record.folder.is_none());
        assert!(record.tags.is_empty());
    }

    #[test]
    fn test_sort_orders() {
        let mut a = DocumentRecord::new("beta", "one");
        let mut b = DocumentRecord::new("alpha", "one two three");
        a.last_modified = Utc::now();
        b.last_modified = a.last_modified - Duration::hours(1);

        let mut docs = vec![&b, &a];
        SortOrder::Modified.sort(&mut docs);
        assert_eq!(docs[0].title, "beta");

        SortOrder::Title.sort(&mut docs);
        assert_eq!(docs[0].title, "alpha");

        let mut docs = vec![&a, &b];
        SortOrder::WordCount.sort(&mut docs);
        assert_eq!(docs[0].title, "alpha");
    }

    #[test]
    fn test_default_folder() {
        let folder = Folder::default_folder();
        assert_eq!(folder.id, DEFAULT_FOLDER_ID);
        assert_eq!(folder.name, "My Documents");
        assert!(Folder::new("Work", "#ff0000").id.starts_with("folder_"));
    }
}

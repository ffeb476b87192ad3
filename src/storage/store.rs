//! Reactive document store
//!
//! Documents live as one JSON array under [`DOCUMENTS_KEY`] and folders as
//! one JSON array under [`FOLDERS_KEY`]. Every mutation re-reads the whole
//! array, changes it and writes it back. Subscribers receive a
//! [`StoreEvent`] for each successful mutation; [`DocumentStore::refresh`]
//! picks up writes made by another process (last write wins).

use super::backend::StorageBackend;
use super::records::{CollectionStats, DocumentRecord, Folder, SortOrder, UNTITLED};
use crate::error::{Error, Result, ResultExt};
use crate::events::EventBus;
use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;
use std::sync::mpsc::Receiver;

/// Storage key of the document array.
pub const DOCUMENTS_KEY: &str = "scribe_documents";

/// Storage key of the folder array.
pub const FOLDERS_KEY: &str = "scribe_folders";

/// Window used by [`CollectionStats::recent_documents`].
pub const RECENT_DAYS: i64 = 7;

const COPY_SUFFIX: &str = " - Copy";

/// Change notifications published by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    Created(String),
    Updated(String),
    Deleted(String),
    /// Folder list was rewritten
    FoldersChanged,
    /// The backend changed underneath the store
    Reloaded,
}

/// Persistent collection of [`DocumentRecord`]s.
pub struct DocumentStore {
    backend: Box<dyn StorageBackend>,
    documents: Vec<DocumentRecord>,
    folders: Vec<Folder>,
    events: EventBus<StoreEvent>,
}

impl DocumentStore {
    /// Open a store over `backend`.
    ///
    /// Unreadable or corrupt arrays are logged and treated as empty.
    pub fn open(backend: impl StorageBackend + 'static) -> Self {
        let backend: Box<dyn StorageBackend> = Box::new(backend);
        let documents = read_array::<DocumentRecord>(backend.as_ref(), DOCUMENTS_KEY)
            .unwrap_or_warn_default(Vec::new(), "Failed to load documents");
        let folders = read_array::<Folder>(backend.as_ref(), FOLDERS_KEY)
            .unwrap_or_warn_default(Vec::new(), "Failed to load folders");

        info!(
            "Document store opened: {} documents, {} folders",
            documents.len(),
            folders.len()
        );

        Self {
            backend,
            documents,
            folders,
            events: EventBus::new(),
        }
    }

    /// Receive every future [`StoreEvent`].
    pub fn subscribe(&mut self) -> Receiver<StoreEvent> {
        self.events.subscribe()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    /// All documents in stored order (newest insertions first).
    pub fn documents(&self) -> &[DocumentRecord] {
        &self.documents
    }

    pub fn get(&self, id: &str) -> Option<&DocumentRecord> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    /// Case-insensitive search over title, content and tags.
    pub fn search(&self, term: &str) -> Vec<&DocumentRecord> {
        self.documents.iter().filter(|doc| doc.matches(term)).collect()
    }

    /// Filter by an optional search term, then sort.
    pub fn query(&self, term: Option<&str>, order: SortOrder) -> Vec<&DocumentRecord> {
        let mut docs = match term.map(str::trim).filter(|t| !t.is_empty()) {
            Some(term) => self.search(term),
            None => self.documents.iter().collect(),
        };
        order.sort(&mut docs);
        docs
    }

    /// Totals over the collection, counting documents modified after
    /// `now - RECENT_DAYS` as recent.
    pub fn stats(&self, now: DateTime<Utc>) -> CollectionStats {
        let cutoff = now - Duration::days(RECENT_DAYS);
        CollectionStats {
            total_documents: self.documents.len(),
            total_words: self.documents.iter().map(|doc| doc.word_count).sum(),
            recent_documents: self
                .documents
                .iter()
                .filter(|doc| doc.last_modified > cutoff)
                .count(),
        }
    }

    /// Stored folders, or the default folder when none were saved.
    pub fn folders(&self) -> Vec<Folder> {
        if self.folders.is_empty() {
            vec![Folder::default_folder()]
        } else {
            self.folders.clone()
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Mutations
    // ─────────────────────────────────────────────────────────────────────────

    /// Create an untitled, empty document and put it first.
    pub fn create(&mut self) -> Result<DocumentRecord> {
        self.create_with(UNTITLED, "")
    }

    /// Create a document with the given title and content.
    pub fn create_with(&mut self, title: &str, content: &str) -> Result<DocumentRecord> {
        let record = DocumentRecord::new(title, content);
        let inserted = record.clone();
        self.mutate(|docs| {
            docs.insert(0, inserted);
            Ok(())
        })?;

        debug!("Created document {}", record.id);
        self.events.publish(StoreEvent::Created(record.id.clone()));
        Ok(record)
    }

    /// Replace a document's content.
    pub fn update_content(&mut self, id: &str, content: &str) -> Result<DocumentRecord> {
        let updated = self.mutate(|docs| {
            let doc = find_mut(docs, id)?;
            doc.set_content(content);
            Ok(doc.clone())
        })?;
        self.events.publish(StoreEvent::Updated(id.to_string()));
        Ok(updated)
    }

    /// Rename a document. Returns `Ok(None)` when the trimmed title is empty,
    /// in which case nothing changes.
    pub fn rename(&mut self, id: &str, title: &str) -> Result<Option<DocumentRecord>> {
        let title = title.trim();
        if title.is_empty() {
            debug!("Ignoring empty title for {}", id);
            return Ok(None);
        }

        let renamed = self.mutate(|docs| {
            let doc = find_mut(docs, id)?;
            doc.title = title.to_string();
            doc.touch();
            Ok(doc.clone())
        })?;
        self.events.publish(StoreEvent::Updated(id.to_string()));
        Ok(Some(renamed))
    }

    /// Copy a document under a new id, placed first.
    pub fn duplicate(&mut self, id: &str) -> Result<DocumentRecord> {
        let copy = self.mutate(|docs| {
            let source = docs
                .iter()
                .find(|doc| doc.id == id)
                .ok_or_else(|| Error::DocumentNotFound(id.to_string()))?;

            let title = format!("{}{}", source.title, COPY_SUFFIX);
            let mut copy = DocumentRecord::new(&title, &source.content);
            copy.folder = source.folder.clone();
            copy.tags = source.tags.clone();
            docs.insert(0, copy.clone());
            Ok(copy)
        })?;

        self.events.publish(StoreEvent::Created(copy.id.clone()));
        Ok(copy)
    }

    /// Remove a document.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        self.mutate(|docs| {
            let before = docs.len();
            docs.retain(|doc| doc.id != id);
            if docs.len() == before {
                return Err(Error::DocumentNotFound(id.to_string()));
            }
            Ok(())
        })?;
        self.events.publish(StoreEvent::Deleted(id.to_string()));
        Ok(())
    }

    /// Add tags to a document, skipping blanks and ones already present.
    pub fn add_tags(&mut self, id: &str, tags: &[String]) -> Result<DocumentRecord> {
        let updated = self.mutate(|docs| {
            let doc = find_mut(docs, id)?;
            for tag in tags.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
                if !doc.tags.iter().any(|existing| existing == tag) {
                    doc.tags.push(tag.to_string());
                }
            }
            doc.touch();
            Ok(doc.clone())
        })?;
        self.events.publish(StoreEvent::Updated(id.to_string()));
        Ok(updated)
    }

    /// Overwrite the folder list.
    pub fn save_folders(&mut self, folders: Vec<Folder>) -> Result<()> {
        let json = serde_json::to_string(&folders)?;
        self.backend.write(FOLDERS_KEY, &json)?;
        self.folders = folders;
        self.events.publish(StoreEvent::FoldersChanged);
        Ok(())
    }

    /// Re-read the backend. Returns `true` and publishes
    /// [`StoreEvent::Reloaded`] when the stored documents differ from the
    /// in-memory copy.
    pub fn refresh(&mut self) -> bool {
        let stored = match read_array::<DocumentRecord>(self.backend.as_ref(), DOCUMENTS_KEY) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Refresh skipped: {}", e);
                return false;
            }
        };

        if stored == self.documents {
            return false;
        }

        debug!(
            "Store changed externally ({} -> {} documents)",
            self.documents.len(),
            stored.len()
        );
        self.documents = stored;
        self.events.publish(StoreEvent::Reloaded);
        true
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Read-modify-write
    // ─────────────────────────────────────────────────────────────────────────

    /// Read the stored array, apply `change`, write the array back.
    ///
    /// If the read fails the in-memory copy is used. Nothing is committed
    /// when `change` or the write fails.
    fn mutate<R>(
        &mut self,
        change: impl FnOnce(&mut Vec<DocumentRecord>) -> Result<R>,
    ) -> Result<R> {
        let mut docs = match read_array::<DocumentRecord>(self.backend.as_ref(), DOCUMENTS_KEY) {
            Ok(docs) => docs,
            Err(e) => {
                warn!("Using in-memory documents: {}", e);
                self.documents.clone()
            }
        };

        let result = change(&mut docs)?;

        let json = serde_json::to_string(&docs)?;
        self.backend.write(DOCUMENTS_KEY, &json)?;
        self.documents = docs;
        Ok(result)
    }
}

fn find_mut<'a>(docs: &'a mut [DocumentRecord], id: &str) -> Result<&'a mut DocumentRecord> {
    docs.iter_mut()
        .find(|doc| doc.id == id)
        .ok_or_else(|| Error::DocumentNotFound(id.to_string()))
}

/// Read a JSON array stored under `key`. A missing key is an empty array.
fn read_array<T: DeserializeOwned>(backend: &dyn StorageBackend, key: &str) -> Result<Vec<T>> {
    match backend.read(key)? {
        Some(json) => serde_json::from_str(&json).map_err(|e| Error::StorageRead {
            key: key.to_string(),
            source: Box::new(e),
        }),
        None => Ok(Vec::new()),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::drain;
    use crate::storage::{FileBackend, MemoryBackend};
    use tempfile::TempDir;

    fn empty_store() -> DocumentStore {
        DocumentStore::open(MemoryBackend::new())
    }

    #[test]
    fn test_open_empty_backend() {
        let store = empty_store();
        assert!(store.documents().is_empty());
        assert_eq!(store.folders(), vec![Folder::default_folder()]);
    }

    #[test]
    fn test_corrupt_json_falls_back_to_empty() {
        let backend = MemoryBackend::new().with_entry(DOCUMENTS_KEY, "{not json");
        let store = DocumentStore::open(backend);
        assert!(store.documents().is_empty());
    }

    #[test]
    fn test_create_puts_new_document_first() {
        let mut store = empty_store();
        let first = store.create().unwrap();
        let second = store.create_with("Notes", "hello world").unwrap();

        assert_eq!(first.title, UNTITLED);
        assert_eq!(store.documents()[0].id, second.id);
        assert_eq!(store.documents()[1].id, first.id);
        assert_eq!(second.word_count, 2);
    }

    #[test]
    fn test_update_content_recomputes_word_count() {
        let mut store = empty_store();
        let doc = store.create().unwrap();
        let updated = store.update_content(&doc.id, "one two three").unwrap();
        assert_eq!(updated.word_count, 3);
        assert_eq!(store.get(&doc.id).unwrap().content, "one two three");
    }

    #[test]
    fn test_update_missing_document() {
        let mut store = empty_store();
        let err = store.update_content("doc_missing", "x").unwrap_err();
        assert!(matches!(err, Error::DocumentNotFound(_)));
    }

    #[test]
    fn test_rename_trims_and_ignores_empty() {
        let mut store = empty_store();
        let doc = store.create().unwrap();

        let renamed = store.rename(&doc.id, "  Plan  ").unwrap().unwrap();
        assert_eq!(renamed.title, "Plan");

        assert!(store.rename(&doc.id, "   ").unwrap().is_none());
        assert_eq!(store.get(&doc.id).unwrap().title, "Plan");
    }

    #[test]
    fn test_duplicate() {
        let mut store = empty_store();
        let doc = store.create_with("Report", "body text").unwrap();
        store.add_tags(&doc.id, &["work".to_string()]).unwrap();

        let copy = store.duplicate(&doc.id).unwrap();
        assert_ne!(copy.id, doc.id);
        assert_eq!(copy.title, "Report - Copy");
        assert_eq!(copy.content, "body text");
        assert_eq!(copy.tags, vec!["work".to_string()]);
        assert_eq!(store.documents()[0].id, copy.id);
        assert_eq!(store.documents().len(), 2);
    }

    #[test]
    fn test_delete() {
        let mut store = empty_store();
        let doc = store.create().unwrap();
        store.delete(&doc.id).unwrap();
        assert!(store.get(&doc.id).is_none());
        assert!(matches!(store.delete(&doc.id), Err(Error::DocumentNotFound(_))));
    }

    #[test]
    fn test_add_tags_dedupes() {
        let mut store = empty_store();
        let doc = store.create().unwrap();
        let tags = vec!["a".to_string(), " a ".to_string(), "".to_string(), "b".to_string()];
        let updated = store.add_tags(&doc.id, &tags).unwrap();
        assert_eq!(updated.tags, vec!["a".to_string(), "b".to_string()]);
    }

    #[test]
    fn test_search_and_query() {
        let mut store = empty_store();
        store.create_with("Shopping", "milk eggs").unwrap();
        let plan = store.create_with("Plan", "Quarterly MILESTONES").unwrap();

        assert_eq!(store.search("mil").len(), 2);
        let found = store.search("milestones");
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, plan.id);

        let by_title = store.query(Some("  "), SortOrder::Title);
        assert_eq!(by_title[0].title, "Plan");
        assert_eq!(by_title.len(), 2);
    }

    #[test]
    fn test_stats_counts_recent_documents() {
        let mut store = empty_store();
        store.create_with("A", "one two").unwrap();
        store.create_with("B", "three").unwrap();

        let now = Utc::now();
        let stats = store.stats(now);
        assert_eq!(stats.total_documents, 2);
        assert_eq!(stats.total_words, 3);
        assert_eq!(stats.recent_documents, 2);

        let later = store.stats(now + Duration::days(RECENT_DAYS + 1));
        assert_eq!(later.recent_documents, 0);
    }

    #[test]
    fn test_events_are_published() {
        let mut store = empty_store();
        let rx = store.subscribe();

        let doc = store.create().unwrap();
        store.update_content(&doc.id, "x").unwrap();
        store.delete(&doc.id).unwrap();

        assert_eq!(
            drain(&rx),
            vec![
                StoreEvent::Created(doc.id.clone()),
                StoreEvent::Updated(doc.id.clone()),
                StoreEvent::Deleted(doc.id.clone()),
            ]
        );
    }

    #[test]
    fn test_failed_mutation_publishes_nothing() {
        let mut store = empty_store();
        let rx = store.subscribe();
        assert!(store.update_content("nope", "x").is_err());
        assert!(drain(&rx).is_empty());
    }

    #[test]
    fn test_folders_roundtrip() {
        let mut store = empty_store();
        let rx = store.subscribe();
        let folders = vec![Folder::default_folder(), Folder::new("Work", "#aa0000")];
        store.save_folders(folders.clone()).unwrap();
        assert_eq!(store.folders(), folders);
        assert_eq!(drain(&rx), vec![StoreEvent::FoldersChanged]);
    }

    #[test]
    fn test_persists_through_file_backend() {
        let temp = TempDir::new().unwrap();
        let id = {
            let mut store = DocumentStore::open(FileBackend::new(temp.path()));
            store.create_with("Saved", "persisted words").unwrap().id
        };

        let store = DocumentStore::open(FileBackend::new(temp.path()));
        let doc = store.get(&id).unwrap();
        assert_eq!(doc.title, "Saved");
        assert_eq!(doc.word_count, 2);

        let raw = std::fs::read_to_string(temp.path().join("scribe_documents.json")).unwrap();
        assert!(raw.contains("\"wordCount\":2"));
    }

    #[test]
    fn test_refresh_sees_other_writer() {
        let temp = TempDir::new().unwrap();
        let mut ours = DocumentStore::open(FileBackend::new(temp.path()));
        let rx = ours.subscribe();
        assert!(!ours.refresh());

        let mut theirs = DocumentStore::open(FileBackend::new(temp.path()));
        theirs.create_with("From elsewhere", "").unwrap();

        assert!(ours.refresh());
        assert_eq!(ours.documents().len(), 1);
        assert_eq!(drain(&rx), vec![StoreEvent::Reloaded]);
        assert!(!ours.refresh());
    }

    #[test]
    fn test_mutation_merges_with_external_writes() {
        let temp = TempDir::new().unwrap();
        let mut ours = DocumentStore::open(FileBackend::new(temp.path()));
        let mut theirs = DocumentStore::open(FileBackend::new(temp.path()));

        theirs.create_with("Theirs", "").unwrap();
        ours.create_with("Ours", "").unwrap();

        assert_eq!(ours.documents().len(), 2);
        assert_eq!(ours.documents()[0].title, "Ours");
    }
}

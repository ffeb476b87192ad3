//! The open document
//!
//! `DocumentSession` tracks the document currently being edited and keeps
//! it in sync with the [`DocumentStore`]. Content updates are saved as soon
//! as they happen. Other components learn about changes through
//! [`SessionEvent`]s instead of reaching into the session.

use super::diff::{diff_with, ChangeEntry, DiffMode};
use super::stats::TextStats;
use crate::error::Result;
use crate::events::EventBus;
use crate::storage::{DocumentRecord, DocumentStore, UNTITLED};
use log::{debug, info};
use std::sync::mpsc::Receiver;

/// Notifications published by a [`DocumentSession`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A different document was opened
    Opened(String),
    ContentChanged,
    Renamed(String),
    /// The assistant's proposal replaced the content
    UpdatedByAssistant,
}

/// The document currently open in the editor.
#[derive(Debug)]
pub struct DocumentSession {
    /// Id of the backing record, `None` for a scratch buffer
    document_id: Option<String>,
    title: String,
    content: String,
    events: EventBus<SessionEvent>,
}

impl Default for DocumentSession {
    fn default() -> Self {
        Self::scratch()
    }
}

impl DocumentSession {
    /// An unsaved buffer not tied to any record.
    pub fn scratch() -> Self {
        Self {
            document_id: None,
            title: UNTITLED.to_string(),
            content: String::new(),
            events: EventBus::new(),
        }
    }

    /// An unsaved buffer with initial text, e.g. a file opened from disk.
    pub fn unsaved(title: &str, content: &str) -> Self {
        Self {
            title: title.to_string(),
            content: content.to_string(),
            ..Self::scratch()
        }
    }

    /// A session over an existing record.
    pub fn from_record(record: &DocumentRecord) -> Self {
        let mut session = Self::scratch();
        session.load(record);
        session
    }

    pub fn subscribe(&mut self) -> Receiver<SessionEvent> {
        self.events.subscribe()
    }

    pub fn document_id(&self) -> Option<&str> {
        self.document_id.as_deref()
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn stats(&self) -> TextStats {
        TextStats::from_text(&self.content)
    }

    /// Switch to `record`.
    pub fn load(&mut self, record: &DocumentRecord) {
        self.document_id = Some(record.id.clone());
        self.title = record.title.clone();
        self.content = record.content.clone();
        info!("Opened document {} ({})", record.id, record.title);
        self.events.publish(SessionEvent::Opened(record.id.clone()));
    }

    /// Replace the content and save it to `store` when a record is open.
    pub fn update_content(&mut self, store: &mut DocumentStore, content: &str) -> Result<()> {
        if content == self.content {
            return Ok(());
        }

        if let Some(id) = &self.document_id {
            store.update_content(id, content)?;
        }
        self.content = content.to_string();
        self.events.publish(SessionEvent::ContentChanged);
        Ok(())
    }

    /// Rename the open document. Blank titles are ignored.
    pub fn rename(&mut self, store: &mut DocumentStore, title: &str) -> Result<()> {
        let title = title.trim();
        if title.is_empty() {
            return Ok(());
        }

        if let Some(id) = &self.document_id {
            store.rename(id, title)?;
        }
        self.title = title.to_string();
        self.events.publish(SessionEvent::Renamed(self.title.clone()));
        Ok(())
    }

    /// Compare the current content with a proposed replacement.
    pub fn preview(&self, proposed: &str, mode: DiffMode) -> Vec<ChangeEntry> {
        diff_with(&self.content, proposed, mode)
    }

    /// Commit an assistant proposal.
    pub fn apply_assistant_edit(&mut self, store: &mut DocumentStore, proposed: &str) -> Result<()> {
        if let Some(id) = &self.document_id {
            store.update_content(id, proposed)?;
        }
        self.content = proposed.to_string();
        debug!("Applied assistant edit ({} bytes)", proposed.len());
        self.events.publish(SessionEvent::UpdatedByAssistant);
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

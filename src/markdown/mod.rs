//! Markdown to document-model conversion
//!
//! A small line-oriented pipeline used by the exporters:
//!
//! - `inline.rs` - splits a line into bold/italic/code/plain runs
//! - `blocks.rs` - classifies lines and fenced code regions into blocks
//! - `builder.rs` - turns blocks into an [`ExportDocument`]
//!
//! # Example
//! ```ignore
//! use crate::markdown::ExportDocument;
//!
//! let doc = ExportDocument::from_markdown("# Title\n\nSome **bold** text", "Notes");
//! assert_eq!(doc.nodes.len(), 2);
//! ```

mod blocks;
mod builder;
mod inline;

pub use builder::{DocumentNode, ExportDocument, NodeContent};
pub use inline::InlineRun;

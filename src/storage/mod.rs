//! Document persistence
//!
//! A small key/value backend abstraction plus the document store built on
//! top of it.

mod backend;
mod records;
mod store;

pub use backend::FileBackend;
pub use records::{DocumentRecord, Folder, SortOrder, UNTITLED};
pub use store::{DocumentStore, StoreEvent};

#[cfg(test)]
pub use backend::MemoryBackend;

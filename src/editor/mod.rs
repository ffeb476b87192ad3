//! Editing support for Scribe
//!
//! This module contains the open-document session, text statistics and the
//! change preview used before applying assistant edits.

mod diff;
mod session;
mod stats;

pub use diff::{diff_with, ChangeEntry, DiffMode};
pub use session::{DocumentSession, SessionEvent};
pub use stats::TextStats;

#[cfg(test)]
pub use diff::ChangeKind;

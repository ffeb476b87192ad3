//! Error type shared across Scribe
//!
//! Subsystems with their own failure vocabulary (export, assistant) keep a
//! dedicated enum and convert into [`Error`] at the boundary. Everything
//! else reports through the variants here.

use crate::assistant::AssistantError;
use crate::export::ExportError;
use log::warn;
use std::fmt;
use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// Boxed cause for variants that wrap heterogeneous errors.
type Cause = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Files
    // ─────────────────────────────────────────────────────────────────────────
    Io(io::Error),

    /// A document given on the command line could not be read
    FileRead { path: PathBuf, source: io::Error },

    /// An edited document could not be written back
    FileWrite { path: PathBuf, source: io::Error },

    // ─────────────────────────────────────────────────────────────────────────
    // Settings
    // ─────────────────────────────────────────────────────────────────────────
    ConfigLoad { path: PathBuf, source: Cause },

    ConfigSave { path: PathBuf, source: Cause },

    /// The config file is not valid settings JSON
    ConfigParse {
        message: String,
        source: Option<Cause>,
    },

    /// The platform has no config or data directory (no HOME)
    ConfigDirNotFound,

    // ─────────────────────────────────────────────────────────────────────────
    // Document store
    // ─────────────────────────────────────────────────────────────────────────
    StorageRead { key: String, source: Cause },

    StorageWrite { key: String, source: Cause },

    DocumentNotFound(String),

    /// A value could not be turned into JSON
    Serialization(serde_json::Error),

    // ─────────────────────────────────────────────────────────────────────────
    // Subsystems
    // ─────────────────────────────────────────────────────────────────────────
    Export(ExportError),

    Assistant(AssistantError),

    /// The HTTP listener could not start
    Server(String),

    /// The command was given input it cannot act on
    Usage(String),
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err)
    }
}

impl From<ExportError> for Error {
    fn from(err: ExportError) -> Self {
        Error::Export(err)
    }
}

impl From<AssistantError> for Error {
    fn from(err: AssistantError) -> Self {
        Error::Assistant(err)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "I/O error: {}", err),
            Error::FileRead { path, source } => {
                write!(f, "Cannot read '{}': {}", path.display(), source)
            }
            Error::FileWrite { path, source } => {
                write!(f, "Cannot write '{}': {}", path.display(), source)
            }

            Error::ConfigLoad { path, source } => {
                write!(f, "Cannot load settings from '{}': {}", path.display(), source)
            }
            Error::ConfigSave { path, source } => {
                write!(f, "Cannot save settings to '{}': {}", path.display(), source)
            }
            Error::ConfigParse { message, .. } => write!(f, "Invalid settings file: {}", message),
            Error::ConfigDirNotFound => f.write_str("No config or data directory on this platform"),

            Error::StorageRead { key, source } => {
                write!(f, "Cannot read stored '{}': {}", key, source)
            }
            Error::StorageWrite { key, source } => {
                write!(f, "Cannot store '{}': {}", key, source)
            }
            Error::DocumentNotFound(id) => write!(f, "Document '{}' not found", id),
            Error::Serialization(err) => write!(f, "JSON encoding failed: {}", err),

            Error::Export(err) => write!(f, "Export failed: {}", err),
            Error::Assistant(err) => write!(f, "Assistant error: {}", err),
            Error::Server(msg) => write!(f, "Server error: {}", msg),
            Error::Usage(msg) => f.write_str(msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            Error::FileRead { source, .. } | Error::FileWrite { source, .. } => Some(source),
            Error::ConfigLoad { source, .. }
            | Error::ConfigSave { source, .. }
            | Error::StorageRead { source, .. }
            | Error::StorageWrite { source, .. } => Some(source.as_ref()),
            Error::ConfigParse { source, .. } => source
                .as_deref()
                .map(|s| s as &(dyn std::error::Error + 'static)),
            Error::Serialization(err) => Some(err),
            Error::Export(err) => Some(err),
            Error::Assistant(err) => Some(err),
            Error::ConfigDirNotFound
            | Error::DocumentNotFound(_)
            | Error::Server(_)
            | Error::Usage(_) => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Fallbacks
// ─────────────────────────────────────────────────────────────────────────────

/// Keep going with a default when a non-essential load fails.
pub trait ResultExt<T> {
    /// The value, or `default` after logging `context` and the error.
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T;
}

impl<T> ResultExt<T> for Result<T> {
    fn unwrap_or_warn_default(self, default: T, context: &str) -> T {
        self.unwrap_or_else(|err| {
            warn!("{}: {}. Falling back to defaults.", context, err);
            default
        })
    }
}

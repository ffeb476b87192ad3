//! Configuration module for Scribe
//!
//! Settings are plain serde structs; `persistence` maps them onto a JSON
//! file in the platform config directory and resolves the data directory.

mod persistence;
mod settings;

pub use persistence::*;
pub use settings::*;

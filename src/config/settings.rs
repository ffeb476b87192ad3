//! Settings file schema
//!
//! Every section has serde defaults, so a partial or older file still loads.
//! Out-of-range values are clamped by [`Settings::sanitize`] after parsing.

use crate::export::ExportSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

// ─────────────────────────────────────────────────────────────────────────────
// Server Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Bind address for the chat/health HTTP server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Interface to bind to
    pub host: String,
    /// TCP port to listen on
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl ServerSettings {
    /// The `host:port` string passed to the listener.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Base URL clients use to reach this server.
    pub fn base_url(&self) -> String {
        format!("http://{}", self.address())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Assistant Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Settings for the hosted language model behind the chat endpoint.
///
/// The API key is never stored here; only the name of the environment
/// variable that holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssistantSettings {
    /// Model identifier passed to the provider
    pub model: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Provider base URL
    pub api_base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for AssistantSettings {
    fn default() -> Self {
        Self {
            model: "gemini-2.0-flash-001".to_string(),
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            timeout_secs: 60,
        }
    }
}

impl AssistantSettings {
    /// Read the API key from the configured environment variable.
    ///
    /// Empty values count as missing.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Storage Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Where the document store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageSettings {
    /// Override for the data directory (defaults to the platform data dir)
    pub data_dir: Option<PathBuf>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Main Settings Struct
// ─────────────────────────────────────────────────────────────────────────────

/// Application settings persisted as JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub assistant: AssistantSettings,
    pub export: ExportSettings,
    pub storage: StorageSettings,
}

impl Settings {
    /// Minimum request timeout in seconds
    pub const MIN_TIMEOUT_SECS: u64 = 5;
    /// Maximum request timeout in seconds
    pub const MAX_TIMEOUT_SECS: u64 = 600;
    /// Minimum raster width for PDF export
    pub const MIN_RASTER_WIDTH: u32 = 200;
    /// Maximum raster width for PDF export
    pub const MAX_RASTER_WIDTH: u32 = 4000;

    /// Clamp out-of-range values loaded from disk.
    pub fn sanitize(&mut self) {
        // Port 0 would bind to a random port
        if self.server.port == 0 {
            self.server.port = ServerSettings::default().port;
        }

        if self.server.host.trim().is_empty() {
            self.server.host = ServerSettings::default().host;
        }

        self.assistant.timeout_secs = self
            .assistant
            .timeout_secs
            .clamp(Self::MIN_TIMEOUT_SECS, Self::MAX_TIMEOUT_SECS);

        if self.assistant.api_key_env.trim().is_empty() {
            self.assistant.api_key_env = AssistantSettings::default().api_key_env;
        }

        let options = &mut self.export.default_options;
        options.raster_width = options
            .raster_width
            .clamp(Self::MIN_RASTER_WIDTH, Self::MAX_RASTER_WIDTH);
        options.jpeg_quality = options.jpeg_quality.clamp(1, 100);
        if options.creator.trim().is_empty() {
            options.creator = crate::APP_NAME.to_string();
        }
    }

    /// Deserialize settings from JSON and sanitize them.
    pub fn from_json_sanitized(json: &str) -> Result<Self, serde_json::Error> {
        let mut settings: Self = serde_json::from_str(json)?;
        settings.sanitize();
        Ok(settings)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

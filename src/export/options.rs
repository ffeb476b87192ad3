//! Formats and knobs for export
//!
//! `ExportOptions` are fixed for one [`Exporter`](super::Exporter);
//! `ExportSettings` is the part of the user config that seeds them.

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Export Format
// ─────────────────────────────────────────────────────────────────────────────

/// Output file types.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    /// Word-processor package
    #[default]
    Docx,
    /// The Markdown source, unchanged
    Markdown,
    /// Paged raster images
    Pdf,
    /// Standalone HTML preview
    Html,
}

impl ExportFormat {
    /// Human-readable name used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            ExportFormat::Docx => "Word Document",
            ExportFormat::Markdown => "Markdown",
            ExportFormat::Pdf => "PDF",
            ExportFormat::Html => "HTML File",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Docx => "docx",
            ExportFormat::Markdown => "md",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Html => "html",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Docx => {
                "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            }
            ExportFormat::Markdown => "text/markdown",
            ExportFormat::Pdf => "application/pdf",
            ExportFormat::Html => "text/html",
        }
    }

    /// Every format, in menu order.
    #[cfg(test)]
    pub fn all() -> &'static [ExportFormat] {
        &[
            ExportFormat::Docx,
            ExportFormat::Markdown,
            ExportFormat::Pdf,
            ExportFormat::Html,
        ]
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Export Options
// ─────────────────────────────────────────────────────────────────────────────

/// Per-export settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    /// Title used when the document has none
    pub default_title: String,

    /// Author recorded in document properties
    pub creator: String,

    /// Paragraph written into documents with no content
    pub placeholder_text: String,

    /// Width in pixels of the page raster used for PDF export
    pub raster_width: u32,

    /// JPEG quality (1-100) of PDF page images
    pub jpeg_quality: u8,

    /// Launch the system viewer on the written file
    pub open_after_export: bool,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            default_title: "Untitled Document".to_string(),
            creator: crate::APP_NAME.to_string(),
            placeholder_text: format!("Empty document - created with {}", crate::APP_NAME),
            raster_width: 1240,
            jpeg_quality: 90,
            open_after_export: false,
        }
    }
}

impl ExportOptions {
    /// `title` if it has visible characters, otherwise the default title.
    pub fn resolve_title<'a>(&'a self, title: &'a str) -> &'a str {
        let trimmed = title.trim();
        if trimmed.is_empty() {
            &self.default_title
        } else {
            trimmed
        }
    }

    /// Set the open-after-export flag.
    pub fn with_open_after_export(mut self, open: bool) -> Self {
        self.open_after_export = open;
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Persisted Settings
// ─────────────────────────────────────────────────────────────────────────────

/// The `export` section of the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExportSettings {
    /// Options every export starts from
    pub default_options: ExportOptions,

    /// Format picked last time, used when none is given
    pub last_format: ExportFormat,
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docx_is_default_format() {
        assert_eq!(ExportFormat::default(), ExportFormat::Docx);
    }

    #[test]
    fn test_format_extensions() {
        assert_eq!(ExportFormat::Docx.extension(), "docx");
        assert_eq!(ExportFormat::Markdown.extension(), "md");
        assert_eq!(ExportFormat::Pdf.extension(), "pdf");
        assert_eq!(ExportFormat::Html.extension(), "html");
    }

    #[test]
    fn test_default_options_branding() {
        let options = ExportOptions::default();
        assert_eq!(options.creator, "Scribe");
        assert_eq!(options.placeholder_text, "Empty document - created with Scribe");
        assert!(!options.open_after_export);
    }

    #[test]
    fn test_resolve_title() {
        let options = ExportOptions::default();
        assert_eq!(options.resolve_title("  Plan "), "Plan");
        assert_eq!(options.resolve_title("   "), "Untitled Document");
    }

    #[test]
    fn test_export_format_serialization() {
        let json = serde_json::to_string(&ExportFormat::Markdown).unwrap();
        assert_eq!(json, "\"markdown\"");
    }

    #[test]
    fn test_export_settings_partial_json() {
        let settings: ExportSettings =
            serde_json::from_str(r#"{"default_options": {"jpeg_quality": 50}}"#).unwrap();
        assert_eq!(settings.default_options.jpeg_quality, 50);
        assert_eq!(settings.default_options.creator, "Scribe");
        assert_eq!(settings.last_format, ExportFormat::Docx);
    }
}

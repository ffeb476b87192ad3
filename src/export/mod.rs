//! Document Export Module for Scribe
//!
//! This module turns the current Markdown content into downloadable files.
//!
//! # Supported Export Formats
//!
//! - **DOCX**: WordprocessingML package built from the structured document
//! - **Markdown**: the source text, byte for byte
//! - **PDF**: the rendered layout rasterized and sliced into pages
//! - **HTML**: standalone preview with inlined CSS
//!
//! # Architecture
//!
//! - `options.rs` - Export formats, options and persisted settings
//! - `docx.rs` - WordprocessingML generation and zip packaging
//! - `markdown.rs` - Passthrough export
//! - `raster.rs` - The `Rasterizer` capability and the bundled layout renderer
//! - `pdf.rs` - Pagination and the PDF writer
//! - `html.rs` - HTML document generation

mod docx;
mod html;
mod markdown;
mod options;
mod pdf;
mod raster;

pub use docx::write_docx;
pub use html::generate_html_document;
pub use markdown::export_markdown;
pub use options::{ExportFormat, ExportOptions, ExportSettings};
pub use pdf::write_pdf;
pub use raster::{LayoutRasterizer, Rasterizer};

use crate::markdown::ExportDocument;
use chrono::{NaiveDate, Utc};
use log::{debug, info, warn};
use std::cell::OnceCell;
use std::fmt;
use std::path::{Path, PathBuf};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur during export.
#[derive(Debug)]
pub enum ExportError {
    /// The document package could not be assembled
    Package(String),
    /// The rasterizer could not render the document
    Rasterize(String),
    /// A page image could not be encoded
    Image(String),
    /// Writing the exported file failed
    Io(std::io::Error),
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Package(msg) => write!(f, "Packaging error: {}", msg),
            ExportError::Rasterize(msg) => write!(f, "Rasterization error: {}", msg),
            ExportError::Image(msg) => write!(f, "Image encoding error: {}", msg),
            ExportError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for ExportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ExportError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ExportError {
    fn from(err: std::io::Error) -> Self {
        ExportError::Io(err)
    }
}

impl From<zip::result::ZipError> for ExportError {
    fn from(err: zip::result::ZipError) -> Self {
        ExportError::Package(err.to_string())
    }
}

impl From<image::ImageError> for ExportError {
    fn from(err: image::ImageError) -> Self {
        ExportError::Image(err.to_string())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exported File
// ─────────────────────────────────────────────────────────────────────────────

/// The result of an export: a suggested file name and the file bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFile {
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
}

impl ExportedFile {
    /// Write into `dir` under the suggested file name.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        if !dir.exists() {
            std::fs::create_dir_all(dir)?;
        }
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        info!(
            "Exported {} ({}, {} bytes) to {}",
            self.format.label(),
            self.format.mime_type(),
            self.bytes.len(),
            path.display()
        );
        Ok(path)
    }
}

/// `<title>_<YYYY-MM-DD>.<ext>`, with every character of the title outside
/// `[A-Za-z0-9]` replaced by `_`.
pub fn export_file_name(title: &str, date: NaiveDate, format: ExportFormat) -> String {
    let stem: String = title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_{}.{}", stem, date.format("%Y-%m-%d"), format.extension())
}

// ─────────────────────────────────────────────────────────────────────────────
// Exporter
// ─────────────────────────────────────────────────────────────────────────────

/// Runs exports with a fixed set of options.
///
/// The rasterizer is only constructed the first time a PDF is requested.
pub struct Exporter {
    options: ExportOptions,
    rasterizer: OnceCell<Box<dyn Rasterizer>>,
}

impl Exporter {
    pub fn new(options: ExportOptions) -> Self {
        Self {
            options,
            rasterizer: OnceCell::new(),
        }
    }

    /// Use `rasterizer` for PDF export instead of the bundled one.
    #[cfg(test)]
    pub fn with_rasterizer(self, rasterizer: Box<dyn Rasterizer>) -> Self {
        let cell = OnceCell::new();
        let _ = cell.set(rasterizer);
        Self {
            options: self.options,
            rasterizer: cell,
        }
    }

    pub fn options(&self) -> &ExportOptions {
        &self.options
    }

    fn rasterizer(&self) -> &dyn Rasterizer {
        self.rasterizer
            .get_or_init(|| {
                debug!("Creating layout rasterizer");
                Box::new(LayoutRasterizer::default()) as Box<dyn Rasterizer>
            })
            .as_ref()
    }

    /// Export `content` in `format`, naming the file after `title` and the
    /// current UTC date.
    pub fn export(
        &self,
        content: &str,
        title: &str,
        format: ExportFormat,
    ) -> Result<ExportedFile, ExportError> {
        self.export_dated(content, title, format, Utc::now().date_naive())
    }

    /// Like [`Exporter::export`] with an explicit date for the file name.
    pub fn export_dated(
        &self,
        content: &str,
        title: &str,
        format: ExportFormat,
        date: NaiveDate,
    ) -> Result<ExportedFile, ExportError> {
        let title = self.options.resolve_title(title);

        let bytes = match format {
            ExportFormat::Markdown => export_markdown(content),
            ExportFormat::Html => {
                generate_html_document(content, Some(title), &self.options.creator).into_bytes()
            }
            ExportFormat::Docx => {
                let document = ExportDocument::from_markdown(content, title);
                write_docx(&document, &self.options)?
            }
            ExportFormat::Pdf => {
                let document = ExportDocument::from_markdown(content, title);
                let raster = self
                    .rasterizer()
                    .rasterize(&document, &self.options)
                    .map_err(|e| {
                        warn!("Rasterizing '{}' failed: {}", title, e);
                        e
                    })?;
                write_pdf(&raster, &document, &self.options)?
            }
        };

        Ok(ExportedFile {
            file_name: export_file_name(title, date, format),
            format,
            bytes,
        })
    }
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(ExportOptions::default())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use tempfile::TempDir;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()
    }

    #[test]
    fn test_export_file_name_sanitizes_title() {
        assert_eq!(
            export_file_name("My Plan: v2!", date(), ExportFormat::Docx),
            "My_Plan__v2__2024-03-09.docx"
        );
        assert_eq!(
            export_file_name("Résumé", date(), ExportFormat::Pdf),
            "R_sum__2024-03-09.pdf"
        );
    }

    #[test]
    fn test_markdown_export_is_identity() {
        let exporter = Exporter::default();
        for content in ["", "# T\n\n**b**", "trailing\n\n", "tabs\t\r\n"] {
            let file = exporter
                .export_dated(content, "Doc", ExportFormat::Markdown, date())
                .unwrap();
            assert_eq!(file.bytes, content.as_bytes());
            assert_eq!(file.file_name, "Doc_2024-03-09.md");
        }
    }

    #[test]
    fn test_export_names_file_with_utc_date() {
        let before = Utc::now().date_naive();
        let file = Exporter::default()
            .export("hello", "Note", ExportFormat::Markdown)
            .unwrap();
        let after = Utc::now().date_naive();

        let named = |d: NaiveDate| export_file_name("Note", d, ExportFormat::Markdown);
        assert!(file.file_name == named(before) || file.file_name == named(after));
    }

    #[test]
    fn test_empty_content_exports_in_every_format() {
        let exporter = Exporter::default();
        for format in ExportFormat::all() {
            let file = exporter.export_dated("", "", *format, date()).unwrap();
            assert!(file.file_name.starts_with("Untitled_Document_"));
            if *format != ExportFormat::Markdown {
                assert!(!file.bytes.is_empty());
            }
        }
    }

    #[test]
    fn test_pdf_export_starts_with_header() {
        let exporter = Exporter::default();
        let file = exporter
            .export_dated("# Title\n\nSome text", "T", ExportFormat::Pdf, date())
            .unwrap();
        assert!(file.bytes.starts_with(b"%PDF-1.4"));
    }

    struct FailingRasterizer;

    impl Rasterizer for FailingRasterizer {
        fn rasterize(
            &self,
            _document: &ExportDocument,
            _options: &ExportOptions,
        ) -> Result<RgbImage, ExportError> {
            Err(ExportError::Rasterize("surface unavailable".to_string()))
        }
    }

    #[test]
    fn test_rasterizer_failure_is_reported() {
        let exporter = Exporter::default().with_rasterizer(Box::new(FailingRasterizer));
        let err = exporter
            .export_dated("text", "T", ExportFormat::Pdf, date())
            .unwrap_err();
        assert!(matches!(err, ExportError::Rasterize(_)));

        // Other formats do not touch the rasterizer
        assert!(exporter
            .export_dated("text", "T", ExportFormat::Docx, date())
            .is_ok());
    }

    #[test]
    fn test_write_to_creates_directory() {
        let temp = TempDir::new().unwrap();
        let file = Exporter::default()
            .export_dated("hello", "Note", ExportFormat::Markdown, date())
            .unwrap();
        let path = file.write_to(&temp.path().join("out")).unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "hello");
    }

    #[test]
    fn test_export_error_display() {
        let err = ExportError::Package("bad entry".to_string());
        assert_eq!(err.to_string(), "Packaging error: bad entry");
    }
}

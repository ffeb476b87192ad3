//! Standalone HTML preview
//!
//! The page is rendered by comrak with GitHub-style extensions and styled
//! to look like the DOCX output on an A4 sheet. Raw HTML in the source is
//! escaped, never passed through.

use comrak::{markdown_to_html, Options};

// ─────────────────────────────────────────────────────────────────────────────
// HTML Generation
// ─────────────────────────────────────────────────────────────────────────────

/// Title used when none is supplied.
const FALLBACK_TITLE: &str = "Untitled Document";

/// A complete HTML page for `markdown`. `generator` fills the generator
/// meta tag.
pub fn generate_html_document(markdown: &str, title: Option<&str>, generator: &str) -> String {
    let body = render_body(markdown);

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <meta name="generator" content="{generator}">
    <title>{title}</title>
    <style>
{css}
    </style>
</head>
<body>
    <article class="document">
{body}
    </article>
</body>
</html>"#,
        generator = html_escape(generator),
        title = html_escape(title.unwrap_or(FALLBACK_TITLE)),
        css = DOCUMENT_CSS,
        body = body,
    )
}

fn render_body(markdown: &str) -> String {
    let mut options = Options::default();
    options.extension.table = true;
    options.extension.tasklist = true;
    options.extension.strikethrough = true;
    options.extension.autolink = true;
    options.render.unsafe_ = false;
    markdown_to_html(markdown, &options)
}

// ─────────────────────────────────────────────────────────────────────────────
// CSS
// ─────────────────────────────────────────────────────────────────────────────

/// Page-like styling that mirrors the DOCX layout (grey blockquotes,
/// Consolas code, compact list spacing).
const DOCUMENT_CSS: &str = r#"
*, *::before, *::after { box-sizing: border-box; }

body {
    margin: 0;
    background: #f3f3f3;
    color: #1a1a1a;
    font-family: Calibri, 'Segoe UI', Helvetica, Arial, sans-serif;
    font-size: 11pt;
    line-height: 1.5;
}

.document {
    max-width: 210mm;
    min-height: 295mm;
    margin: 24px auto;
    padding: 25mm 20mm;
    background: #ffffff;
    box-shadow: 0 1px 4px rgba(0, 0, 0, 0.15);
}

.document h1, .document h2, .document h3 { margin: 0 0 0.6em; line-height: 1.25; }
.document h1 { font-size: 20pt; }
.document h2 { font-size: 16pt; }
.document h3 { font-size: 13pt; }

.document p { margin: 0 0 6pt; }

.document ul, .document ol { margin: 0 0 6pt; padding-left: 18pt; }

.document blockquote {
    margin: 0 0 10pt 36pt;
    color: #666666;
    font-style: italic;
}

.document code {
    font-family: Consolas, 'Courier New', monospace;
    font-size: 9pt;
    color: #333333;
}

.document pre {
    margin: 0 0 10pt;
    padding: 8pt;
    background: #f6f6f6;
    overflow: auto;
}

.document pre code { font-size: 10pt; }

.document table { border-collapse: collapse; margin-bottom: 10pt; }
.document th, .document td { border: 1px solid #cccccc; padding: 4pt 8pt; }

@media print {
    body { background: none; }
    .document { margin: 0; box-shadow: none; }
}
"#;

fn html_escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_body_rendering() {
        let html = render_body("# Hello\n\n- [x] done\n\n~~old~~");
        assert!(html.contains("<h1>Hello</h1>"));
        assert!(html.contains("checkbox"));
        assert!(html.contains("<del>old</del>"));
    }

    #[test]
    fn test_page_wraps_body_and_metadata() {
        let html = generate_html_document("# Plan\n\n**ship**", Some("Q3 <Plan>"), "Scribe");
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<title>Q3 &lt;Plan&gt;</title>"));
        assert!(html.contains("<meta name=\"generator\" content=\"Scribe\">"));
        assert!(html.contains("<strong>ship</strong>"));
        assert!(html.trim_end().ends_with("</html>"));
    }

    #[test]
    fn test_raw_html_is_escaped() {
        let html = generate_html_document("<script>alert(1)</script>", None, "Scribe");
        assert!(!html.contains("<script>alert(1)</script>"));
        assert!(html.contains("<title>Untitled Document</title>"));
    }

    #[test]
    fn test_escape_quotes_and_ampersands() {
        assert_eq!(html_escape("Tom & \"Jerry's\""), "Tom &amp; &quot;Jerry&#39;s&quot;");
        assert_eq!(html_escape("plain"), "plain");
    }
}

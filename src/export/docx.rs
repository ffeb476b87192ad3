//! DOCX Export
//!
//! Writes an [`ExportDocument`] as a WordprocessingML package. The XML parts
//! are generated directly and zipped with the `zip` crate; there is no
//! intermediate object model.

use super::options::ExportOptions;
use super::ExportError;
use crate::markdown::{DocumentNode, ExportDocument, InlineRun, NodeContent};
use log::debug;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Subject written into the package properties.
const SUBJECT: &str = "Markdown Document";

const CODE_FONT: &str = "Consolas";
/// Half-points (10pt)
const CODE_BLOCK_SIZE: u32 = 20;
/// Half-points (9pt)
const INLINE_CODE_SIZE: u32 = 18;
const CODE_COLOR: &str = "333333";
const QUOTE_COLOR: &str = "666666";
const PLACEHOLDER_COLOR: &str = "999999";

// ─────────────────────────────────────────────────────────────────────────────
// Package
// ─────────────────────────────────────────────────────────────────────────────

/// Build the `.docx` bytes for `document`.
///
/// An empty document gets a single italic placeholder paragraph.
pub fn write_docx(
    document: &ExportDocument,
    options: &ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    let body = if document.is_empty() {
        placeholder_paragraph(&options.placeholder_text)
    } else {
        document.nodes.iter().map(node_xml).collect::<String>()
    };

    let parts: [(&str, String); 7] = [
        ("[Content_Types].xml", CONTENT_TYPES.to_string()),
        ("_rels/.rels", ROOT_RELS.to_string()),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS.to_string()),
        ("word/document.xml", document_xml(&body)),
        ("word/styles.xml", STYLES.to_string()),
        ("docProps/core.xml", core_properties(document, options)),
        ("docProps/app.xml", app_properties(options)),
    ];

    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let file_options =
        SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    for (name, xml) in &parts {
        writer.start_file(*name, file_options)?;
        writer.write_all(xml.as_bytes())?;
    }

    let bytes = writer.finish()?.into_inner();
    debug!(
        "Packaged DOCX '{}' with {} nodes ({} bytes)",
        document.title,
        document.nodes.len(),
        bytes.len()
    );
    Ok(bytes)
}

fn document_xml(body: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr><w:pgSz w:w="11906" w:h="16838"/><w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="708" w:footer="708" w:gutter="0"/></w:sectPr></w:body></w:document>"#,
        body
    )
}

fn core_properties(document: &ExportDocument, options: &ExportOptions) -> String {
    let created = document.generated_at.format("%Y-%m-%dT%H:%M:%SZ");
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance"><dc:title>{title}</dc:title><dc:subject>{subject}</dc:subject><dc:creator>{creator}</dc:creator><dc:description>{description}</dc:description><cp:lastModifiedBy>{creator}</cp:lastModifiedBy><dcterms:created xsi:type="dcterms:W3CDTF">{created}</dcterms:created><dcterms:modified xsi:type="dcterms:W3CDTF">{created}</dcterms:modified></cp:coreProperties>"#,
        title = xml_escape(&document.title),
        subject = SUBJECT,
        creator = xml_escape(&options.creator),
        description = xml_escape(&document.description(&options.creator)),
        created = created,
    )
}

fn app_properties(options: &ExportOptions) -> String {
    format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties"><Application>{}</Application></Properties>"#,
        xml_escape(&options.creator)
    )
}

// ─────────────────────────────────────────────────────────────────────────────
// Paragraphs
// ─────────────────────────────────────────────────────────────────────────────

/// Character formatting for one run.
#[derive(Debug, Clone, Copy, Default)]
struct RunProps<'a> {
    bold: bool,
    italic: bool,
    font: Option<&'a str>,
    size: Option<u32>,
    color: Option<&'a str>,
}

impl RunProps<'_> {
    fn to_xml(self) -> String {
        let mut xml = String::new();
        if let Some(font) = self.font {
            xml.push_str(&format!(r#"<w:rFonts w:ascii="{0}" w:hAnsi="{0}" w:cs="{0}"/>"#, font));
        }
        if self.bold {
            xml.push_str("<w:b/>");
        }
        if self.italic {
            xml.push_str("<w:i/>");
        }
        if let Some(color) = self.color {
            xml.push_str(&format!(r#"<w:color w:val="{}"/>"#, color));
        }
        if let Some(size) = self.size {
            xml.push_str(&format!(r#"<w:sz w:val="{0}"/><w:szCs w:val="{0}"/>"#, size));
        }
        if xml.is_empty() {
            xml
        } else {
            format!("<w:rPr>{}</w:rPr>", xml)
        }
    }
}

fn run_xml(text: &str, props: RunProps) -> String {
    format!(
        r#"<w:r>{}<w:t xml:space="preserve">{}</w:t></w:r>"#,
        props.to_xml(),
        xml_escape(text)
    )
}

/// Map an inline run to run properties. Code styling replaces any
/// surrounding emphasis.
fn inline_props(run: &InlineRun, quoted: bool) -> RunProps<'static> {
    if run.style.code {
        return RunProps {
            font: Some(CODE_FONT),
            size: Some(INLINE_CODE_SIZE),
            color: Some(CODE_COLOR),
            ..RunProps::default()
        };
    }
    RunProps {
        bold: run.style.bold,
        italic: run.style.italic || quoted,
        color: quoted.then_some(QUOTE_COLOR),
        ..RunProps::default()
    }
}

fn inline_runs_xml(runs: &[InlineRun], quoted: bool) -> String {
    runs.iter()
        .map(|run| run_xml(&run.text, inline_props(run, quoted)))
        .collect()
}

fn paragraph_xml(style: Option<&str>, node: &DocumentNode, runs: &str) -> String {
    let mut ppr = String::new();
    if let Some(style) = style {
        ppr.push_str(&format!(r#"<w:pStyle w:val="{}"/>"#, style));
    }
    ppr.push_str(&format!(r#"<w:spacing w:after="{}"/>"#, node.spacing_after));
    if node.indent_left > 0 {
        ppr.push_str(&format!(r#"<w:ind w:left="{}"/>"#, node.indent_left));
    }
    format!("<w:p><w:pPr>{}</w:pPr>{}</w:p>", ppr, runs)
}

fn node_xml(node: &DocumentNode) -> String {
    match &node.content {
        NodeContent::Heading { level, text } => {
            let style = format!("Heading{}", level);
            paragraph_xml(Some(&style), node, &run_xml(text, RunProps::default()))
        }
        NodeContent::Paragraph { runs } => {
            paragraph_xml(None, node, &inline_runs_xml(runs, false))
        }
        NodeContent::Blockquote { runs } => paragraph_xml(None, node, &inline_runs_xml(runs, true)),
        NodeContent::BulletItem { runs } => {
            let content = run_xml("• ", RunProps::default()) + &inline_runs_xml(runs, false);
            paragraph_xml(None, node, &content)
        }
        NodeContent::OrderedItem { index, runs } => {
            let prefix = format!("{}. ", index);
            let content = run_xml(&prefix, RunProps::default()) + &inline_runs_xml(runs, false);
            paragraph_xml(None, node, &content)
        }
        NodeContent::CodeBlock { body, .. } => {
            let props = RunProps {
                font: Some(CODE_FONT),
                size: Some(CODE_BLOCK_SIZE),
                color: Some(CODE_COLOR),
                ..RunProps::default()
            };
            // One run per line, joined with line breaks inside the paragraph
            let runs = body
                .split('\n')
                .map(|line| run_xml(line, props))
                .collect::<Vec<_>>()
                .join("<w:r><w:br/></w:r>");
            paragraph_xml(None, node, &runs)
        }
    }
}

fn placeholder_paragraph(text: &str) -> String {
    let props = RunProps {
        italic: true,
        color: Some(PLACEHOLDER_COLOR),
        ..RunProps::default()
    };
    format!("<w:p>{}</w:p>", run_xml(text, props))
}

/// Escape text for XML element content and attribute values.
pub(super) fn xml_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters other than tab/newline are not valid XML 1.0
            c if (c as u32) < 0x20 && c != '\t' && c != '\n' && c != '\r' => {}
            c => out.push(c),
        }
    }
    out
}

// ─────────────────────────────────────────────────────────────────────────────
// Static Parts
// ─────────────────────────────────────────────────────────────────────────────

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/><Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/><Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/><Relationship Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties" Target="docProps/app.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:docDefaults><w:rPrDefault><w:rPr><w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:cs="Calibri"/><w:sz w:val="22"/><w:szCs w:val="22"/></w:rPr></w:rPrDefault></w:docDefaults><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/><w:szCs w:val="32"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="26"/><w:szCs w:val="26"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading3"><w:name w:val="heading 3"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/><w:pPr><w:keepNext/><w:outlineLvl w:val="2"/></w:pPr><w:rPr><w:b/><w:sz w:val="24"/><w:szCs w:val="24"/></w:rPr></w:style></w:styles>"#;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

//! Rasterization for PDF export
//!
//! PDF export works from a raster image of the rendered document rather
//! than from its text, so the output is not text-searchable. The
//! [`Rasterizer`] trait is the seam: anything that can paint an
//! [`ExportDocument`] into an RGB image can back the PDF exporter.
//!
//! The bundled [`LayoutRasterizer`] lays the document out with the same
//! spacing and indents as the DOCX output and draws the text with embedded
//! DejaVu faces: sans for body text, bold and oblique variants for emphasis,
//! and mono for code.

use super::options::ExportOptions;
use super::pdf::page_height_px;
use super::ExportError;
use crate::markdown::{DocumentNode, ExportDocument, InlineRun, NodeContent};
use ab_glyph::{point, Font, FontRef, PxScale, ScaleFont};
use image::{Rgb, RgbImage};

/// Paints an export document into an image.
pub trait Rasterizer {
    /// Render `document`, `options.raster_width` pixels wide.
    fn rasterize(
        &self,
        document: &ExportDocument,
        options: &ExportOptions,
    ) -> Result<RgbImage, ExportError>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Font Data - Embedded at compile time
// ─────────────────────────────────────────────────────────────────────────────

const SANS_REGULAR: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans.ttf");
const SANS_BOLD: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Bold.ttf");
const SANS_OBLIQUE: &[u8] = include_bytes!("../../assets/fonts/DejaVuSans-Oblique.ttf");
const MONO_REGULAR: &[u8] = include_bytes!("../../assets/fonts/DejaVuSansMono.ttf");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Face {
    Regular,
    Bold,
    Italic,
    Mono,
}

struct Fonts {
    regular: FontRef<'static>,
    bold: FontRef<'static>,
    italic: FontRef<'static>,
    mono: FontRef<'static>,
}

impl Fonts {
    fn load() -> Result<Self, ExportError> {
        let parse = |bytes: &'static [u8], name: &str| {
            FontRef::try_from_slice(bytes)
                .map_err(|e| ExportError::Rasterize(format!("bundled font {}: {}", name, e)))
        };
        Ok(Self {
            regular: parse(SANS_REGULAR, "DejaVuSans")?,
            bold: parse(SANS_BOLD, "DejaVuSans-Bold")?,
            italic: parse(SANS_OBLIQUE, "DejaVuSans-Oblique")?,
            mono: parse(MONO_REGULAR, "DejaVuSansMono")?,
        })
    }

    fn face(&self, face: Face) -> &FontRef<'static> {
        match face {
            Face::Regular => &self.regular,
            Face::Bold => &self.bold,
            Face::Italic => &self.italic,
            Face::Mono => &self.mono,
        }
    }

    /// Advance width of `text` in pixels, kerning included.
    fn measure(&self, face: Face, size: f32, text: &str) -> f32 {
        let scaled = self.face(face).as_scaled(PxScale::from(size));
        let mut width = 0.0;
        let mut previous = None;
        for c in text.chars() {
            let id = scaled.glyph_id(c);
            if let Some(prev) = previous {
                width += scaled.kern(prev, id);
            }
            width += scaled.h_advance(id);
            previous = Some(id);
        }
        width
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Layout Rasterizer
// ─────────────────────────────────────────────────────────────────────────────

/// A4 width in points.
const PAGE_WIDTH_PT: f32 = 595.0;

const BODY_PT: f32 = 11.0;
const CODE_PT: f32 = 10.0;
const LINE_FACTOR: f32 = 1.45;
/// Page margin in points
const MARGIN_PT: f32 = 56.0;
/// Code blocks render tabs as this many spaces
const TAB_WIDTH: usize = 4;

/// Longest raster the bundled renderer will allocate, in pages.
pub const MAX_RASTER_PAGES: u32 = 500;

const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
const HEADING_INK: Rgb<u8> = Rgb([20, 20, 20]);
const BOLD_INK: Rgb<u8> = Rgb([35, 35, 35]);
const BODY_INK: Rgb<u8> = Rgb([51, 51, 51]);
const QUOTE_INK: Rgb<u8> = Rgb([0x66, 0x66, 0x66]);
const CODE_INK: Rgb<u8> = Rgb([0x33, 0x33, 0x33]);
const PLACEHOLDER_INK: Rgb<u8> = Rgb([0x99, 0x99, 0x99]);
const CODE_BACKGROUND: Rgb<u8> = Rgb([246, 246, 246]);
const QUOTE_RULE: Rgb<u8> = Rgb([200, 200, 200]);

/// Paints the document as a typeset page preview. See the module docs.
#[derive(Debug, Clone, Default)]
pub struct LayoutRasterizer;

impl Rasterizer for LayoutRasterizer {
    fn rasterize(
        &self,
        document: &ExportDocument,
        options: &ExportOptions,
    ) -> Result<RgbImage, ExportError> {
        if options.raster_width == 0 {
            return Err(ExportError::Rasterize("raster width is zero".to_string()));
        }

        let fonts = Fonts::load()?;
        let mut layout = Layout::new(&fonts, options.raster_width);
        if document.is_empty() {
            let words = words_of(&options.placeholder_text, Face::Regular, PLACEHOLDER_INK);
            layout.flow(&words, BODY_PT, 0.0);
        } else {
            for node in &document.nodes {
                layout.node(node);
            }
        }

        layout.paint()
    }
}

/// A word to lay out with its face and ink.
#[derive(Debug, Clone)]
struct Word {
    text: String,
    face: Face,
    ink: Rgb<u8>,
}

fn words_of(text: &str, face: Face, ink: Rgb<u8>) -> Vec<Word> {
    text.split_whitespace()
        .map(|w| Word {
            text: w.to_string(),
            face,
            ink,
        })
        .collect()
}

fn run_words(runs: &[InlineRun], quoted: bool) -> Vec<Word> {
    runs.iter()
        .flat_map(|run| {
            let (face, ink) = if run.style.code {
                (Face::Mono, CODE_INK)
            } else if quoted {
                (Face::Italic, QUOTE_INK)
            } else if run.style.bold {
                (Face::Bold, BOLD_INK)
            } else if run.style.italic {
                (Face::Italic, BODY_INK)
            } else {
                (Face::Regular, BODY_INK)
            };
            words_of(&run.text, face, ink)
        })
        .collect()
}

#[derive(Debug, Clone, Copy)]
struct Rect {
    x: f32,
    y: f32,
    w: f32,
    h: f32,
    color: Rgb<u8>,
}

/// A positioned piece of text; glyphs past `clip_right` are not drawn.
#[derive(Debug, Clone)]
struct Text {
    x: f32,
    baseline: f32,
    size: f32,
    text: String,
    face: Face,
    ink: Rgb<u8>,
    clip_right: f32,
}

/// Accumulates shapes top to bottom, then paints them.
struct Layout<'f> {
    fonts: &'f Fonts,
    width: u32,
    px_per_pt: f32,
    cursor_y: f32,
    rects: Vec<Rect>,
    texts: Vec<Text>,
}

impl<'f> Layout<'f> {
    fn new(fonts: &'f Fonts, width: u32) -> Self {
        let px_per_pt = width as f32 / PAGE_WIDTH_PT;
        Self {
            fonts,
            width,
            px_per_pt,
            cursor_y: MARGIN_PT * px_per_pt,
            rects: Vec::new(),
            texts: Vec::new(),
        }
    }

    fn margin(&self) -> f32 {
        MARGIN_PT * self.px_per_pt
    }

    fn content_right(&self) -> f32 {
        self.width as f32 - self.margin()
    }

    /// Twentieths of a point to pixels.
    fn twips(&self, twips: u32) -> f32 {
        twips as f32 / 20.0 * self.px_per_pt
    }

    /// Baseline for a line of `size` px text starting at `cursor_y`.
    fn baseline(&self, size: f32, line_height: f32) -> f32 {
        let scaled = self.fonts.regular.as_scaled(PxScale::from(size));
        let glyph_height = scaled.ascent() - scaled.descent();
        self.cursor_y + (line_height - glyph_height) / 2.0 + scaled.ascent()
    }

    fn node(&mut self, node: &DocumentNode) {
        let indent = self.twips(node.indent_left);
        match &node.content {
            NodeContent::Heading { level, text } => {
                let size = match *level {
                    1 => 20.0,
                    2 => 16.0,
                    _ => 13.0,
                };
                self.flow(&words_of(text, Face::Bold, HEADING_INK), size, indent);
            }
            NodeContent::Paragraph { runs } => {
                self.flow(&run_words(runs, false), BODY_PT, indent);
            }
            NodeContent::BulletItem { runs } => {
                let mut words = words_of("•", Face::Regular, BODY_INK);
                words.extend(run_words(runs, false));
                self.flow(&words, BODY_PT, indent);
            }
            NodeContent::OrderedItem { index, runs } => {
                let mut words = words_of(&format!("{}.", index), Face::Regular, BODY_INK);
                words.extend(run_words(runs, false));
                self.flow(&words, BODY_PT, indent);
            }
            NodeContent::Blockquote { runs } => {
                let top = self.cursor_y;
                self.flow(&run_words(runs, true), BODY_PT, indent);
                let rule_x = self.margin() + indent - 8.0 * self.px_per_pt;
                self.rects.push(Rect {
                    x: rule_x,
                    y: top,
                    w: 3.0 * self.px_per_pt,
                    h: self.cursor_y - top,
                    color: QUOTE_RULE,
                });
            }
            NodeContent::CodeBlock { body, .. } => self.code_block(body, indent),
        }
        self.cursor_y += self.twips(node.spacing_after);
    }

    /// Lay out words left to right, wrapping at the right margin.
    fn flow(&mut self, words: &[Word], size_pt: f32, indent: f32) {
        let size = size_pt * self.px_per_pt;
        let line_height = size * LINE_FACTOR;
        let left = self.margin() + indent;
        let right = self.content_right().max(left + size);

        let mut x = left;
        for word in words {
            let advance = self.fonts.measure(word.face, size, &word.text);
            let space = self.fonts.measure(word.face, size, " ");
            if x > left && x + advance > right {
                x = left;
                self.cursor_y += line_height;
            }
            self.texts.push(Text {
                x,
                baseline: self.baseline(size, line_height),
                size,
                text: word.text.clone(),
                face: word.face,
                ink: word.ink,
                clip_right: right,
            });
            x += advance + space;
        }
        self.cursor_y += line_height;
    }

    /// Code keeps its line breaks and indentation; long lines are clipped.
    fn code_block(&mut self, body: &str, indent: f32) {
        let size = CODE_PT * self.px_per_pt;
        let line_height = size * LINE_FACTOR;
        let padding = 6.0 * self.px_per_pt;
        let left = self.margin() + indent;
        let right = self.content_right();
        let lines: Vec<&str> = body.split('\n').collect();

        self.rects.push(Rect {
            x: left,
            y: self.cursor_y,
            w: right - left,
            h: lines.len() as f32 * line_height + 2.0 * padding,
            color: CODE_BACKGROUND,
        });
        self.cursor_y += padding;

        for line in lines {
            let text = line.replace('\t', &" ".repeat(TAB_WIDTH));
            if !text.trim().is_empty() {
                self.texts.push(Text {
                    x: left + padding,
                    baseline: self.baseline(size, line_height),
                    size,
                    text,
                    face: Face::Mono,
                    ink: CODE_INK,
                    clip_right: right - padding,
                });
            }
            self.cursor_y += line_height;
        }
        self.cursor_y += padding;
    }

    /// Paint onto a white canvas at least one page tall.
    fn paint(self) -> Result<RgbImage, ExportError> {
        let page_height = page_height_px(self.width);
        let content_height = (self.cursor_y + self.margin()).ceil() as u32;
        let height = content_height.max(page_height);

        if height / page_height > MAX_RASTER_PAGES {
            return Err(ExportError::Rasterize(format!(
                "document needs more than {} pages at {} px wide",
                MAX_RASTER_PAGES, self.width
            )));
        }

        let mut image = RgbImage::from_pixel(self.width, height, WHITE);
        for rect in &self.rects {
            fill_rect(&mut image, rect);
        }
        for text in &self.texts {
            draw_text(&mut image, self.fonts.face(text.face), text);
        }
        Ok(image)
    }
}

fn fill_rect(image: &mut RgbImage, rect: &Rect) {
    let x0 = rect.x.max(0.0).round() as u32;
    let y0 = rect.y.max(0.0).round() as u32;
    let x1 = ((rect.x + rect.w).round().max(0.0) as u32).min(image.width());
    let y1 = ((rect.y + rect.h).round().max(0.0) as u32).min(image.height());

    for y in y0..y1 {
        for x in x0..x1 {
            image.put_pixel(x, y, rect.color);
        }
    }
}

fn draw_text(image: &mut RgbImage, font: &FontRef<'static>, text: &Text) {
    let scale = PxScale::from(text.size);
    let scaled = font.as_scaled(scale);
    let mut caret = text.x;
    let mut previous = None;

    for c in text.text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = previous {
            caret += scaled.kern(prev, id);
        }
        let advance = scaled.h_advance(id);
        if caret + advance > text.clip_right {
            break;
        }

        let glyph = id.with_scale_and_position(scale, point(caret, text.baseline));
        if let Some(outlined) = font.outline_glyph(glyph) {
            let bounds = outlined.px_bounds();
            outlined.draw(|gx, gy, coverage| {
                let x = bounds.min.x as i64 + gx as i64;
                let y = bounds.min.y as i64 + gy as i64;
                blend(image, x, y, text.ink, coverage);
            });
        }

        caret += advance;
        previous = Some(id);
    }
}

/// Mix `ink` into the pixel at (`x`, `y`) by `coverage`.
fn blend(image: &mut RgbImage, x: i64, y: i64, ink: Rgb<u8>, coverage: f32) {
    if x < 0 || y < 0 || x >= image.width() as i64 || y >= image.height() as i64 {
        return;
    }
    let alpha = coverage.clamp(0.0, 1.0);
    let pixel = image.get_pixel_mut(x as u32, y as u32);
    for (channel, ink) in pixel.0.iter_mut().zip(ink.0) {
        let mixed = *channel as f32 * (1.0 - alpha) + ink as f32 * alpha;
        *channel = mixed.round() as u8;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn options(width: u32) -> ExportOptions {
        ExportOptions {
            raster_width: width,
            ..ExportOptions::default()
        }
    }

    fn render(markdown: &str, width: u32) -> RgbImage {
        let document = ExportDocument::from_markdown(markdown, "T");
        LayoutRasterizer.rasterize(&document, &options(width)).unwrap()
    }

    fn inked_pixels(image: &RgbImage) -> usize {
        image.pixels().filter(|p| **p != WHITE).count()
    }

    #[test]
    fn test_bundled_fonts_parse() {
        let fonts = Fonts::load().unwrap();
        let wide = fonts.measure(Face::Regular, 20.0, "WWW");
        let narrow = fonts.measure(Face::Regular, 20.0, "iii");
        assert!(wide > narrow);
        assert!(fonts.measure(Face::Bold, 20.0, "Ship") > fonts.measure(Face::Regular, 20.0, "Ship"));
    }

    #[test]
    fn test_short_document_is_one_page_tall() {
        let image = render("# Title\n\nShort text", 420);
        assert_eq!(image.width(), 420);
        assert_eq!(image.height(), 590);
        assert!(inked_pixels(&image) > 0);
    }

    #[test]
    fn test_text_is_drawn_not_redacted() {
        let plan = render("# Plan\n\nShip on Friday", 800);
        let oops = render("# Oops\n\nDrop by Monday", 800);
        assert_eq!(plan.dimensions(), oops.dimensions());
        assert_ne!(plan, oops);
    }

    #[test]
    fn test_emphasis_changes_the_face() {
        let plain = render("Ship on Friday", 800);
        let bold = render("**Ship** on Friday", 800);
        let italic = render("*Ship* on Friday", 800);
        assert_ne!(plain, bold);
        assert_ne!(plain, italic);
        assert_ne!(bold, italic);
    }

    #[test]
    fn test_long_document_grows() {
        let content = (0..200)
            .map(|i| format!("Paragraph number {} with a few more words", i))
            .collect::<Vec<_>>()
            .join("\n");
        let image = render(&content, 420);
        assert!(image.height() > 590 * 2);
    }

    #[test]
    fn test_oversized_document_is_refused() {
        let content = vec!["x"; 40_000].join("\n");
        let document = ExportDocument::from_markdown(&content, "Huge");
        let err = LayoutRasterizer.rasterize(&document, &options(200)).unwrap_err();
        assert!(matches!(err, ExportError::Rasterize(_)));
        assert!(err.to_string().contains("pages"));
    }

    #[test]
    fn test_empty_document_draws_placeholder() {
        let document = ExportDocument::from_markdown("", "Empty");
        let image = LayoutRasterizer.rasterize(&document, &options(600)).unwrap();
        assert!(inked_pixels(&image) > 0);

        let silent = ExportOptions {
            placeholder_text: String::new(),
            ..options(600)
        };
        let blank = LayoutRasterizer.rasterize(&document, &silent).unwrap();
        assert_eq!(inked_pixels(&blank), 0);
    }

    #[test]
    fn test_code_and_quote_decorations() {
        let image = render("> quoted words\n```\nfn main() {}\n```", 600);
        assert!(image.pixels().any(|p| *p == QUOTE_RULE));
        assert!(image.pixels().any(|p| *p == CODE_BACKGROUND));
        assert!(image
            .pixels()
            .any(|p| *p != WHITE && *p != QUOTE_RULE && *p != CODE_BACKGROUND));
    }

    #[test]
    fn test_zero_width_is_an_error() {
        let document = ExportDocument::from_markdown("x", "T");
        let err = LayoutRasterizer.rasterize(&document, &options(0)).unwrap_err();
        assert!(matches!(err, ExportError::Rasterize(_)));
    }

    #[test]
    fn test_words_wrap_inside_margins() {
        let fonts = Fonts::load().unwrap();
        let long = vec!["word"; 300].join(" ");
        let mut layout = Layout::new(&fonts, 400);
        layout.flow(&words_of(&long, Face::Regular, BODY_INK), BODY_PT, 0.0);

        let right = layout.content_right();
        let size = BODY_PT * layout.px_per_pt;
        for text in &layout.texts {
            let end = text.x + fonts.measure(text.face, size, &text.text);
            assert!(end <= right + 0.01, "{} overflows to {}", text.text, end);
        }
        let mut baselines: Vec<i64> = layout.texts.iter().map(|t| t.baseline as i64).collect();
        baselines.dedup();
        assert!(baselines.len() > 10);
    }

    #[test]
    fn test_long_code_lines_are_clipped() {
        let fonts = Fonts::load().unwrap();
        let mut layout = Layout::new(&fonts, 400);
        layout.code_block(&"x".repeat(500), 0.0);
        let text = &layout.texts[0];
        assert_eq!(text.face, Face::Mono);
        assert!(text.clip_right < layout.content_right());
        assert!(layout.paint().is_ok());
    }
}

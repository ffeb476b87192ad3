//! PDF Export
//!
//! Slices a rendered page image into fixed-ratio pages and embeds each page
//! as a JPEG in a minimal PDF 1.4 file. Every page is a full image; there is
//! no text layer.

use super::options::ExportOptions;
use super::ExportError;
use crate::markdown::ExportDocument;
use image::codecs::jpeg::JpegEncoder;
use image::{imageops, Rgb, RgbImage};
use log::debug;
use std::fmt::Write as _;

/// Page width in millimetres.
pub const PAGE_WIDTH_MM: f32 = 210.0;
/// Page height in millimetres.
pub const PAGE_HEIGHT_MM: f32 = 295.0;

const POINTS_PER_MM: f32 = 72.0 / 25.4;

/// Number of pages needed for an image `image_height` pixels tall when one
/// page holds `page_height` pixels. Always at least one.
pub fn page_count(image_height: u32, page_height: u32) -> u32 {
    if page_height == 0 {
        return 1;
    }
    image_height.div_ceil(page_height).max(1)
}

/// Height in pixels of one page for a raster `width` pixels wide.
pub fn page_height_px(width: u32) -> u32 {
    ((width as f32 * PAGE_HEIGHT_MM / PAGE_WIDTH_MM).round() as u32).max(1)
}

/// Paginate `raster` and write the PDF bytes.
///
/// The last page is padded with white below the remaining strip.
pub fn write_pdf(
    raster: &RgbImage,
    document: &ExportDocument,
    options: &ExportOptions,
) -> Result<Vec<u8>, ExportError> {
    let (width, height) = raster.dimensions();
    if width == 0 || height == 0 {
        return Err(ExportError::Rasterize("rendered image is empty".to_string()));
    }

    let page_height = page_height_px(width);
    let pages = page_count(height, page_height);

    let mut jpegs = Vec::with_capacity(pages as usize);
    for index in 0..pages {
        let top = index * page_height;
        let strip_height = page_height.min(height - top);
        let strip = imageops::crop_imm(raster, 0, top, width, strip_height).to_image();

        let mut page = RgbImage::from_pixel(width, page_height, Rgb([255, 255, 255]));
        imageops::replace(&mut page, &strip, 0, 0);
        jpegs.push(encode_jpeg(&page, options.jpeg_quality)?);
    }

    let mut writer = PdfWriter::new();
    writer.write_document(&jpegs, width, page_height, document, options);
    debug!(
        "Wrote PDF '{}': {} pages from a {}x{} raster",
        document.title, pages, width, height
    );
    Ok(writer.finish())
}

fn encode_jpeg(page: &RgbImage, quality: u8) -> Result<Vec<u8>, ExportError> {
    let mut bytes = Vec::new();
    {
        let mut encoder = JpegEncoder::new_with_quality(&mut bytes, quality.clamp(1, 100));
        encoder.encode_image(page)?;
    }
    Ok(bytes)
}

// ─────────────────────────────────────────────────────────────────────────────
// PDF Writer
// ─────────────────────────────────────────────────────────────────────────────

/// Object ids: 1 catalog, 2 page tree, 3 info, then three per page
/// (page, image, content stream).
const CATALOG_ID: usize = 1;
const PAGES_ID: usize = 2;
const INFO_ID: usize = 3;
const FIRST_PAGE_ID: usize = 4;

struct PdfWriter {
    buf: Vec<u8>,
    /// Byte offset of each object, indexed by id - 1
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn begin_object(&mut self, id: usize) {
        if self.offsets.len() < id {
            self.offsets.resize(id, 0);
        }
        self.offsets[id - 1] = self.buf.len();
        self.buf.extend_from_slice(format!("{} 0 obj\n", id).as_bytes());
    }

    fn end_object(&mut self) {
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn object(&mut self, id: usize, body: &str) {
        self.begin_object(id);
        self.buf.extend_from_slice(body.as_bytes());
        self.end_object();
    }

    fn stream_object(&mut self, id: usize, dict: &str, data: &[u8]) {
        self.begin_object(id);
        self.buf
            .extend_from_slice(format!("<< {} /Length {} >>\nstream\n", dict, data.len()).as_bytes());
        self.buf.extend_from_slice(data);
        self.buf.extend_from_slice(b"\nendstream");
        self.end_object();
    }

    fn write_document(
        &mut self,
        jpegs: &[Vec<u8>],
        pixel_width: u32,
        pixel_height: u32,
        document: &ExportDocument,
        options: &ExportOptions,
    ) {
        let page_w = PAGE_WIDTH_MM * POINTS_PER_MM;
        let page_h = PAGE_HEIGHT_MM * POINTS_PER_MM;

        let page_ids: Vec<usize> = (0..jpegs.len()).map(|i| FIRST_PAGE_ID + 3 * i).collect();
        let kids = page_ids.iter().fold(String::new(), |mut acc, id| {
            let _ = write!(acc, "{} 0 R ", id);
            acc
        });

        self.object(
            CATALOG_ID,
            &format!("<< /Type /Catalog /Pages {} 0 R >>", PAGES_ID),
        );
        self.object(
            PAGES_ID,
            &format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids.trim_end(),
                jpegs.len()
            ),
        );
        self.object(
            INFO_ID,
            &format!(
                "<< /Title {} /Subject {} /Creator {} /Producer {} >>",
                pdf_string(&document.title),
                pdf_string(&document.description(&options.creator)),
                pdf_string(&options.creator),
                pdf_string(crate::APP_NAME),
            ),
        );

        for (jpeg, page_id) in jpegs.iter().zip(&page_ids) {
            let image_id = page_id + 1;
            let content_id = page_id + 2;

            self.object(
                *page_id,
                &format!(
                    "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.2} {:.2}] /Resources << /XObject << /Im0 {} 0 R >> >> /Contents {} 0 R >>",
                    PAGES_ID, page_w, page_h, image_id, content_id
                ),
            );
            self.stream_object(
                image_id,
                &format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode",
                    pixel_width, pixel_height
                ),
                jpeg,
            );
            let content = format!("q {:.2} 0 0 {:.2} 0 0 cm /Im0 Do Q", page_w, page_h);
            self.stream_object(content_id, "", content.as_bytes());
        }
    }

    fn finish(mut self) -> Vec<u8> {
        let xref_offset = self.buf.len();
        let count = self.offsets.len() + 1;

        let mut xref = format!("xref\n0 {}\n0000000000 65535 f \n", count);
        for offset in &self.offsets {
            let _ = writeln!(xref, "{:010} 00000 n ", offset);
        }
        let _ = write!(
            xref,
            "trailer\n<< /Size {} /Root {} 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            count, CATALOG_ID, INFO_ID, xref_offset
        );

        self.buf.extend_from_slice(xref.as_bytes());
        self.buf
    }
}

/// Encode a PDF text string: literal for printable ASCII, UTF-16BE hex
/// otherwise.
fn pdf_string(text: &str) -> String {
    if text.chars().all(|c| c.is_ascii() && !c.is_ascii_control()) {
        let escaped = text
            .replace('\\', "\\\\")
            .replace('(', "\\(")
            .replace(')', "\\)");
        format!("({})", escaped)
    } else {
        let mut hex = String::from("<FEFF");
        for unit in text.encode_utf16() {
            let _ = write!(hex, "{:04X}", unit);
        }
        hex.push('>');
        hex
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

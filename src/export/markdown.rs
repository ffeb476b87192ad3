//! Markdown export
//!
//! The source text is written out unchanged; it never goes through the
//! document builder.

/// The bytes of `content`, untouched.
pub fn export_markdown(content: &str) -> Vec<u8> {
    content.as_bytes().to_vec()
}

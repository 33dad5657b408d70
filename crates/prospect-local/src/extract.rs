use std::io::Cursor;

/// Default wrap width for extracted text.
pub const TEXT_WIDTH: usize = 100;

/// Convert HTML to readable plain text.
///
/// Notes:
/// - This is intentionally "good enough" and deterministic, not a full
///   readability engine.
/// - Callers should apply their own output bounds if needed.
pub fn html_to_text(html: &str, width: usize) -> String {
    // html2text expects bytes; Cursor avoids allocating a second large buffer.
    html2text::from_read(Cursor::new(html.as_bytes()), width).unwrap_or_else(|_| html.to_string())
}

pub fn has_any_text(s: &str) -> bool {
    s.chars().any(|c| !c.is_whitespace())
}

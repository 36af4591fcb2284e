//! Unicode helpers for document text and terminal previews.

use unicode_segmentation::UnicodeSegmentation;

/// Byte-order mark some editors prepend to UTF-8 files.
const BOM: char = '\u{feff}';

/// Truncates a string at a grapheme cluster boundary.
///
/// # Examples
///
/// ```
/// use interview_coach::io::unicode::truncate_graphemes;
///
/// assert_eq!(truncate_graphemes("Hello", 3), "Hel");
/// assert_eq!(truncate_graphemes("世界", 5), "世界");
/// ```
#[must_use]
pub fn truncate_graphemes(s: &str, max_graphemes: usize) -> &str {
    let end = s
        .grapheme_indices(true)
        .nth(max_graphemes)
        .map_or(s.len(), |(idx, _)| idx);
    &s[..end]
}

/// Returns a single-line preview of `s`: whitespace runs collapsed and the
/// result cut to `max_graphemes` with a trailing ellipsis when shortened.
#[must_use]
pub fn preview(s: &str, max_graphemes: usize) -> String {
    let collapsed = s.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated = truncate_graphemes(&collapsed, max_graphemes);
    if truncated.len() < collapsed.len() {
        format!("{truncated}…")
    } else {
        collapsed
    }
}

/// Normalizes document text before chunking: drops a leading BOM and
/// converts CRLF/CR line endings to LF.
#[must_use]
pub fn normalize_text(s: &str) -> String {
    let s = s.strip_prefix(BOM).unwrap_or(s);
    if s.contains('\r') {
        s.replace("\r\n", "\n").replace('\r', "\n")
    } else {
        s.to_string()
    }
}

/// Validates that a byte slice is valid UTF-8.
///
/// # Errors
///
/// Returns the byte offset of the first invalid UTF-8 sequence.
pub fn validate_utf8(bytes: &[u8]) -> std::result::Result<&str, usize> {
    std::str::from_utf8(bytes).map_err(|e| e.valid_up_to())
}

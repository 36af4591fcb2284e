//! Chunk representation.
//!
//! Chunks are the raw output of a chunking strategy: a slice of a document's
//! text together with its byte range and position. They become snippets once
//! embedded and stored.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// A segment of document text produced by a chunker.
///
/// # Examples
///
/// ```
/// use interview_coach::core::Chunk;
///
/// let chunk = Chunk::new(1, "Hello, world!".to_string(), 0..13, 0);
/// assert_eq!(chunk.size(), 13);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    /// ID of the document this chunk belongs to.
    pub document_id: i64,

    /// Chunk text.
    pub content: String,

    /// Byte range in the original document.
    pub byte_range: Range<usize>,

    /// Sequential index within the document (0-based).
    pub index: usize,

    /// Whether this chunk repeats the tail of the previous one.
    pub has_overlap: bool,
}

impl Chunk {
    /// Creates a new chunk.
    #[must_use]
    pub const fn new(
        document_id: i64,
        content: String,
        byte_range: Range<usize>,
        index: usize,
    ) -> Self {
        Self {
            document_id,
            content,
            byte_range,
            index,
            has_overlap: false,
        }
    }

    /// Returns the size of the chunk in bytes.
    #[must_use]
    pub fn size(&self) -> usize {
        self.content.len()
    }

    /// Checks if the chunk is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Returns true if the chunk has nothing but whitespace.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Finds a valid UTF-8 character boundary at or before the given position.
pub(crate) fn find_char_boundary(s: &str, pos: usize) -> usize {
    if pos >= s.len() {
        return s.len();
    }
    let mut boundary = pos;
    while !s.is_char_boundary(boundary) && boundary > 0 {
        boundary -= 1;
    }
    boundary
}

/// Returns the current Unix timestamp in seconds.
#[allow(clippy::cast_possible_wrap)]
pub(crate) fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

//! Fixed-size chunking strategy.
//!
//! Splits text into segments of at most `chunk_size` bytes with a trailing
//! overlap, preferring to end a chunk on a newline and never splitting a
//! multi-byte character.

use crate::chunking::traits::{Chunker, validate};
use crate::chunking::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP, MAX_CHUNK_SIZE};
use crate::core::Chunk;
use crate::error::Result;

/// Fixed-size chunker with overlap.
///
/// # Examples
///
/// ```
/// use interview_coach::chunking::{Chunker, FixedChunker};
///
/// let chunker = FixedChunker::with_size(100);
/// let text = "Hello, world! ".repeat(20);
/// let chunks = chunker.chunk(1, &text).unwrap();
/// for chunk in &chunks {
///     assert!(chunk.size() <= 100);
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FixedChunker {
    /// Target chunk size in bytes.
    chunk_size: usize,
    /// Overlap between consecutive chunks.
    overlap: usize,
    /// Whether to align chunk ends to line boundaries.
    line_aware: bool,
}

impl Default for FixedChunker {
    fn default() -> Self {
        Self::new()
    }
}

impl FixedChunker {
    /// Creates a chunker with the default size (500) and overlap (50).
    #[must_use]
    pub const fn new() -> Self {
        Self::with_size_and_overlap(DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP)
    }

    /// Creates a chunker with custom chunk size and no overlap.
    #[must_use]
    pub const fn with_size(chunk_size: usize) -> Self {
        Self::with_size_and_overlap(chunk_size, 0)
    }

    /// Creates a chunker with custom size and overlap.
    #[must_use]
    pub const fn with_size_and_overlap(chunk_size: usize, overlap: usize) -> Self {
        Self {
            chunk_size,
            overlap,
            line_aware: true,
        }
    }

    /// Sets whether to align chunk ends to line boundaries.
    ///
    /// When enabled, a chunk ends just after the last newline found within
    /// the final tenth of its target size.
    #[must_use]
    pub const fn line_aware(mut self, enabled: bool) -> Self {
        self.line_aware = enabled;
        self
    }

    /// Returns the configured chunk size.
    #[must_use]
    pub const fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Returns the configured overlap.
    #[must_use]
    pub const fn overlap(&self) -> usize {
        self.overlap
    }

    /// Finds the end of a chunk starting at `start` aimed at `target`.
    fn find_end(&self, text: &str, start: usize, target: usize) -> usize {
        let mut pos = floor_boundary(text, target);

        if self.line_aware && pos > start {
            let search_start =
                floor_boundary(text, pos.saturating_sub(self.chunk_size / 10)).max(start);
            if let Some(offset) = text[search_start..pos].rfind('\n') {
                let newline_end = search_start + offset + 1;
                if newline_end > start {
                    return newline_end;
                }
            }
        }

        // A single character wider than the chunk size
        if pos <= start {
            pos = ceil_boundary(text, start + 1);
        }
        pos
    }
}

impl Chunker for FixedChunker {
    fn chunk(&self, document_id: i64, text: &str) -> Result<Vec<Chunk>> {
        validate(self.chunk_size, self.overlap, MAX_CHUNK_SIZE)?;

        if text.is_empty() {
            return Ok(vec![]);
        }

        if text.len() <= self.chunk_size {
            return Ok(vec![Chunk::new(
                document_id,
                text.to_string(),
                0..text.len(),
                0,
            )]);
        }

        let mut chunks = Vec::new();
        let mut start = 0;

        while start < text.len() {
            let target = start + self.chunk_size;
            let end = if target >= text.len() {
                text.len()
            } else {
                self.find_end(text, start, target)
            };

            let mut chunk = Chunk::new(
                document_id,
                text[start..end].to_string(),
                start..end,
                chunks.len(),
            );
            chunk.has_overlap = !chunks.is_empty() && self.overlap > 0;
            chunks.push(chunk);

            if end >= text.len() {
                break;
            }

            let next = if self.overlap > 0 {
                floor_boundary(text, end.saturating_sub(self.overlap))
            } else {
                end
            };
            // Always move forward
            start = if next <= start { end } else { next };
        }

        Ok(chunks)
    }

    fn name(&self) -> &'static str {
        "fixed"
    }

    fn description(&self) -> &'static str {
        "Fixed-size chunking with overlap and line boundary alignment"
    }
}

/// Largest char boundary at or before `pos`.
fn floor_boundary(text: &str, pos: usize) -> usize {
    crate::core::chunk::find_char_boundary(text, pos)
}

/// Smallest char boundary at or after `pos`.
fn ceil_boundary(text: &str, pos: usize) -> usize {
    let mut pos = pos.min(text.len());
    while !text.is_char_boundary(pos) {
        pos += 1;
    }
    pos
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_fixed_chunker_default() {
        let chunker = FixedChunker::new();
        assert_eq!(chunker.chunk_size(), 500);
        assert_eq!(chunker.overlap(), 50);
        assert_eq!(chunker.name(), "fixed");
    }

    #[test]
    fn test_empty_text() {
        let chunks = FixedChunker::with_size(100).chunk(1, "").unwrap();
        assert!(chunks.is_empty());
    }

    #[test]
    fn test_small_text() {
        let chunks = FixedChunker::with_size(100).chunk(1, "Hello, world!").unwrap();
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Hello, world!");
        assert_eq!(chunks[0].document_id, 1);
    }

    #[test]
    fn test_multiple_chunks() {
        let chunker = FixedChunker::with_size(10).line_aware(false);
        let chunks = chunker.chunk(1, "0123456789ABCDEFGHIJ").unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].byte_range, 0..10);
        assert_eq!(chunks[1].byte_range, 10..20);
    }

    #[test]
    fn test_overlap() {
        let chunker = FixedChunker::with_size_and_overlap(10, 3).line_aware(false);
        let chunks = chunker.chunk(1, "0123456789ABCDEFGHIJ").unwrap();
        assert_eq!(chunks[1].byte_range.start, 7);
        assert_eq!(chunks[1].content, "789ABCDEFG");
        assert!(!chunks[0].has_overlap);
        assert!(chunks[1].has_overlap);
    }

    #[test]
    fn test_line_aware_ends_after_newline() {
        let chunker = FixedChunker::with_size(20).line_aware(true);
        let text = "first line here...\nsecond line continues on";
        let chunks = chunker.chunk(1, text).unwrap();
        assert_eq!(chunks[0].content, "first line here...\n");
    }

    #[test]
    fn test_unicode_never_split() {
        let chunker = FixedChunker::with_size_and_overlap(5, 2).line_aware(false);
        let text = "Hello世界Test日本語";
        for chunk in chunker.chunk(1, text).unwrap() {
            assert_eq!(&text[chunk.byte_range.clone()], chunk.content);
        }
    }

    #[test]
    fn test_default_chunker_on_korean_text() {
        let text = "저는 백엔드 개발자입니다. 스프링부트와 MySQL을 사용했습니다.\n".repeat(40);
        let chunks = FixedChunker::new().chunk(1, &text).unwrap();
        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert_eq!(&text[chunk.byte_range.clone()], chunk.content);
            assert!(chunk.size() <= DEFAULT_CHUNK_SIZE);
        }
        assert_eq!(chunks.last().unwrap().byte_range.end, text.len());
    }

    #[test]
    fn test_line_search_window_inside_multibyte_char() {
        // The newline search window starts in the middle of '界'
        let text = "界a\na 世a世 \n世世a世世界界\n界";
        let chunks = FixedChunker::with_size(10).chunk(1, text).unwrap();
        for chunk in &chunks {
            assert_eq!(&text[chunk.byte_range.clone()], chunk.content);
        }
    }

    #[test]
    fn test_char_wider_than_chunk() {
        let chunker = FixedChunker::with_size(2).line_aware(false);
        let chunks = chunker.chunk(1, "世界").unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "世");
        assert_eq!(chunks[1].content, "界");
    }

    #[test]
    fn test_invalid_config() {
        assert!(FixedChunker::with_size(0).chunk(1, "test").is_err());
        assert!(
            FixedChunker::with_size_and_overlap(10, 10)
                .chunk(1, "test content here")
                .is_err()
        );
        assert!(
            FixedChunker::with_size(MAX_CHUNK_SIZE + 1)
                .chunk(1, "x")
                .is_err()
        );
    }

    proptest! {
        #[test]
        fn prop_chunks_cover_text_in_order(
            text in "[a-z \\n世界]{0,400}",
            size in 4usize..64,
            overlap_pct in 0usize..50,
        ) {
            let overlap = size * overlap_pct / 100;
            let chunker = FixedChunker::with_size_and_overlap(size, overlap);
            let chunks = chunker.chunk(7, &text).unwrap();

            if text.is_empty() {
                prop_assert!(chunks.is_empty());
            } else {
                prop_assert_eq!(chunks[0].byte_range.start, 0);
                prop_assert_eq!(chunks.last().unwrap().byte_range.end, text.len());
            }

            for (i, chunk) in chunks.iter().enumerate() {
                prop_assert_eq!(chunk.index, i);
                prop_assert_eq!(&text[chunk.byte_range.clone()], chunk.content.as_str());
                prop_assert!(chunk.size() <= size);
            }

            for pair in chunks.windows(2) {
                prop_assert!(pair[1].byte_range.start > pair[0].byte_range.start);
                prop_assert!(pair[1].byte_range.start <= pair[0].byte_range.end);
            }
        }
    }
}

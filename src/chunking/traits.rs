//! Chunker trait definition.

use crate::core::Chunk;
use crate::error::{ChunkingError, Result};

/// Trait for splitting document text into snippet-sized segments.
///
/// Implementations must be deterministic: the same input always yields the
/// same chunks, so that re-indexing produces the same snippet order.
///
/// # Examples
///
/// ```
/// use interview_coach::chunking::{Chunker, FixedChunker};
///
/// let chunker = FixedChunker::with_size(100);
/// let text = "Hello, world! ".repeat(20);
/// let chunks = chunker.chunk(1, &text).unwrap();
/// assert!(!chunks.is_empty());
/// ```
pub trait Chunker: Send + Sync {
    /// Chunks the input text into segments.
    ///
    /// # Errors
    ///
    /// Returns an error if the chunker is misconfigured.
    fn chunk(&self, document_id: i64, text: &str) -> Result<Vec<Chunk>>;

    /// Returns the name of the chunking strategy.
    fn name(&self) -> &'static str;

    /// Returns a description of the chunking strategy.
    fn description(&self) -> &'static str {
        "No description available"
    }
}

/// Checks a size/overlap pair.
///
/// # Errors
///
/// Returns an error if `chunk_size` is zero or above `max`, or if the
/// overlap is not smaller than the chunk size.
pub fn validate(chunk_size: usize, overlap: usize, max: usize) -> Result<()> {
    if chunk_size == 0 {
        return Err(ChunkingError::InvalidConfig {
            reason: "chunk_size must be > 0".to_string(),
        }
        .into());
    }
    if chunk_size > max {
        return Err(ChunkingError::ChunkTooLarge {
            size: chunk_size,
            max,
        }
        .into());
    }
    if overlap >= chunk_size {
        return Err(ChunkingError::OverlapTooLarge {
            overlap,
            size: chunk_size,
        }
        .into());
    }
    Ok(())
}

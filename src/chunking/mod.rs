//! Chunking strategies.
//!
//! Documents are split into overlapping fixed-size chunks before embedding.
//! Chunks are small (a few paragraphs) so that each retrieved snippet is a
//! focused piece of context for the interviewer prompt.

pub mod fixed;
pub mod traits;

pub use fixed::FixedChunker;
pub use traits::Chunker;

/// Default chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Default overlap between consecutive chunks in characters.
pub const DEFAULT_OVERLAP: usize = 50;

/// Maximum allowed chunk size; keeps every chunk well inside the embedding
/// model's input limit.
pub const MAX_CHUNK_SIZE: usize = 8_000;

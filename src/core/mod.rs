//! Core domain models.
//!
//! Plain data types shared by ingestion, retrieval and sessions. No I/O.

pub mod chunk;
pub mod document;
pub mod history;
pub mod snippet;

pub use chunk::Chunk;
pub use document::Document;
pub use history::{History, Role, Turn};
pub use snippet::{ScoredSnippet, Snippet};

//! Document retrieval.
//!
//! Reference documents are chunked and embedded at indexing time
//! ([`Indexer`]); at query time the [`Retriever`] embeds the user's message
//! and returns the most similar snippets from the [`SnippetIndex`].

pub mod index;
pub mod ingest;
pub mod retriever;

pub use index::SnippetIndex;
pub use ingest::{Indexer, UPLOAD_SOURCE};
pub use retriever::Retriever;

/// Default number of snippets added to a prompt.
pub const DEFAULT_TOP_K: usize = 3;

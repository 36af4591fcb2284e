//! Snippets: embedded chunks of reference documents.

use serde::{Deserialize, Serialize};

/// An indexed, embedded fragment of a document.
///
/// Snippets are created once at indexing time and never modified.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snippet {
    /// Storage identifier.
    pub id: i64,

    /// Owning document.
    pub document_id: i64,

    /// Name of the owning document.
    pub source: String,

    /// Snippet text.
    pub text: String,

    /// Position within the owning document.
    pub position: usize,

    /// Embedding vector.
    #[serde(skip)]
    pub embedding: Vec<f32>,
}

/// A snippet returned by retrieval, with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSnippet {
    /// Storage identifier of the snippet.
    pub id: i64,

    /// Name of the owning document.
    pub source: String,

    /// Snippet text.
    pub text: String,

    /// Position within the owning document.
    pub position: usize,

    /// Cosine similarity to the query.
    pub score: f32,
}

impl ScoredSnippet {
    /// Builds a scored view of `snippet`.
    #[must_use]
    pub fn new(snippet: &Snippet, score: f32) -> Self {
        Self {
            id: snippet.id,
            source: snippet.source.clone(),
            text: snippet.text.clone(),
            position: snippet.position,
            score,
        }
    }
}

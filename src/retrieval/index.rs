//! In-memory snippet index.
//!
//! Holds every snippet embedded with the active embedding model, in
//! insertion order, and ranks them against a query vector with a flat
//! cosine scan.

use crate::core::{ScoredSnippet, Snippet};
use crate::embedding::cosine_similarity;
use crate::error::{EmbeddingError, Result};
use rayon::prelude::*;
use std::sync::{PoisonError, RwLock};

/// Snippet index shared by the retriever and the ingestion pipeline.
///
/// Ingestion appends; retrieval only reads. Insertion order is the
/// tie-breaker for equal scores.
#[derive(Debug, Default)]
pub struct SnippetIndex {
    snippets: RwLock<Vec<Snippet>>,
}

impl SnippetIndex {
    /// Creates an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an index from snippets already in document order.
    #[must_use]
    pub fn from_snippets(snippets: Vec<Snippet>) -> Self {
        Self {
            snippets: RwLock::new(snippets),
        }
    }

    /// Appends snippets after the existing ones.
    pub fn extend(&self, snippets: impl IntoIterator<Item = Snippet>) {
        self.snippets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(snippets);
    }

    /// Removes every snippet of a document. Returns how many were removed.
    pub fn remove_document(&self, document_id: i64) -> usize {
        let mut snippets = self.snippets.write().unwrap_or_else(PoisonError::into_inner);
        let before = snippets.len();
        snippets.retain(|s| s.document_id != document_id);
        before - snippets.len()
    }

    /// Removes all snippets.
    pub fn clear(&self) {
        self.snippets
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Number of indexed snippets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snippets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Returns true if nothing is indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Vector dimension of the indexed snippets, if any.
    #[must_use]
    pub fn dimensions(&self) -> Option<usize> {
        self.snippets
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .first()
            .map(|s| s.embedding.len())
    }

    /// Returns the `k` snippets most similar to `query`, score descending,
    /// equal scores in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`EmbeddingError::DimensionMismatch`] if the query vector's
    /// length differs from the indexed vectors.
    pub fn rank(&self, query: &[f32], k: usize) -> Result<Vec<ScoredSnippet>> {
        let snippets = self.snippets.read().unwrap_or_else(PoisonError::into_inner);
        if k == 0 || snippets.is_empty() {
            return Ok(Vec::new());
        }

        if let Some(first) = snippets.first()
            && first.embedding.len() != query.len()
        {
            return Err(EmbeddingError::DimensionMismatch {
                expected: first.embedding.len(),
                actual: query.len(),
            }
            .into());
        }

        let mut scored: Vec<(usize, f32)> = snippets
            .par_iter()
            .enumerate()
            .map(|(ordinal, snippet)| (ordinal, cosine_similarity(query, &snippet.embedding)))
            .filter(|(_, score)| !score.is_nan())
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);

        Ok(scored
            .into_iter()
            .map(|(ordinal, score)| ScoredSnippet::new(&snippets[ordinal], score))
            .collect())
    }
}

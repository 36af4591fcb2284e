//! Query-time retrieval.

use crate::core::ScoredSnippet;
use crate::embedding::Embedder;
use crate::error::{EmbeddingError, Result};
use crate::retrieval::SnippetIndex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Upper bound on embedding one query before the turn goes on without context.
pub const DEFAULT_EMBED_TIMEOUT: Duration = Duration::from_secs(10);

/// Embeds queries and ranks indexed snippets against them.
///
/// Cheap to clone; clones share the embedder and index.
#[derive(Clone)]
pub struct Retriever {
    embedder: Arc<dyn Embedder>,
    index: Arc<SnippetIndex>,
    timeout: Duration,
}

impl Retriever {
    /// Creates a retriever over `index`.
    #[must_use]
    pub fn new(embedder: Arc<dyn Embedder>, index: Arc<SnippetIndex>) -> Self {
        Self {
            embedder,
            index,
            timeout: DEFAULT_EMBED_TIMEOUT,
        }
    }

    /// Sets how long a query embedding may take.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the shared index.
    #[must_use]
    pub const fn index(&self) -> &Arc<SnippetIndex> {
        &self.index
    }

    /// Returns up to `k` snippets most similar to `query`.
    ///
    /// Any embedding failure is logged and yields an empty result so the
    /// conversation can continue without context.
    pub async fn retrieve(&self, query: &str, k: usize) -> Vec<ScoredSnippet> {
        match self.try_retrieve(query, k).await {
            Ok(snippets) => snippets,
            Err(err) => {
                warn!(error = %err, "retrieval degraded; continuing without context");
                Vec::new()
            }
        }
    }

    /// Like [`Retriever::retrieve`] but surfaces embedding errors.
    ///
    /// With `k == 0` or an empty index the embedding service is not called.
    ///
    /// # Errors
    ///
    /// Returns an embedding error if the query cannot be embedded in time or
    /// its dimension does not match the index.
    pub async fn try_retrieve(&self, query: &str, k: usize) -> Result<Vec<ScoredSnippet>> {
        if k == 0 || self.index.is_empty() {
            return Ok(Vec::new());
        }

        let vector = tokio::time::timeout(self.timeout, self.embedder.embed(query))
            .await
            .map_err(|_| {
                EmbeddingError::Service(format!(
                    "query embedding timed out after {}ms",
                    self.timeout.as_millis()
                ))
            })??;
        let ranked = self.index.rank(&vector, k)?;
        debug!(
            k,
            returned = ranked.len(),
            top_score = ranked.first().map(|s| s.score),
            "retrieved snippets"
        );
        Ok(ranked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Snippet;
    use crate::embedding::{DEFAULT_DIMENSIONS, FallbackEmbedder};
    use crate::error::Error;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Embedder that always fails and counts calls.
    #[derive(Default)]
    struct FailingEmbedder {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Embedder for FailingEmbedder {
        fn model(&self) -> &str {
            "failing"
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(EmbeddingError::Service("connection refused".to_string()).into())
        }
    }

    /// Embedder whose requests never complete.
    struct StalledEmbedder;

    #[async_trait]
    impl Embedder for StalledEmbedder {
        fn model(&self) -> &str {
            "stalled"
        }

        async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
            std::future::pending().await
        }
    }

    fn hash_index(texts: &[&str]) -> Arc<SnippetIndex> {
        let embedder = FallbackEmbedder::new(DEFAULT_DIMENSIONS);
        Arc::new(SnippetIndex::from_snippets(
            texts
                .iter()
                .zip(1..)
                .map(|(text, id)| Snippet {
                    id,
                    document_id: 1,
                    source: "notes.md".to_string(),
                    text: (*text).to_string(),
                    position: usize::try_from(id).unwrap(),
                    embedding: embedder.generate_embedding(text),
                })
                .collect(),
        ))
    }

    #[tokio::test]
    async fn test_retrieve_relevant_snippet_first() {
        let index = hash_index(&[
            "Kubernetes schedules containers onto nodes",
            "A hash map maps keys to values in O(1) average time",
            "TCP uses a three-way handshake",
        ]);
        let retriever = Retriever::new(Arc::new(FallbackEmbedder::new(DEFAULT_DIMENSIONS)), index);

        let results = retriever.retrieve("What is a hash map?", 3).await;
        assert_eq!(results.len(), 3);
        assert!(results[0].text.contains("hash map"));
    }

    #[tokio::test]
    async fn test_k_zero_skips_embedding() {
        let embedder = Arc::new(FailingEmbedder::default());
        let retriever = Retriever::new(embedder.clone(), hash_index(&["a"]));

        assert!(retriever.try_retrieve("query", 0).await.unwrap().is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_index_skips_embedding() {
        let embedder = Arc::new(FailingEmbedder::default());
        let retriever = Retriever::new(embedder.clone(), Arc::new(SnippetIndex::new()));

        assert!(retriever.try_retrieve("query", 3).await.unwrap().is_empty());
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_embedding_failure_degrades_to_empty() {
        let embedder = Arc::new(FailingEmbedder::default());
        let retriever = Retriever::new(embedder.clone(), hash_index(&["a hash map"]));

        assert!(retriever.retrieve("hash map", 3).await.is_empty());
        assert!(matches!(
            retriever.try_retrieve("hash map", 3).await,
            Err(Error::Embedding(EmbeddingError::Service(_)))
        ));
        assert_eq!(embedder.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_dimension_mismatch_degrades_to_empty() {
        let retriever = Retriever::new(
            Arc::new(FallbackEmbedder::new(8)),
            hash_index(&["a hash map"]),
        );
        assert!(retriever.retrieve("hash map", 3).await.is_empty());
    }

    #[tokio::test]
    async fn test_slow_embedding_times_out_to_empty() {
        let retriever = Retriever::new(Arc::new(StalledEmbedder), hash_index(&["a hash map"]))
            .with_timeout(Duration::from_millis(50));

        let err = retriever.try_retrieve("hash map", 3).await.unwrap_err();
        assert!(matches!(err, Error::Embedding(EmbeddingError::Service(ref m)) if m.contains("timed out")));
        assert!(retriever.retrieve("hash map", 3).await.is_empty());
    }
}

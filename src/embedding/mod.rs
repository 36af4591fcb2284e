//! Embedding generation for snippet retrieval.
//!
//! Two embedders are provided: the hosted OpenAI-compatible embedding API
//! (default) and a hash-based lexical embedder selected with
//! `EMBEDDING=hash`, which works offline and is deterministic.

mod fallback;
mod openai;

pub use fallback::FallbackEmbedder;
pub use openai::OpenAiEmbedder;

use crate::Result;
use crate::config::Config;
use crate::error::EmbeddingError;
use async_trait::async_trait;
use std::sync::Arc;

/// Dimensions of the hash-based embedder.
pub const DEFAULT_DIMENSIONS: usize = 384;

/// Trait for embedding generators.
///
/// Implementations are shared across sessions and must be `Send + Sync`.
///
/// # Examples
///
/// ```
/// use interview_coach::embedding::{Embedder, FallbackEmbedder, DEFAULT_DIMENSIONS};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let embedder = FallbackEmbedder::new(DEFAULT_DIMENSIONS);
/// let embedding = embedder.embed("Hello, world!").await.unwrap();
/// assert_eq!(embedding.len(), DEFAULT_DIMENSIONS);
/// # }
/// ```
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Name of the embedding model, stored alongside indexed documents.
    fn model(&self) -> &str;

    /// Generates embeddings for multiple texts, in input order.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedding service fails.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;

    /// Generates an embedding for a single text.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedding service fails.
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vectors = self.embed_batch(&[text.to_string()]).await?;
        match (vectors.pop(), vectors.len()) {
            (Some(vector), 0) => Ok(vector),
            (last, rest) => Err(EmbeddingError::CountMismatch {
                expected: 1,
                actual: rest + usize::from(last.is_some()),
            }
            .into()),
        }
    }
}

/// Creates the embedder selected by the configuration.
#[must_use]
pub fn create_embedder(config: &Config) -> Arc<dyn Embedder> {
    if config.uses_hash_embeddings() {
        Arc::new(FallbackEmbedder::new(DEFAULT_DIMENSIONS))
    } else {
        Arc::new(OpenAiEmbedder::new(config))
    }
}

/// Computes cosine similarity between two embedding vectors.
///
/// Returns a value between -1.0 (opposite) and 1.0 (identical), or 0.0 if
/// the vectors differ in length or either has zero magnitude.
#[must_use]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

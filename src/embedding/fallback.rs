//! Hash-based lexical embedder.
//!
//! Produces deterministic pseudo-embeddings from word and character-trigram
//! hashes. Similar wording yields similar vectors; meaning does not. Used
//! offline, in tests, and when `EMBEDDING=hash`.

use crate::Result;
use crate::config::HASH_EMBEDDING_MODEL;
use crate::embedding::Embedder;
use async_trait::async_trait;
use rayon::prelude::*;

/// FNV-1a offset basis.
const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;

/// FNV-1a prime.
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Hash-based fallback embedder.
///
/// Vectors are stable across builds and platforms, so an index built with
/// this embedder stays valid after an upgrade.
///
/// # Examples
///
/// ```
/// use interview_coach::embedding::{FallbackEmbedder, DEFAULT_DIMENSIONS};
///
/// let embedder = FallbackEmbedder::new(DEFAULT_DIMENSIONS);
/// let emb1 = embedder.generate_embedding("hello world");
/// let emb2 = embedder.generate_embedding("hello world");
/// assert_eq!(emb1, emb2);
/// ```
#[derive(Debug, Clone)]
pub struct FallbackEmbedder {
    dimensions: usize,
}

impl FallbackEmbedder {
    /// Creates a new fallback embedder with the specified dimensions.
    #[must_use]
    pub const fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Returns the vector dimensions.
    #[must_use]
    pub const fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// FNV-1a over the UTF-8 bytes of `s`.
    fn hash_string(s: &str) -> u64 {
        s.bytes().fold(FNV_OFFSET, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
        })
    }

    /// Generates a unit-length pseudo-embedding from text.
    ///
    /// Text without any alphanumeric content maps to the zero vector.
    #[must_use]
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return embedding;
        }

        let normalized: String = text
            .chars()
            .map(|c| {
                if c.is_alphanumeric() {
                    c.to_lowercase().next().unwrap_or(c)
                } else {
                    ' '
                }
            })
            .collect();

        // Words carry most of the signal
        for word in normalized.split_whitespace() {
            let hash = Self::hash_string(word);
            let idx = (hash as usize) % self.dimensions;
            let sign = if (hash >> 32) & 1 == 0 { 1.0 } else { -1.0 };
            let magnitude = 1.0 + ((hash >> 16) & 0xFF) as f32 / 255.0;
            embedding[idx] += sign * magnitude;
        }

        // Trigrams within words give partial credit for inflections
        for word in normalized.split_whitespace() {
            let chars: Vec<char> = word.chars().collect();
            for window in chars.windows(3) {
                let trigram: String = window.iter().collect();
                let hash = Self::hash_string(&trigram);
                let idx = (hash as usize) % self.dimensions;
                let sign = if (hash >> 32) & 1 == 0 { 0.5 } else { -0.5 };
                embedding[idx] += sign;
            }
        }

        let magnitude: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for val in &mut embedding {
                *val /= magnitude;
            }
        }

        embedding
    }
}

#[async_trait]
impl Embedder for FallbackEmbedder {
    fn model(&self) -> &str {
        HASH_EMBEDDING_MODEL
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts
            .par_iter()
            .map(|text| self.generate_embedding(text))
            .collect())
    }
}

//! Hosted embedding API client.

use crate::Result;
use crate::config::Config;
use crate::embedding::Embedder;
use crate::error::EmbeddingError;
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::types::CreateEmbeddingRequestArgs;
use async_trait::async_trait;
use tracing::debug;

/// Maximum inputs per embedding request.
pub const BATCH_SIZE: usize = 64;

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint.
#[derive(Clone)]
pub struct OpenAiEmbedder {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiEmbedder {
    /// Creates an embedder for the configured embedding model.
    ///
    /// No network activity happens until the first request.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            client: config.client(),
            model: config.embedding_model.clone(),
        }
    }

    async fn embed_chunk(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let request = CreateEmbeddingRequestArgs::default()
            .model(self.model.as_str())
            .input(inputs.to_vec())
            .build()
            .map_err(EmbeddingError::from)?;

        let response = self
            .client
            .embeddings()
            .create(request)
            .await
            .map_err(EmbeddingError::from)?;

        let mut data = response.data;
        if data.len() != inputs.len() {
            return Err(EmbeddingError::CountMismatch {
                expected: inputs.len(),
                actual: data.len(),
            }
            .into());
        }
        data.sort_by_key(|embedding| embedding.index);
        Ok(data.into_iter().map(|e| e.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAiEmbedder {
    fn model(&self) -> &str {
        &self.model
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for (i, batch) in texts.chunks(BATCH_SIZE).enumerate() {
            debug!(batch = i, size = batch.len(), model = %self.model, "embedding request");
            vectors.extend(self.embed_chunk(batch).await?);
        }
        Ok(vectors)
    }
}

//! Document ingestion: chunk, embed, persist, index.

use crate::chunking::{Chunker, FixedChunker};
use crate::core::document::is_supported;
use crate::core::{Chunk, Document};
use crate::embedding::Embedder;
use crate::error::{IoError, Result, StorageError};
use crate::io::{load_document, normalize_text};
use crate::retrieval::SnippetIndex;
use crate::storage::{Storage, StorageStats};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

/// Source recorded for documents uploaded over HTTP.
pub const UPLOAD_SOURCE: &str = "upload";

/// Owns persistent storage and keeps the in-memory index in step with it.
pub struct Indexer {
    storage: Mutex<Box<dyn Storage>>,
    embedder: Arc<dyn Embedder>,
    index: Arc<SnippetIndex>,
    chunker: FixedChunker,
}

impl Indexer {
    /// Opens the indexer, loading every stored snippet that was embedded
    /// with the active embedding model into a fresh index.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be initialized or read.
    pub fn open(
        mut storage: Box<dyn Storage>,
        embedder: Arc<dyn Embedder>,
        chunker: FixedChunker,
    ) -> Result<Self> {
        storage.init()?;

        let snippets = storage.load_snippets(embedder.model())?;
        let stats = storage.stats()?;
        let skipped: Vec<&String> = stats
            .embedding_models
            .iter()
            .filter(|m| m.as_str() != embedder.model())
            .collect();
        if !skipped.is_empty() {
            warn!(
                active = embedder.model(),
                ?skipped,
                "some documents were embedded with another model and are not searchable"
            );
        }
        info!(
            snippets = snippets.len(),
            model = embedder.model(),
            "loaded snippet index"
        );

        Ok(Self {
            storage: Mutex::new(storage),
            embedder,
            index: Arc::new(SnippetIndex::from_snippets(snippets)),
            chunker,
        })
    }

    /// Returns the shared snippet index.
    #[must_use]
    pub const fn index(&self) -> &Arc<SnippetIndex> {
        &self.index
    }

    /// Returns the embedder used for documents and queries.
    #[must_use]
    pub const fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.embedder
    }

    fn storage(&self) -> MutexGuard<'_, Box<dyn Storage>> {
        self.storage.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Indexes a `.txt` or `.md` file from disk.
    ///
    /// # Errors
    ///
    /// See [`Indexer::index_text`]; also fails if the file cannot be read.
    pub async fn index_file(&self, path: &Path) -> Result<Document> {
        let loaded = load_document(path)?;
        self.index_text(&loaded.name, &loaded.source, &loaded.content)
            .await
    }

    /// Indexes document text under `name`.
    ///
    /// The name must carry a `.txt` or `.md` extension. Nothing is stored
    /// unless every chunk was embedded.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::UnsupportedFormat`], [`IoError::EmptyDocument`],
    /// [`StorageError::DuplicateDocument`], or an embedding/storage error.
    pub async fn index_text(&self, name: &str, source: &str, content: &str) -> Result<Document> {
        if !is_supported(name) {
            return Err(IoError::UnsupportedFormat {
                name: name.to_string(),
            }
            .into());
        }

        let content = normalize_text(content);
        let document = Document::new(name, source, &content, self.embedder.model());

        if let Some(existing) = self.storage().find_by_hash(&document.content_hash)? {
            return Err(StorageError::DuplicateDocument {
                name: existing.name,
            }
            .into());
        }

        let chunks: Vec<Chunk> = self
            .chunker
            .chunk(0, &content)?
            .into_iter()
            .filter(|c| !c.is_blank())
            .collect();
        if chunks.is_empty() {
            return Err(IoError::EmptyDocument {
                name: name.to_string(),
            }
            .into());
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let embeddings = self.embedder.embed_batch(&texts).await?;

        let (stored, snippets) = self
            .storage()
            .add_document(&document, &chunks, &embeddings)?;
        self.index.extend(snippets);

        info!(
            name = %stored.name,
            chunks = stored.chunk_count,
            size = stored.size,
            "indexed document"
        );
        Ok(stored)
    }

    /// Lists indexed documents.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be read.
    pub fn list(&self) -> Result<Vec<Document>> {
        self.storage().list_documents()
    }

    /// Removes a document by ID or name.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::DocumentNotFound`] if no document matches.
    pub fn remove(&self, identifier: &str) -> Result<Document> {
        let mut storage = self.storage();
        let document =
            storage
                .find_document(identifier)?
                .ok_or_else(|| StorageError::DocumentNotFound {
                    identifier: identifier.to_string(),
                })?;
        let id = document.id.unwrap_or_default();
        storage.delete_document(id)?;
        drop(storage);

        let removed = self.index.remove_document(id);
        info!(name = %document.name, snippets = removed, "removed document");
        Ok(document)
    }

    /// Deletes every document and snippet.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be cleared.
    pub fn reset(&self) -> Result<()> {
        self.storage().reset()?;
        self.index.clear();
        info!("cleared document index");
        Ok(())
    }

    /// Returns storage statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if statistics cannot be gathered.
    pub fn stats(&self) -> Result<StorageStats> {
        self.storage().stats()
    }
}

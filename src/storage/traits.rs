//! Storage trait definition.

use crate::core::{Chunk, Document, Snippet};
use crate::error::Result;
use serde::Serialize;

/// Trait for persistent document and snippet storage.
pub trait Storage: Send {
    /// Initializes storage (creates schema). Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if schema creation fails or the database was created
    /// by a newer schema version.
    fn init(&mut self) -> Result<()>;

    /// Checks if storage is initialized.
    ///
    /// # Errors
    ///
    /// Returns an error if the check cannot be performed.
    fn is_initialized(&self) -> Result<bool>;

    /// Deletes all documents and snippets, keeping the schema.
    ///
    /// # Errors
    ///
    /// Returns an error if deletion fails.
    fn reset(&mut self) -> Result<()>;

    /// Stores a document together with its embedded chunks in one
    /// transaction, returning the new document and its snippets in order.
    ///
    /// `embeddings[i]` belongs to `chunks[i]`.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::StorageError::DuplicateDocument`] if a
    /// document with the same content hash exists, or a database error.
    fn add_document(
        &mut self,
        document: &Document,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> Result<(Document, Vec<Snippet>)>;

    /// Retrieves a document by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn get_document(&self, id: i64) -> Result<Option<Document>>;

    /// Retrieves a document by ID or, failing that, by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn find_document(&self, identifier: &str) -> Result<Option<Document>>;

    /// Retrieves the document with the given content hash.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn find_by_hash(&self, content_hash: &str) -> Result<Option<Document>>;

    /// Lists all documents in indexing order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn list_documents(&self) -> Result<Vec<Document>>;

    /// Deletes a document and its snippets.
    ///
    /// # Errors
    ///
    /// Returns an error if the document does not exist or deletion fails.
    fn delete_document(&mut self, id: i64) -> Result<()>;

    /// Loads every snippet embedded with `embedding_model`, ordered by
    /// document then position.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    fn load_snippets(&self, embedding_model: &str) -> Result<Vec<Snippet>>;

    /// Gets storage statistics.
    ///
    /// # Errors
    ///
    /// Returns an error if statistics cannot be gathered.
    fn stats(&self) -> Result<StorageStats>;
}

/// Storage statistics.
#[derive(Debug, Clone, Default, Serialize)]
pub struct StorageStats {
    /// Number of documents stored.
    pub document_count: usize,
    /// Total number of snippets.
    pub snippet_count: usize,
    /// Total size of indexed text in bytes.
    pub total_content_size: usize,
    /// Distinct embedding models used by stored documents.
    pub embedding_models: Vec<String>,
    /// Schema version.
    pub schema_version: u32,
    /// Database file size in bytes (if applicable).
    pub db_size: Option<u64>,
}

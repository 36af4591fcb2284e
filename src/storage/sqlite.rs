//! `SQLite` storage implementation.

// SQLite stores all integers as i64. These casts are intentional and safe
// because we only store non-negative values that fit in usize.
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::cast_possible_wrap)]

use crate::core::{Chunk, Document, Snippet};
use crate::error::{Result, StorageError};
use crate::storage::schema::{
    CHECK_SCHEMA_SQL, CURRENT_SCHEMA_VERSION, GET_VERSION_SQL, SCHEMA_SQL, SET_VERSION_SQL,
    decode_embedding, encode_embedding,
};
use crate::storage::traits::{Storage, StorageStats};
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::path::{Path, PathBuf};

const DOCUMENT_COLUMNS: &str =
    "id, name, source, content_hash, size, chunk_count, embedding_model, created_at";

/// SQLite-based storage implementation.
///
/// # Examples
///
/// ```no_run
/// use interview_coach::storage::{SqliteStorage, Storage};
///
/// let mut storage = SqliteStorage::open(".interview/index.db").unwrap();
/// storage.init().unwrap();
/// ```
pub struct SqliteStorage {
    conn: Connection,
    path: Option<PathBuf>,
}

impl SqliteStorage {
    /// Opens or creates a `SQLite` database at the given path, creating the
    /// parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
            && !parent.exists()
        {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Database(e.to_string()))?;
        }

        let conn = Connection::open(&path).map_err(StorageError::from)?;
        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(StorageError::from)?;
        let _: String = conn
            .query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))
            .map_err(StorageError::from)?;

        Ok(Self {
            conn,
            path: Some(path),
        })
    }

    /// Creates an in-memory `SQLite` database.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be created.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(StorageError::from)?;
        conn.execute("PRAGMA foreign_keys = ON;", [])
            .map_err(StorageError::from)?;

        Ok(Self { conn, path: None })
    }

    /// Returns the database path (None for in-memory).
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    fn get_schema_version(&self) -> Result<Option<u32>> {
        let version: Option<String> = self
            .conn
            .query_row(GET_VERSION_SQL, [], |row| row.get(0))
            .optional()
            .map_err(StorageError::from)?;

        Ok(version.and_then(|v| v.parse().ok()))
    }

    fn set_schema_version(&self, version: u32) -> Result<()> {
        self.conn
            .execute(SET_VERSION_SQL, params![version.to_string()])
            .map_err(StorageError::from)?;
        Ok(())
    }

    fn row_to_document(row: &Row<'_>) -> rusqlite::Result<Document> {
        Ok(Document {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            source: row.get(2)?,
            content_hash: row.get(3)?,
            size: row.get::<_, i64>(4)? as usize,
            chunk_count: row.get::<_, i64>(5)? as usize,
            embedding_model: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn query_document(&self, sql: &str, param: &dyn rusqlite::ToSql) -> Result<Option<Document>> {
        Ok(self
            .conn
            .query_row(sql, [param], Self::row_to_document)
            .optional()
            .map_err(StorageError::from)?)
    }
}

impl Storage for SqliteStorage {
    fn init(&mut self) -> Result<()> {
        let is_init: i64 = self
            .conn
            .query_row(CHECK_SCHEMA_SQL, [], |row| row.get(0))
            .map_err(StorageError::from)?;

        if is_init == 0 {
            self.conn
                .execute_batch(SCHEMA_SQL)
                .map_err(StorageError::from)?;
            self.set_schema_version(CURRENT_SCHEMA_VERSION)?;
        } else if let Some(current) = self.get_schema_version()?
            && current > CURRENT_SCHEMA_VERSION
        {
            return Err(StorageError::Migration(format!(
                "database schema version {current} is newer than supported version {CURRENT_SCHEMA_VERSION}"
            ))
            .into());
        }

        Ok(())
    }

    fn is_initialized(&self) -> Result<bool> {
        let count: i64 = self
            .conn
            .query_row(CHECK_SCHEMA_SQL, [], |row| row.get(0))
            .map_err(StorageError::from)?;
        Ok(count > 0)
    }

    fn reset(&mut self) -> Result<()> {
        self.conn
            .execute_batch(
                r"
            DELETE FROM snippets;
            DELETE FROM documents;
        ",
            )
            .map_err(StorageError::from)?;
        Ok(())
    }

    fn add_document(
        &mut self,
        document: &Document,
        chunks: &[Chunk],
        embeddings: &[Vec<f32>],
    ) -> Result<(Document, Vec<Snippet>)> {
        if chunks.len() != embeddings.len() {
            return Err(StorageError::Database(format!(
                "{} chunks but {} embeddings",
                chunks.len(),
                embeddings.len()
            ))
            .into());
        }

        if let Some(existing) = self.find_by_hash(&document.content_hash)? {
            return Err(StorageError::DuplicateDocument {
                name: existing.name,
            }
            .into());
        }

        let tx = self.conn.transaction().map_err(StorageError::from)?;

        tx.execute(
            r"
            INSERT INTO documents (name, source, content_hash, size, chunk_count, embedding_model, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
        ",
            params![
                document.name,
                document.source,
                document.content_hash,
                document.size as i64,
                chunks.len() as i64,
                document.embedding_model,
                document.created_at,
            ],
        )
        .map_err(StorageError::from)?;
        let document_id = tx.last_insert_rowid();

        let mut snippets = Vec::with_capacity(chunks.len());
        {
            let mut stmt = tx
                .prepare(
                    r"
                INSERT INTO snippets (document_id, content, byte_start, byte_end, chunk_index, embedding, dimensions)
                VALUES (?, ?, ?, ?, ?, ?, ?)
            ",
                )
                .map_err(StorageError::from)?;

            for (chunk, embedding) in chunks.iter().zip(embeddings) {
                stmt.execute(params![
                    document_id,
                    chunk.content,
                    chunk.byte_range.start as i64,
                    chunk.byte_range.end as i64,
                    chunk.index as i64,
                    encode_embedding(embedding),
                    embedding.len() as i64,
                ])
                .map_err(StorageError::from)?;

                snippets.push(Snippet {
                    id: tx.last_insert_rowid(),
                    document_id,
                    source: document.name.clone(),
                    text: chunk.content.clone(),
                    position: chunk.index,
                    embedding: embedding.clone(),
                });
            }
        }

        tx.commit().map_err(StorageError::from)?;

        let stored = Document {
            id: Some(document_id),
            chunk_count: chunks.len(),
            ..document.clone()
        };
        Ok((stored, snippets))
    }

    fn get_document(&self, id: i64) -> Result<Option<Document>> {
        self.query_document(
            &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?"),
            &id,
        )
    }

    fn find_document(&self, identifier: &str) -> Result<Option<Document>> {
        if let Ok(id) = identifier.parse::<i64>()
            && let Some(doc) = self.get_document(id)?
        {
            return Ok(Some(doc));
        }
        self.query_document(
            &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE name = ? ORDER BY id LIMIT 1"),
            &identifier,
        )
    }

    fn find_by_hash(&self, content_hash: &str) -> Result<Option<Document>> {
        self.query_document(
            &format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE content_hash = ?"),
            &content_hash,
        )
    }

    fn list_documents(&self) -> Result<Vec<Document>> {
        let mut stmt = self
            .conn
            .prepare(&format!(
                "SELECT {DOCUMENT_COLUMNS} FROM documents ORDER BY id"
            ))
            .map_err(StorageError::from)?;

        let documents = stmt
            .query_map([], Self::row_to_document)
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;

        Ok(documents)
    }

    fn delete_document(&mut self, id: i64) -> Result<()> {
        let deleted = self
            .conn
            .execute("DELETE FROM documents WHERE id = ?", params![id])
            .map_err(StorageError::from)?;

        if deleted == 0 {
            return Err(StorageError::DocumentNotFound {
                identifier: id.to_string(),
            }
            .into());
        }
        Ok(())
    }

    fn load_snippets(&self, embedding_model: &str) -> Result<Vec<Snippet>> {
        let mut stmt = self
            .conn
            .prepare(
                r"
            SELECT s.id, s.document_id, d.name, s.content, s.chunk_index, s.embedding
            FROM snippets s
            JOIN documents d ON d.id = s.document_id
            WHERE d.embedding_model = ?
            ORDER BY s.document_id, s.chunk_index
        ",
            )
            .map_err(StorageError::from)?;

        let snippets = stmt
            .query_map(params![embedding_model], |row| {
                let bytes: Vec<u8> = row.get(5)?;
                Ok(Snippet {
                    id: row.get(0)?,
                    document_id: row.get(1)?,
                    source: row.get(2)?,
                    text: row.get(3)?,
                    position: row.get::<_, i64>(4)? as usize,
                    embedding: decode_embedding(&bytes),
                })
            })
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(StorageError::from)?;

        Ok(snippets)
    }

    fn stats(&self) -> Result<StorageStats> {
        let (document_count, total_size): (i64, i64) = self
            .conn
            .query_row(
                "SELECT COUNT(*), COALESCE(SUM(size), 0) FROM documents",
                [],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .map_err(StorageError::from)?;

        let snippet_count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM snippets", [], |row| row.get(0))
            .map_err(StorageError::from)?;

        let mut stmt = self
            .conn
            .prepare("SELECT DISTINCT embedding_model FROM documents ORDER BY embedding_model")
            .map_err(StorageError::from)?;
        let embedding_models = stmt
            .query_map([], |row| row.get(0))
            .map_err(StorageError::from)?
            .collect::<std::result::Result<Vec<String>, _>>()
            .map_err(StorageError::from)?;

        let schema_version = self.get_schema_version()?.unwrap_or(0);

        let db_size = self
            .path
            .as_ref()
            .and_then(|p| std::fs::metadata(p).ok().map(|m| m.len()));

        Ok(StorageStats {
            document_count: document_count as usize,
            snippet_count: snippet_count as usize,
            total_content_size: total_size as usize,
            embedding_models,
            schema_version,
            db_size,
        })
    }
}

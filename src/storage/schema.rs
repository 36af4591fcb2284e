//! Database schema definitions.

/// Current schema version.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

/// SQL schema for initial database setup.
pub const SCHEMA_SQL: &str = r"
-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_info (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
);

-- Indexed reference documents (metadata only; text lives in snippets)
CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL,
    source TEXT NOT NULL,
    content_hash TEXT NOT NULL,
    size INTEGER NOT NULL,
    chunk_count INTEGER NOT NULL,
    embedding_model TEXT NOT NULL,
    created_at INTEGER NOT NULL
);

-- Index for document lookup by name
CREATE INDEX IF NOT EXISTS idx_documents_name ON documents(name);

-- One document per content hash (deduplication)
CREATE UNIQUE INDEX IF NOT EXISTS idx_documents_hash ON documents(content_hash);

-- Embedded chunks of documents
CREATE TABLE IF NOT EXISTS snippets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    document_id INTEGER NOT NULL,
    content TEXT NOT NULL,
    byte_start INTEGER NOT NULL,
    byte_end INTEGER NOT NULL,
    chunk_index INTEGER NOT NULL,
    embedding BLOB NOT NULL,  -- f32 array, little-endian
    dimensions INTEGER NOT NULL,
    FOREIGN KEY (document_id) REFERENCES documents(id) ON DELETE CASCADE
);

-- Index for snippet ordering within a document
CREATE INDEX IF NOT EXISTS idx_snippets_order ON snippets(document_id, chunk_index);
";

/// SQL to check if schema is initialized.
pub const CHECK_SCHEMA_SQL: &str = r"
SELECT COUNT(*) FROM sqlite_master
WHERE type='table' AND name='schema_info';
";

/// SQL to get schema version.
pub const GET_VERSION_SQL: &str = r"
SELECT value FROM schema_info WHERE key = 'version';
";

/// SQL to set schema version.
pub const SET_VERSION_SQL: &str = r"
INSERT OR REPLACE INTO schema_info (key, value) VALUES ('version', ?);
";

/// Encodes an embedding as little-endian `f32` bytes.
#[must_use]
pub fn encode_embedding(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Decodes little-endian `f32` bytes. Trailing partial values are ignored.
#[must_use]
pub fn decode_embedding(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect()
}

//! Indexed reference documents.
//!
//! A document is a `.txt` or `.md` file (or uploaded text) that has been
//! chunked and embedded into the snippet index. Only metadata is kept here;
//! the text lives in its snippets.

use super::chunk::current_timestamp;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

/// File extensions accepted for indexing.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["txt", "md"];

/// Metadata of an indexed document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier (assigned by storage layer).
    pub id: Option<i64>,

    /// Display name (file name for files, caller-chosen for uploads).
    pub name: String,

    /// Source path or `upload` for documents posted over HTTP.
    pub source: String,

    /// Size of the original text in bytes.
    pub size: usize,

    /// SHA-256 of the original text, used for deduplication.
    pub content_hash: String,

    /// Number of snippets created from this document.
    pub chunk_count: usize,

    /// Embedding model used for the snippet vectors.
    pub embedding_model: String,

    /// Unix timestamp when the document was indexed.
    pub created_at: i64,
}

impl Document {
    /// Creates document metadata for `content`.
    #[must_use]
    pub fn new(name: &str, source: &str, content: &str, embedding_model: &str) -> Self {
        Self {
            id: None,
            name: name.to_string(),
            source: source.to_string(),
            size: content.len(),
            content_hash: content_hash(content),
            chunk_count: 0,
            embedding_model: embedding_model.to_string(),
            created_at: current_timestamp(),
        }
    }
}

/// Computes the hex SHA-256 digest of a document's text.
#[must_use]
pub fn content_hash(content: &str) -> String {
    let digest = Sha256::digest(content.as_bytes());
    digest.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

/// Returns true if `name` has a supported extension (case-insensitive).
#[must_use]
pub fn is_supported(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|s| s.eq_ignore_ascii_case(ext))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("notes.txt", true)]
    #[test_case("README.MD", true)]
    #[test_case("resume.pdf", false)]
    #[test_case("archive.tar.md", true)]
    #[test_case("Makefile", false)]
    fn test_is_supported(name: &str, expected: bool) {
        assert_eq!(is_supported(name), expected);
    }

    #[test]
    fn test_content_hash_stable() {
        let a = content_hash("hello");
        assert_eq!(a.len(), 64);
        assert_eq!(a, content_hash("hello"));
        assert_ne!(a, content_hash("hello!"));
        assert_eq!(
            a,
            "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824"
        );
    }

    #[test]
    fn test_document_new() {
        let doc = Document::new("cv.md", "/tmp/cv.md", "Rust, SQL", "hash");
        assert!(doc.id.is_none());
        assert_eq!(doc.size, 9);
        assert_eq!(doc.chunk_count, 0);
        assert_eq!(doc.embedding_model, "hash");
    }
}

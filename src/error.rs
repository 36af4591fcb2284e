//! Error types for interview-coach operations.
//!
//! This module provides the error hierarchy using `thiserror` for
//! configuration, hosted model calls, retrieval, storage, sessions and
//! CLI commands.

use thiserror::Error;

/// Result type alias for interview-coach operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors (fatal at startup).
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Chat model errors (transient, surfaced to the user).
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Embedding service errors (degraded mode during retrieval).
    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Storage-related errors (database operations).
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Chunking-related errors (text processing).
    #[error("chunking error: {0}")]
    Chunking(#[from] ChunkingError),

    /// I/O errors (file operations).
    #[error("I/O error: {0}")]
    Io(#[from] IoError),

    /// Conversation session errors.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// CLI command errors.
    #[error("command error: {0}")]
    Command(#[from] CommandError),
}

impl Error {
    /// Returns whether retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        match self {
            Self::Model(err) => err.is_retryable(),
            Self::Embedding(EmbeddingError::Service(_)) | Self::Session(SessionError::Busy) => {
                true
            }
            _ => false,
        }
    }
}

/// Configuration errors. Operator errors, never retried.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// A required environment variable is missing or blank.
    #[error("{name} is not set; add it to the environment or .env file")]
    MissingVar {
        /// Variable name.
        name: String,
    },

    /// A variable is present but unusable.
    #[error("invalid value for {name}: {reason}")]
    InvalidValue {
        /// Variable name.
        name: String,
        /// Why the value was rejected.
        reason: String,
    },

    /// The question bank file could not be loaded.
    #[error("question bank {path}: {reason}")]
    QuestionBank {
        /// Path of the question bank file.
        path: String,
        /// Reason for failure.
        reason: String,
    },
}

/// Errors from the hosted chat-completion API.
#[derive(Error, Debug)]
pub enum ModelError {
    /// Provider rejected the request due to rate or quota limits.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Credentials were rejected.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// Connection, DNS or timeout failure.
    #[error("network failure: {0}")]
    Network(String),

    /// Provider returned an error response.
    #[error("API error: {0}")]
    Api(String),

    /// The response stream broke off.
    #[error("stream interrupted: {0}")]
    Stream(String),

    /// The request could not be built.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The model produced no text.
    #[error("model returned an empty response")]
    EmptyResponse,
}

impl ModelError {
    /// Returns whether the user may simply retry.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::RateLimited(_) | Self::Network(_) | Self::Stream(_) | Self::EmptyResponse
        )
    }
}

/// Errors from embedding generation.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Embedding service unreachable or failed.
    #[error("embedding service failed: {0}")]
    Service(String),

    /// Service returned a different number of vectors than requested.
    #[error("expected {expected} embeddings, got {actual}")]
    CountMismatch {
        /// Number of inputs sent.
        expected: usize,
        /// Number of vectors received.
        actual: usize,
    },

    /// Query vector does not match the index dimensions.
    #[error("embedding dimension {actual} does not match index dimension {expected}")]
    DimensionMismatch {
        /// Dimension of indexed snippets.
        expected: usize,
        /// Dimension of the query vector.
        actual: usize,
    },
}

/// Storage-specific errors for database operations.
#[derive(Error, Debug)]
pub enum StorageError {
    /// Database connection or query error.
    #[error("database error: {0}")]
    Database(String),

    /// Document not found by ID or name.
    #[error("document not found: {identifier}")]
    DocumentNotFound {
        /// Document ID or name that was not found.
        identifier: String,
    },

    /// A document with identical content is already indexed.
    #[error("document already indexed as '{name}'")]
    DuplicateDocument {
        /// Name of the existing document.
        name: String,
    },

    /// Schema migration error.
    #[error("migration error: {0}")]
    Migration(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Chunking-specific errors for text processing.
#[derive(Error, Debug)]
pub enum ChunkingError {
    /// Invalid UTF-8 encountered at specific byte offset.
    #[error("invalid UTF-8 at byte offset {offset}")]
    InvalidUtf8 {
        /// Byte offset where invalid UTF-8 was found.
        offset: usize,
    },

    /// Chunk size exceeds maximum allowed.
    #[error("chunk size {size} exceeds maximum {max}")]
    ChunkTooLarge {
        /// Actual chunk size.
        size: usize,
        /// Maximum allowed size.
        max: usize,
    },

    /// Invalid chunk configuration.
    #[error("invalid chunk configuration: {reason}")]
    InvalidConfig {
        /// Reason the configuration is invalid.
        reason: String,
    },

    /// Overlap exceeds chunk size.
    #[error("overlap {overlap} must be less than chunk size {size}")]
    OverlapTooLarge {
        /// Overlap size.
        overlap: usize,
        /// Chunk size.
        size: usize,
    },
}

/// I/O-specific errors for file operations.
#[derive(Error, Debug)]
pub enum IoError {
    /// File not found.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path to the file that was not found.
        path: String,
    },

    /// Failed to read file.
    #[error("failed to read file: {path}: {reason}")]
    ReadFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Memory mapping error.
    #[error("memory mapping failed: {path}: {reason}")]
    MmapFailed {
        /// Path to the file.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Directory creation error.
    #[error("failed to create directory: {path}: {reason}")]
    DirectoryFailed {
        /// Path to the directory.
        path: String,
        /// Reason for failure.
        reason: String,
    },

    /// Document type the loader cannot read.
    #[error("unsupported document type: {name} (expected .txt or .md)")]
    UnsupportedFormat {
        /// File or document name.
        name: String,
    },

    /// Document has no text to index.
    #[error("document is empty: {name}")]
    EmptyDocument {
        /// File or document name.
        name: String,
    },

    /// Generic I/O error wrapper.
    #[error("I/O error: {0}")]
    Generic(String),
}

/// Conversation session errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SessionError {
    /// No session with this ID.
    #[error("session not found: {id}")]
    NotFound {
        /// Requested session ID.
        id: String,
    },

    /// A turn is already awaiting a response.
    #[error("a response is still in progress for this session")]
    Busy,

    /// Message was empty after trimming.
    #[error("message is empty")]
    EmptyMessage,

    /// The turn was cancelled before completion.
    #[error("turn cancelled")]
    Cancelled,
}

/// CLI command-specific errors.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Invalid argument provided.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Command execution failed.
    #[error("command execution failed: {0}")]
    ExecutionFailed(String),
}

// Implement From traits for library errors

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(IoError::Generic(err.to_string()))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Self::Storage(StorageError::Database(err.to_string()))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<regex::Error> for Error {
    fn from(err: regex::Error) -> Self {
        Self::Config(ConfigError::InvalidValue {
            name: "keyword pattern".to_string(),
            reason: err.to_string(),
        })
    }
}

impl From<std::string::FromUtf8Error> for ChunkingError {
    fn from(err: std::string::FromUtf8Error) -> Self {
        Self::InvalidUtf8 {
            offset: err.utf8_error().valid_up_to(),
        }
    }
}

impl From<async_openai::error::OpenAIError> for ModelError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        use async_openai::error::OpenAIError;

        match err {
            OpenAIError::ApiError(api) => {
                let code = api.code.as_deref().unwrap_or_default();
                let kind = api.r#type.as_deref().unwrap_or_default();
                if code == "rate_limit_exceeded"
                    || code == "insufficient_quota"
                    || kind == "requests"
                    || kind == "tokens"
                {
                    Self::RateLimited(api.message)
                } else if code == "invalid_api_key" {
                    Self::Unauthorized(api.message)
                } else {
                    Self::Api(api.message)
                }
            }
            OpenAIError::Reqwest(e) => {
                if e.status().is_some_and(|s| s.as_u16() == 429) {
                    Self::RateLimited(e.to_string())
                } else if e.status().is_some_and(|s| s.as_u16() == 401) {
                    Self::Unauthorized(e.to_string())
                } else {
                    Self::Network(e.to_string())
                }
            }
            OpenAIError::StreamError(message) => match stream_status(&message) {
                Some(401 | 403) => Self::Unauthorized(message),
                Some(429) => Self::RateLimited(message),
                Some(400..=499) => Self::Api(message),
                _ => Self::Stream(message),
            },
            OpenAIError::InvalidArgument(message) => Self::InvalidRequest(message),
            other => Self::Api(other.to_string()),
        }
    }
}

/// Extracts the HTTP status from a stream error such as
/// `Invalid status code: 401 Unauthorized`.
fn stream_status(message: &str) -> Option<u16> {
    let (_, rest) = message.split_once("status code:")?;
    rest.split_whitespace().next()?.parse().ok()
}

impl From<async_openai::error::OpenAIError> for EmbeddingError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        Self::Service(err.to_string())
    }
}

impl From<async_openai::error::OpenAIError> for Error {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        Self::Model(err.into())
    }
}

//! Storage layer.
//!
//! Persists indexed documents and their embedded snippets in `SQLite`, so
//! the index survives restarts and can be managed from the CLI.

pub mod schema;
pub mod sqlite;
pub mod traits;

pub use schema::{CURRENT_SCHEMA_VERSION, SCHEMA_SQL};
pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageStats};

/// Default database path relative to the working directory.
pub const DEFAULT_DB_PATH: &str = ".interview/index.db";

//! # Interview Coach
//!
//! Interview rehearsal assistant backed by a hosted chat model.
//!
//! Candidates index their resumes and study notes, then chat through a
//! browser page. The coach asks questions about requested topics, reviews
//! answers, and summarizes weak spots. Each turn is grounded on the
//! candidate's own documents and on a keyword-triggered question bank.
//!
//! ## Features
//!
//! - **Retrieval**: top-k cosine search over embedded document snippets
//! - **`SQLite` Storage**: the document index survives restarts
//! - **Streaming**: replies stream to the browser as server-sent events
//! - **Sessions**: one turn in flight per session, cancellable, with
//!   history rolled back on failure

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
// Note: unsafe is needed for memory-mapped I/O (memmap2)
#![warn(unsafe_code)]

pub mod chunking;
pub mod cli;
pub mod config;
pub mod core;
pub mod embedding;
pub mod error;
pub mod io;
pub mod llm;
pub mod logging;
pub mod prompt;
pub mod retrieval;
pub mod server;
pub mod session;
pub mod storage;

#[cfg(test)]
mod testing;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

pub use config::Config;

// Re-export core domain types
pub use core::{Chunk, Document, History, Role, ScoredSnippet, Snippet, Turn};

// Re-export storage types
pub use storage::{DEFAULT_DB_PATH, SqliteStorage, Storage};

// Re-export chunking types
pub use chunking::{Chunker, FixedChunker};

// Re-export CLI types
pub use cli::{Cli, Commands, OutputFormat};

// Re-export embedding and model types
pub use embedding::{Embedder, FallbackEmbedder, cosine_similarity, create_embedder};
pub use llm::{ChatModel, Message, MessageRole, Prompt, TokenStream, create_chat_model};

// Re-export conversation types
pub use prompt::QuestionBank;
pub use retrieval::{DEFAULT_TOP_K, Indexer, Retriever, SnippetIndex};
pub use session::{Intent, Orchestrator, Session, SessionStore, TurnEvent, TurnSettings};

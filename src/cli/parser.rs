//! Command-line argument parsing.
//!
//! Defines the CLI structure using clap derive macros.

use crate::chunking::{DEFAULT_CHUNK_SIZE, DEFAULT_OVERLAP};
use crate::retrieval::DEFAULT_TOP_K;
use crate::server::{DEFAULT_HOST, DEFAULT_PORT};
use crate::session::DEFAULT_IDLE_MINUTES;
use crate::session::orchestrator::DEFAULT_HISTORY_WINDOW;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Interview Coach: rehearse technical interviews against your own documents.
///
/// Index resumes and notes, then serve a chat page where a hosted model asks
/// questions, gives feedback and summarizes weak spots.
#[derive(Parser, Debug)]
#[command(name = "interview-coach")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the document index database.
    ///
    /// Defaults to `.interview/index.db` in the current directory.
    #[arg(short, long, env = "INTERVIEW_DB_PATH", global = true)]
    pub db_path: Option<PathBuf>,

    /// Enable verbose (debug) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format (text, json).
    #[arg(long, default_value = "text", global = true)]
    pub format: String,

    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the chat UI and API.
    ///
    /// Requires `OPENAI_API_KEY`; fails before binding if it is missing.
    Serve {
        /// Port to listen on.
        #[arg(short, long, env = "PORT", default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Address to bind.
        #[arg(long, env = "HOST", default_value = DEFAULT_HOST)]
        host: String,

        /// JSON question bank replacing the built-in one.
        #[arg(long, env = "QUESTION_BANK")]
        question_bank: Option<PathBuf>,

        /// Only retrieve context when a question-bank topic matches.
        #[arg(long)]
        no_augment: bool,

        /// Snippets added to each prompt.
        #[arg(short = 'k', long, default_value_t = DEFAULT_TOP_K)]
        top_k: usize,

        /// Prior exchanges (message plus reply) included in each prompt.
        #[arg(long, default_value_t = DEFAULT_HISTORY_WINDOW)]
        history_window: usize,

        /// Minutes before an idle chat session is discarded.
        #[arg(long, env = "SESSION_IDLE_MINUTES", default_value_t = DEFAULT_IDLE_MINUTES,
              value_parser = clap::value_parser!(u64).range(1..))]
        idle_minutes: u64,
    },

    /// Index `.txt` or `.md` documents.
    Index {
        /// Files to index.
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Chunk size in bytes.
        #[arg(long, default_value_t = DEFAULT_CHUNK_SIZE)]
        chunk_size: usize,

        /// Overlap between chunks in bytes.
        #[arg(long, default_value_t = DEFAULT_OVERLAP)]
        overlap: usize,
    },

    /// List indexed documents.
    #[command(alias = "ls")]
    List,

    /// Remove an indexed document.
    #[command(alias = "rm")]
    Remove {
        /// Document ID or name.
        document: String,

        /// Skip confirmation prompt.
        #[arg(short = 'y', long)]
        yes: bool,
    },

    /// Show index status.
    Status,

    /// Delete every indexed document.
    Reset {
        /// Skip confirmation prompt.
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

impl Cli {
    /// Returns the database path, using the default if not specified.
    #[must_use]
    pub fn get_db_path(&self) -> PathBuf {
        self.db_path
            .clone()
            .unwrap_or_else(|| PathBuf::from(crate::storage::DEFAULT_DB_PATH))
    }
}

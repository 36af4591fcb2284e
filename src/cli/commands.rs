//! CLI command implementations.
//!
//! Contains the business logic for each CLI command.

use crate::chunking::traits::validate;
use crate::chunking::{FixedChunker, MAX_CHUNK_SIZE};
use crate::cli::output::{
    OutputFormat, format_document_list, format_indexed, format_message, format_status,
};
use crate::cli::parser::{Cli, Commands};
use crate::config::Config;
use crate::embedding::create_embedder;
use crate::error::{CommandError, Result, StorageError};
use crate::llm::{DEFAULT_TEMPERATURE, create_chat_model};
use crate::prompt::QuestionBank;
use crate::retrieval::{Indexer, Retriever};
use crate::server::{self, AppState};
use crate::session::{DEFAULT_IDLE_TIMEOUT, Orchestrator, SessionStore, TurnSettings};
use crate::storage::{SqliteStorage, Storage};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Options for `serve`.
#[derive(Debug, Clone)]
pub struct ServeOptions {
    /// Listen address.
    pub host: String,
    /// Listen port.
    pub port: u16,
    /// Question bank override.
    pub question_bank: Option<PathBuf>,
    /// Per-turn settings.
    pub settings: TurnSettings,
    /// Idle time before a session is discarded.
    pub idle_timeout: Duration,
}

/// Executes the CLI command.
///
/// # Arguments
///
/// * `cli` - Parsed CLI arguments.
///
/// # Returns
///
/// Result with output string on success.
///
/// # Errors
///
/// Returns an error if the command fails to execute.
pub async fn execute(cli: &Cli) -> Result<String> {
    let format = OutputFormat::parse(&cli.format);
    let db_path = cli.get_db_path();

    match &cli.command {
        Commands::Serve {
            port,
            host,
            question_bank,
            no_augment,
            top_k,
            history_window,
            idle_minutes,
        } => {
            let options = ServeOptions {
                host: host.clone(),
                port: *port,
                question_bank: question_bank.clone(),
                settings: TurnSettings {
                    top_k: *top_k,
                    history_window: *history_window,
                    always_augment: !no_augment,
                    ..TurnSettings::default()
                },
                idle_timeout: Duration::from_secs(idle_minutes.saturating_mul(60)),
            };
            cmd_serve(&db_path, &options).await
        }
        Commands::Index {
            files,
            chunk_size,
            overlap,
        } => cmd_index(&db_path, files, *chunk_size, *overlap, format).await,
        Commands::List => cmd_list(&db_path, format),
        Commands::Remove { document, yes } => cmd_remove(&db_path, document, *yes, format),
        Commands::Status => cmd_status(&db_path, format),
        Commands::Reset { yes } => cmd_reset(&db_path, *yes, format),
    }
}

/// Builds the server state: configuration first, so a missing API key
/// fails before the database is touched or a port is bound.
///
/// # Errors
///
/// Returns a configuration error for missing or invalid settings, or an
/// error if the question bank or document index cannot be opened.
pub fn build_app_state(db_path: &Path, options: &ServeOptions) -> Result<AppState> {
    let config = Config::from_env()?;
    build_app_state_with(&config, db_path, options)
}

/// Like [`build_app_state`] with an explicit configuration.
///
/// # Errors
///
/// Returns an error if the question bank or document index cannot be opened.
pub fn build_app_state_with(
    config: &Config,
    db_path: &Path,
    options: &ServeOptions,
) -> Result<AppState> {
    let bank = Arc::new(QuestionBank::load(options.question_bank.as_deref())?);
    let indexer = Arc::new(open_indexer(config, db_path, FixedChunker::new())?);
    let retriever = Retriever::new(
        Arc::clone(indexer.embedder()),
        Arc::clone(indexer.index()),
    );
    let model = create_chat_model(config, DEFAULT_TEMPERATURE);

    info!(
        model = %config.model,
        embedding = %config.embedding_model,
        topics = bank.len(),
        snippets = indexer.index().len(),
        "interview coach ready"
    );

    Ok(AppState {
        orchestrator: Orchestrator::new(model, retriever, bank, options.settings),
        sessions: SessionStore::new().with_idle_timeout(options.idle_timeout),
        indexer,
        model: config.model.clone(),
    })
}

async fn cmd_serve(db_path: &Path, options: &ServeOptions) -> Result<String> {
    let state = build_app_state(db_path, options)?;
    server::run(state, &options.host, options.port).await?;
    Ok(String::new())
}

async fn cmd_index(
    db_path: &Path,
    files: &[PathBuf],
    chunk_size: usize,
    overlap: usize,
    format: OutputFormat,
) -> Result<String> {
    validate(chunk_size, overlap, MAX_CHUNK_SIZE)?;
    let config = Config::from_env()?;
    let indexer = open_indexer(
        &config,
        db_path,
        FixedChunker::with_size_and_overlap(chunk_size, overlap),
    )?;

    let mut indexed = Vec::with_capacity(files.len());
    for file in files {
        indexed.push(indexer.index_file(file).await?);
    }
    Ok(format_indexed(&indexed, format))
}

fn cmd_list(db_path: &Path, format: OutputFormat) -> Result<String> {
    let storage = open_storage(db_path)?;
    let documents = storage.list_documents()?;
    Ok(format_document_list(&documents, format))
}

fn cmd_remove(db_path: &Path, identifier: &str, yes: bool, format: OutputFormat) -> Result<String> {
    if !yes {
        return Err(
            CommandError::ExecutionFailed("Use --yes to confirm removal.".to_string()).into(),
        );
    }

    let mut storage = open_storage(db_path)?;
    let document =
        storage
            .find_document(identifier)?
            .ok_or_else(|| StorageError::DocumentNotFound {
                identifier: identifier.to_string(),
            })?;
    storage.delete_document(document.id.unwrap_or_default())?;

    Ok(format_message(
        &format!("Removed document: {}", document.name),
        format,
    ))
}

fn cmd_status(db_path: &Path, format: OutputFormat) -> Result<String> {
    let storage = open_storage(db_path)?;
    let stats = storage.stats()?;
    Ok(format_status(&stats, format))
}

fn cmd_reset(db_path: &Path, yes: bool, format: OutputFormat) -> Result<String> {
    if !yes {
        return Err(CommandError::ExecutionFailed(
            "Use --yes to confirm reset. This will delete all indexed documents.".to_string(),
        )
        .into());
    }

    let mut storage = open_storage(db_path)?;
    storage.reset()?;
    Ok(format_message("Document index reset.", format))
}

fn open_storage(db_path: &Path) -> Result<SqliteStorage> {
    let mut storage = SqliteStorage::open(db_path)?;
    storage.init()?;
    Ok(storage)
}

fn open_indexer(config: &Config, db_path: &Path, chunker: FixedChunker) -> Result<Indexer> {
    Indexer::open(
        Box::new(SqliteStorage::open(db_path)?),
        create_embedder(config),
        chunker,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{API_KEY_VAR, EMBEDDING_VAR, HASH_EMBEDDING_MODEL};
    use crate::error::Error;
    use tempfile::TempDir;

    fn hash_config() -> Config {
        Config::from_lookup(|name| match name {
            n if n == API_KEY_VAR => Some("sk-test".to_string()),
            n if n == EMBEDDING_VAR => Some(HASH_EMBEDDING_MODEL.to_string()),
            _ => None,
        })
        .unwrap()
    }

    fn options() -> ServeOptions {
        ServeOptions {
            host: "127.0.0.1".to_string(),
            port: 0,
            question_bank: None,
            settings: TurnSettings::default(),
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }

    #[test]
    fn test_remove_and_reset_require_confirmation() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("index.db");
        assert!(matches!(
            cmd_remove(&db, "a.md", false, OutputFormat::Text),
            Err(Error::Command(CommandError::ExecutionFailed(_)))
        ));
        assert!(matches!(
            cmd_reset(&db, false, OutputFormat::Text),
            Err(Error::Command(CommandError::ExecutionFailed(_)))
        ));
    }

    #[test]
    fn test_list_and_status_on_fresh_index() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("nested/index.db");
        assert_eq!(
            cmd_list(&db, OutputFormat::Text).unwrap(),
            "No documents indexed.\n"
        );
        assert!(
            cmd_status(&db, OutputFormat::Text)
                .unwrap()
                .contains("Documents:     0")
        );
    }

    #[tokio::test]
    async fn test_app_state_serves_indexed_documents() {
        let dir = TempDir::new().unwrap();
        let db = dir.path().join("index.db");
        {
            let indexer = open_indexer(&hash_config(), &db, FixedChunker::new()).unwrap();
            indexer
                .index_text("notes.md", "notes.md", "A hash map maps keys to values.")
                .await
                .unwrap();
        }

        let state = build_app_state_with(&hash_config(), &db, &options()).unwrap();
        assert_eq!(state.indexer.index().len(), 1);
        assert_eq!(state.model, crate::config::DEFAULT_MODEL);
        assert_eq!(state.sessions.idle_timeout(), DEFAULT_IDLE_TIMEOUT);

        assert!(
            cmd_remove(&db, "notes.md", true, OutputFormat::Text)
                .unwrap()
                .contains("Removed document: notes.md")
        );
    }

    #[test]
    fn test_bad_question_bank_fails_startup() {
        let dir = TempDir::new().unwrap();
        let bank = dir.path().join("bank.json");
        std::fs::write(&bank, "not json").unwrap();
        let options = ServeOptions {
            question_bank: Some(bank),
            ..options()
        };
        assert!(matches!(
            build_app_state_with(&hash_config(), &dir.path().join("index.db"), &options),
            Err(Error::Config(_))
        ));
    }
}

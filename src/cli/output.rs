//! Output formatting for CLI commands.
//!
//! Supports text and JSON output formats.

use crate::core::Document;
use crate::error::Error;
use crate::io::truncate_graphemes;
use crate::storage::StorageStats;
use serde::Serialize;
use serde_json::json;
use std::fmt::Write;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output.
    Text,
    /// JSON output.
    Json,
}

impl OutputFormat {
    /// Parses format from string.
    #[must_use]
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "json" => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Formats index status.
#[must_use]
pub fn format_status(stats: &StorageStats, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_status_text(stats),
        OutputFormat::Json => format_json(stats),
    }
}

fn format_status_text(stats: &StorageStats) -> String {
    let mut output = String::new();
    output.push_str("Interview Coach Index\n");
    output.push_str("=====================\n\n");
    let _ = writeln!(output, "  Documents:     {}", stats.document_count);
    let _ = writeln!(output, "  Snippets:      {}", stats.snippet_count);
    let _ = writeln!(
        output,
        "  Content size:  {}",
        format_size(as_u64(stats.total_content_size))
    );
    let models = if stats.embedding_models.is_empty() {
        "-".to_string()
    } else {
        stats.embedding_models.join(", ")
    };
    let _ = writeln!(output, "  Embeddings:    {models}");
    let _ = writeln!(output, "  Schema:        v{}", stats.schema_version);
    if let Some(size) = stats.db_size {
        let _ = writeln!(output, "  DB size:       {}", format_size(size));
    }
    output
}

/// Formats a document list.
#[must_use]
pub fn format_document_list(documents: &[Document], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format_document_list_text(documents),
        OutputFormat::Json => format_json(&documents),
    }
}

fn format_document_list_text(documents: &[Document]) -> String {
    if documents.is_empty() {
        return "No documents indexed.\n".to_string();
    }

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<6} {:<28} {:<10} {:<9} Model",
        "ID", "Name", "Size", "Snippets"
    );
    output.push_str(&"-".repeat(72));
    output.push('\n');

    for doc in documents {
        let id = doc.id.map_or_else(|| "-".to_string(), |i| i.to_string());
        let _ = writeln!(
            output,
            "{:<6} {:<28} {:<10} {:<9} {}",
            id,
            truncate(&doc.name, 28),
            format_size(as_u64(doc.size)),
            doc.chunk_count,
            doc.embedding_model
        );
    }

    output
}

/// Formats the result of indexing files.
#[must_use]
pub fn format_indexed(documents: &[Document], format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => {
            let mut output = String::new();
            for doc in documents {
                let _ = writeln!(
                    output,
                    "Indexed {} ({} snippets, {})",
                    doc.name,
                    doc.chunk_count,
                    format_size(as_u64(doc.size))
                );
            }
            output
        }
        OutputFormat::Json => format_json(&documents),
    }
}

/// Formats a one-line confirmation.
#[must_use]
pub fn format_message(message: &str, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => format!("{message}\n"),
        OutputFormat::Json => format_json(&json!({ "message": message })),
    }
}

/// Formats an error for display.
#[must_use]
pub fn format_error(error: &Error, format: OutputFormat) -> String {
    match format {
        OutputFormat::Text => error.to_string(),
        OutputFormat::Json => format_json(&json!({
            "error": error.to_string(),
            "retryable": error.is_retryable(),
        })),
    }
}

/// Formats a value as JSON.
fn format_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

fn as_u64(n: usize) -> u64 {
    u64::try_from(n).unwrap_or(u64::MAX)
}

/// Formats a byte size as human-readable.
#[allow(clippy::cast_precision_loss)]
fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Truncates to `max` graphemes with an ellipsis.
fn truncate(s: &str, max: usize) -> String {
    if truncate_graphemes(s, max).len() == s.len() {
        return s.to_string();
    }
    format!("{}...", truncate_graphemes(s, max.saturating_sub(3)))
}

//! Process configuration.
//!
//! Credentials and model names come from the environment, optionally seeded
//! from a `.env` file. The record is built once at startup and shared
//! read-only (behind `Arc`) by every component.

use crate::error::{ConfigError, Result};
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use backoff::ExponentialBackoffBuilder;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

/// Environment variable holding the hosted API key (required).
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Environment variable selecting the chat model.
pub const MODEL_VAR: &str = "MODEL";

/// Environment variable selecting the embedding model.
pub const EMBEDDING_VAR: &str = "EMBEDDING";

/// Environment variable overriding the API base URL.
pub const API_BASE_VAR: &str = "OPENAI_BASE_URL";

/// Default chat-completion model.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default embedding model.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

/// `EMBEDDING` value selecting the offline lexical embedder.
pub const HASH_EMBEDDING_MODEL: &str = "hash";

/// Immutable runtime configuration.
///
/// `Debug` redacts the API key.
#[derive(Clone, PartialEq, Eq)]
pub struct Config {
    /// Hosted API key.
    pub api_key: String,
    /// Chat-completion model name.
    pub model: String,
    /// Embedding model name.
    pub embedding_model: String,
    /// Optional OpenAI-compatible base URL.
    pub api_base: Option<String>,
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingVar`] when `OPENAI_API_KEY` is absent or
    /// blank, and [`ConfigError::InvalidValue`] for malformed optional values.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = value(API_KEY_VAR).ok_or_else(|| ConfigError::MissingVar {
            name: API_KEY_VAR.to_string(),
        })?;

        let model = value(MODEL_VAR).unwrap_or_else(|| DEFAULT_MODEL.to_string());
        let embedding_model =
            value(EMBEDDING_VAR).unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());

        let api_base = value(API_BASE_VAR);
        if let Some(base) = &api_base
            && !(base.starts_with("http://") || base.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue {
                name: API_BASE_VAR.to_string(),
                reason: format!("'{base}' is not an http(s) URL"),
            }
            .into());
        }

        Ok(Self {
            api_key,
            model,
            embedding_model,
            api_base,
        })
    }

    /// Returns whether the offline lexical embedder is selected.
    #[must_use]
    pub fn uses_hash_embeddings(&self) -> bool {
        self.embedding_model.eq_ignore_ascii_case(HASH_EMBEDDING_MODEL)
    }

    /// Builds the client configuration for the hosted API.
    #[must_use]
    pub fn openai(&self) -> OpenAIConfig {
        let config = OpenAIConfig::new().with_api_key(self.api_key.clone());
        match &self.api_base {
            Some(base) => config.with_api_base(base.clone()),
            None => config,
        }
    }
}

impl Config {
    /// Builds an API client that makes a single attempt per request.
    ///
    /// Failures, including 429 responses, surface to the caller at once
    /// instead of entering the client's own retry loop.
    #[must_use]
    pub fn client(&self) -> Client<OpenAIConfig> {
        let single_attempt = ExponentialBackoffBuilder::new()
            .with_max_elapsed_time(Some(Duration::ZERO))
            .build();
        Client::with_config(self.openai()).with_backoff(single_attempt)
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("embedding_model", &self.embedding_model)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Loads a `.env` file from the working directory (or a parent) if present.
///
/// Variables already set in the environment win over the file.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] if a `.env` file exists but cannot
/// be parsed.
pub fn load_dotenv() -> Result<Option<PathBuf>> {
    match dotenvy::dotenv() {
        Ok(path) => {
            debug!(path = %path.display(), "loaded .env");
            Ok(Some(path))
        }
        Err(err) if err.not_found() => Ok(None),
        Err(err) => Err(ConfigError::InvalidValue {
            name: ".env".to_string(),
            reason: err.to_string(),
        }
        .into()),
    }
}

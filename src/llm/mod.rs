//! Chat model abstraction.
//!
//! The orchestrator talks to a [`ChatModel`], which turns a [`Prompt`] into
//! a stream of text fragments. [`OpenAiChatModel`] is the hosted
//! implementation; tests substitute scripted models.

pub mod openai;

pub use openai::OpenAiChatModel;

use crate::config::Config;
use crate::core::{Role, Turn};
use crate::error::Result;
use async_trait::async_trait;
use futures_util::Stream;
use serde::Serialize;
use std::fmt;
use std::pin::Pin;
use std::sync::Arc;

/// Sampling temperature used for every request unless overridden.
pub const DEFAULT_TEMPERATURE: f32 = 0.0;

/// Incremental model output. Each item is a non-empty text fragment or the
/// error that ended the stream.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String>> + Send>>;

/// Author of a prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions and context.
    System,
    /// The candidate.
    User,
    /// Earlier model replies.
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::System => write!(f, "system"),
            Self::User => write!(f, "user"),
            Self::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message of a prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Author.
    pub role: MessageRole,
    /// Text.
    pub content: String,
}

impl Message {
    /// Creates a system message.
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Creates an assistant message.
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&Turn> for Message {
    fn from(turn: &Turn) -> Self {
        match turn.role {
            Role::User => Self::user(turn.text.clone()),
            Role::Assistant => Self::assistant(turn.text.clone()),
        }
    }
}

/// Ordered messages sent to the model for one turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Prompt {
    messages: Vec<Message>,
}

impl Prompt {
    /// Creates an empty prompt.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            messages: Vec::new(),
        }
    }

    /// Appends a message.
    pub fn push(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Returns the messages in order.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Number of messages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the prompt has no messages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether any message contains `needle`.
    #[must_use]
    pub fn contains(&self, needle: &str) -> bool {
        self.messages.iter().any(|m| m.content.contains(needle))
    }

    /// Last user message, if any.
    #[must_use]
    pub fn last_user(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == MessageRole::User)
            .map(|m| m.content.as_str())
    }
}

/// A chat-completion backend.
///
/// # Examples
///
/// ```
/// use async_trait::async_trait;
/// use futures_util::StreamExt;
/// use interview_coach::llm::{ChatModel, Prompt, TokenStream};
///
/// struct Echo;
///
/// #[async_trait]
/// impl ChatModel for Echo {
///     fn model(&self) -> &str {
///         "echo"
///     }
///
///     async fn stream(&self, prompt: &Prompt) -> interview_coach::Result<TokenStream> {
///         let text = prompt.last_user().unwrap_or_default().to_string();
///         Ok(Box::pin(futures_util::stream::iter(vec![Ok(text)])))
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut prompt = Prompt::new();
/// prompt.push(interview_coach::llm::Message::user("hello"));
/// let mut tokens = Echo.stream(&prompt).await.unwrap();
/// assert_eq!(tokens.next().await.unwrap().unwrap(), "hello");
/// # }
/// ```
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Model identifier, for logging.
    fn model(&self) -> &str;

    /// Starts generating a reply to `prompt`.
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::ModelError`] if the request cannot be
    /// started. Failures after the first fragment arrive through the stream.
    async fn stream(&self, prompt: &Prompt) -> Result<TokenStream>;
}

/// Creates the hosted chat model for `config`.
///
/// No network activity happens until the first request.
#[must_use]
pub fn create_chat_model(config: &Config, temperature: f32) -> Arc<dyn ChatModel> {
    Arc::new(OpenAiChatModel::new(config).with_temperature(temperature))
}

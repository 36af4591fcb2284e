//! Hosted chat-completion client.

use crate::config::Config;
use crate::error::{Error, ModelError, Result};
use crate::llm::{ChatModel, DEFAULT_TEMPERATURE, Message, MessageRole, Prompt, TokenStream};
use async_openai::Client;
use async_openai::config::OpenAIConfig;
use async_openai::error::OpenAIError;
use async_openai::types::{
    ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequest, CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::debug;

/// Chat model backed by an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiChatModel {
    /// Creates a client for the configured model.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            client: config.client(),
            model: config.model.clone(),
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    /// Sets the sampling temperature.
    #[must_use]
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Returns the sampling temperature.
    #[must_use]
    pub const fn temperature(&self) -> f32 {
        self.temperature
    }

    /// Builds the streaming request for `prompt`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidRequest`] if the request cannot be built.
    pub fn request(&self, prompt: &Prompt) -> Result<CreateChatCompletionRequest> {
        let messages = prompt
            .messages()
            .iter()
            .map(to_request_message)
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(ModelError::from)?;

        let request = CreateChatCompletionRequestArgs::default()
            .model(self.model.as_str())
            .messages(messages)
            .temperature(self.temperature)
            .stream(true)
            .build()
            .map_err(ModelError::from)?;
        Ok(request)
    }
}

fn to_request_message(
    message: &Message,
) -> std::result::Result<ChatCompletionRequestMessage, OpenAIError> {
    let content = message.content.as_str();
    Ok(match message.role {
        MessageRole::System => ChatCompletionRequestSystemMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::User => ChatCompletionRequestUserMessageArgs::default()
            .content(content)
            .build()?
            .into(),
        MessageRole::Assistant => ChatCompletionRequestAssistantMessageArgs::default()
            .content(content)
            .build()?
            .into(),
    })
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    fn model(&self) -> &str {
        &self.model
    }

    async fn stream(&self, prompt: &Prompt) -> Result<TokenStream> {
        let request = self.request(prompt)?;
        debug!(model = %self.model, messages = prompt.len(), "chat completion request");

        let responses = self
            .client
            .chat()
            .create_stream(request)
            .await
            .map_err(ModelError::from)?;

        let tokens = responses.filter_map(|item| async move {
            match item {
                Ok(response) => {
                    let text: String = response
                        .choices
                        .into_iter()
                        .filter_map(|choice| choice.delta.content)
                        .collect();
                    (!text.is_empty()).then_some(Ok(text))
                }
                Err(err) => Some(Err(Error::Model(ModelError::from(err)))),
            }
        });
        Ok(Box::pin(tokens))
    }
}

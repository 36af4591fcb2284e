//! Turn execution.
//!
//! A turn classifies the message, gathers context, streams the model reply
//! as [`TurnEvent`]s and commits the exchange to history only when the reply
//! completed. Every other outcome leaves history as it was.

use crate::core::ScoredSnippet;
use crate::error::{Error, ModelError, Result, SessionError};
use crate::io::preview;
use crate::llm::ChatModel;
use crate::prompt::{GENERAL_TOPIC, PromptParts, QuestionBank, build_prompt};
use crate::retrieval::{DEFAULT_TOP_K, Retriever};
use crate::session::{Intent, Session, TurnGuard, TurnTicket};
use futures_util::StreamExt;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, info, warn};

/// Default number of prior exchanges (user message plus reply) in a prompt.
pub const DEFAULT_HISTORY_WINDOW: usize = 20;

/// Default number of seed questions per matched topic.
pub const DEFAULT_SEEDS_PER_TOPIC: usize = 2;

/// Buffered events per turn before the producer waits for the client.
const EVENT_BUFFER: usize = 64;

/// Per-server turn settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnSettings {
    /// Snippets retrieved per turn.
    pub top_k: usize,
    /// Prior exchanges included in the prompt (summaries use all of them).
    pub history_window: usize,
    /// Retrieve context for every chat turn, not only when a topic matched.
    pub always_augment: bool,
    /// Seed questions offered per matched topic.
    pub seeds_per_topic: usize,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            top_k: DEFAULT_TOP_K,
            history_window: DEFAULT_HISTORY_WINDOW,
            always_augment: true,
            seeds_per_topic: DEFAULT_SEEDS_PER_TOPIC,
        }
    }
}

/// Progress of one turn, streamed to the client.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnEvent {
    /// Context gathered before the model is called.
    Context {
        /// Intent label.
        intent: &'static str,
        /// Matched question-bank topics.
        topics: Vec<String>,
        /// Retrieved snippets, best first.
        snippets: Vec<ScoredSnippet>,
    },
    /// A fragment of the reply.
    Token {
        /// Fragment text.
        text: String,
    },
    /// The reply completed and was added to history.
    Done {
        /// Full reply.
        text: String,
    },
    /// The turn failed; history is unchanged.
    Error {
        /// User-facing message.
        message: String,
        /// Whether resending the same message may succeed.
        retryable: bool,
    },
}

impl TurnEvent {
    /// Builds the error event for `err`.
    #[must_use]
    pub fn from_error(err: &Error) -> Self {
        Self::Error {
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

/// Runs turns for any number of sessions.
///
/// Cheap to clone; clones share the model, retriever and question bank.
#[derive(Clone)]
pub struct Orchestrator {
    model: Arc<dyn ChatModel>,
    retriever: Retriever,
    bank: Arc<QuestionBank>,
    settings: TurnSettings,
}

impl Orchestrator {
    /// Creates an orchestrator.
    #[must_use]
    pub fn new(
        model: Arc<dyn ChatModel>,
        retriever: Retriever,
        bank: Arc<QuestionBank>,
        settings: TurnSettings,
    ) -> Self {
        Self {
            model,
            retriever,
            bank,
            settings,
        }
    }

    /// Turn settings.
    #[must_use]
    pub const fn settings(&self) -> &TurnSettings {
        &self.settings
    }

    /// Question bank.
    #[must_use]
    pub const fn bank(&self) -> &Arc<QuestionBank> {
        &self.bank
    }

    /// Starts a turn on a background task and returns its event stream.
    ///
    /// Dropping the stream cancels the turn without touching history. Must
    /// be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::EmptyMessage`] for a blank message and
    /// [`SessionError::Busy`] while another turn is in flight.
    pub fn start_turn(
        &self,
        session: &Arc<Session>,
        message: &str,
    ) -> Result<ReceiverStream<TurnEvent>> {
        let message = validate_message(message)?;
        let ticket = session.begin_turn()?;
        let turn_id = ticket.turn_id;
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let this = self.clone();
        let task_session = Arc::clone(session);
        let task = tokio::spawn(async move {
            let errors = tx.clone();
            match this.execute(&task_session, ticket, message, tx).await {
                Ok(_) => {}
                Err(Error::Session(SessionError::Cancelled)) => {
                    debug!(session = %task_session.id(), turn = turn_id, "turn cancelled");
                }
                Err(err) => {
                    let _ = errors.send(TurnEvent::from_error(&err)).await;
                }
            }
        });
        session.attach_abort(turn_id, task.abort_handle());

        Ok(ReceiverStream::new(rx))
    }

    /// Runs a turn to completion on the current task and returns the reply.
    ///
    /// # Errors
    ///
    /// Returns the error that ended the turn; history is unchanged.
    pub async fn complete_turn(&self, session: &Arc<Session>, message: &str) -> Result<String> {
        let message = validate_message(message)?;
        let ticket = session.begin_turn()?;
        let (tx, mut rx) = mpsc::channel(EVENT_BUFFER);

        let drain = async { while rx.recv().await.is_some() {} };
        let (reply, ()) = tokio::join!(self.execute(session, ticket, message, tx), drain);
        reply
    }

    async fn execute(
        &self,
        session: &Arc<Session>,
        ticket: TurnTicket,
        message: String,
        tx: mpsc::Sender<TurnEvent>,
    ) -> Result<String> {
        let _guard = TurnGuard::new(Arc::clone(session), ticket.turn_id);
        let intent = Intent::classify(&message, ticket.awaiting_answer);

        let topics = match &intent {
            Intent::Ask { topics } if !topics.is_empty() => topics.clone(),
            _ => ticket.topics.clone(),
        };
        let matched = match intent {
            Intent::Summarize => Vec::new(),
            _ => self
                .bank
                .match_topics(&format!("{message}\n{}", topics.join(", "))),
        };

        let snippets = if self.should_retrieve(&intent, &matched) {
            let query = retrieval_query(&intent, &message, &topics, &ticket);
            self.retriever.retrieve(&query, self.settings.top_k).await
        } else {
            Vec::new()
        };
        debug!(
            session = %session.id(),
            turn = ticket.turn_id,
            intent = intent.label(),
            message = %preview(&message, 60),
            ?matched,
            snippets = snippets.len(),
            "turn context ready"
        );

        let seeds = self
            .bank
            .seed_questions(&matched, self.settings.seeds_per_topic);
        let history = match intent {
            Intent::Summarize => ticket.history.turns(),
            _ => ticket.history.window(self.settings.history_window),
        };
        let prompt = build_prompt(&PromptParts {
            intent: &intent,
            message: &message,
            topics: &topics,
            history,
            snippets: &snippets,
            seeds: &seeds,
        });

        send(
            &tx,
            TurnEvent::Context {
                intent: intent.label(),
                topics: matched,
                snippets,
            },
        )
        .await?;

        let started = tokio::select! {
            biased;
            () = tx.closed() => return Err(SessionError::Cancelled.into()),
            stream = self.model.stream(&prompt) => stream,
        };
        let mut tokens = started
            .inspect_err(|err| warn!(session = %session.id(), error = %err, "model request failed"))?;

        let mut reply = String::new();
        loop {
            let next = tokio::select! {
                biased;
                () = tx.closed() => return Err(SessionError::Cancelled.into()),
                next = tokens.next() => next,
            };
            match next {
                Some(Ok(text)) => {
                    reply.push_str(&text);
                    send(&tx, TurnEvent::Token { text }).await?;
                }
                Some(Err(err)) => {
                    warn!(session = %session.id(), error = %err, "model stream failed");
                    return Err(err);
                }
                None => break,
            }
        }

        if reply.trim().is_empty() {
            warn!(session = %session.id(), "model returned an empty response");
            return Err(ModelError::EmptyResponse.into());
        }

        if tx.is_closed() {
            debug!(session = %session.id(), turn = ticket.turn_id, "client left before commit");
            return Err(SessionError::Cancelled.into());
        }
        if !session.commit(ticket.turn_id, &intent, message, reply.as_str()) {
            return Err(SessionError::Cancelled.into());
        }
        info!(
            session = %session.id(),
            turn = ticket.turn_id,
            intent = intent.label(),
            chars = reply.len(),
            "turn completed"
        );
        // Already committed; a client that left now simply misses the event
        let _ = tx.send(TurnEvent::Done { text: reply.clone() }).await;
        Ok(reply)
    }

    fn should_retrieve(&self, intent: &Intent, matched: &[String]) -> bool {
        match intent {
            Intent::Summarize => false,
            Intent::Ask { .. } => true,
            Intent::Chat | Intent::Answer => self.settings.always_augment || !matched.is_empty(),
        }
    }
}

fn validate_message(message: &str) -> Result<String> {
    let message = message.trim();
    if message.is_empty() {
        return Err(SessionError::EmptyMessage.into());
    }
    Ok(message.to_string())
}

/// Text embedded to find context for a turn.
fn retrieval_query(intent: &Intent, message: &str, topics: &[String], ticket: &TurnTicket) -> String {
    match intent {
        Intent::Ask { .. } if topics.is_empty() => GENERAL_TOPIC.to_string(),
        Intent::Ask { .. } => topics.join(", "),
        Intent::Answer => match ticket.history.last_reply() {
            Some(question) => format!("{question}\n{message}"),
            None => message.to_string(),
        },
        Intent::Chat | Intent::Summarize => message.to_string(),
    }
}

/// Sends an event, treating a closed channel as cancellation.
async fn send(tx: &mpsc::Sender<TurnEvent>, event: TurnEvent) -> Result<()> {
    tx.send(event)
        .await
        .map_err(|_| SessionError::Cancelled.into())
}

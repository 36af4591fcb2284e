//! Turn intent classification.

use serde::Serialize;

/// Command that asks for an interview question.
pub const ASK_COMMAND: &str = "/ask";
/// Alias of [`ASK_COMMAND`].
pub const QUESTION_COMMAND: &str = "/question";
/// Command that asks for a session summary.
pub const SUMMARY_COMMAND: &str = "/summary";

/// What the user wants from a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Intent {
    /// Free-form coaching conversation.
    Chat,
    /// Generate one interview question. `topics` are the command arguments,
    /// empty when none were given.
    Ask {
        /// Requested topics.
        topics: Vec<String>,
    },
    /// The message answers the question asked in the previous turn.
    Answer,
    /// Summarize weaknesses and improvements over the session.
    Summarize,
}

impl Intent {
    /// Classifies a trimmed message. `awaiting_answer` is true when the
    /// previous completed turn asked a question.
    ///
    /// Commands are matched case-insensitively and must be followed by
    /// whitespace or the end of the message.
    #[must_use]
    pub fn classify(message: &str, awaiting_answer: bool) -> Self {
        if let Some(args) = command_args(message, ASK_COMMAND)
            .or_else(|| command_args(message, QUESTION_COMMAND))
        {
            return Self::Ask {
                topics: parse_topics(args),
            };
        }
        if command_args(message, SUMMARY_COMMAND).is_some() {
            return Self::Summarize;
        }
        if awaiting_answer {
            Self::Answer
        } else {
            Self::Chat
        }
    }

    /// Short label for logs and events.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Chat => "chat",
            Self::Ask { .. } => "ask",
            Self::Answer => "answer",
            Self::Summarize => "summarize",
        }
    }
}

/// Returns the text after `command` if `message` starts with it as a word.
fn command_args<'a>(message: &'a str, command: &str) -> Option<&'a str> {
    let head = message.get(..command.len())?;
    if !head.eq_ignore_ascii_case(command) {
        return None;
    }
    let rest = &message[command.len()..];
    match rest.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() => Some(rest.trim()),
        Some(_) => None,
    }
}

/// Splits command arguments on commas, keeping non-blank entries.
///
/// A single argument list without commas is one topic, so
/// `/ask system design` yields `["system design"]`.
fn parse_topics(args: &str) -> Vec<String> {
    args.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(ToString::to_string)
        .collect()
}

//! Interviewer directives and prompt assembly.
//!
//! Every turn is sent as a list of messages in a fixed order:
//!
//! 1. the directive for the turn's intent (system)
//! 2. retrieved context from the candidate's documents (system, omitted when
//!    nothing was retrieved; question turns note the absence instead)
//! 3. seed questions from the question bank (system, omitted when none)
//! 4. prior turns
//! 5. the user message, rewritten for question, answer and summary turns

pub mod question_bank;

pub use question_bank::{QuestionBank, SeedQuestion, Topic};

use crate::core::{ScoredSnippet, Turn};
use crate::llm::{Message, Prompt};
use crate::session::Intent;
use std::fmt::Write;

/// Directive for free-form coaching turns.
pub const CHAT_DIRECTIVE: &str = "You are a technical interview coach helping a candidate rehearse for software engineering interviews. Answer clearly and concisely, as an experienced interviewer would explain it. When reference material from the candidate's documents is provided, ground your answer in it and say so when it does not cover the question.";

/// Directive for question turns.
pub const ASK_DIRECTIVE: &str = "You are a professional technical interviewer selecting strong engineers. Using the candidate's background and the requested topics, ask exactly one sharp interview question.

Rules:
- The question must be open-ended and require an explanation, not a yes or no.
- It must not be too easy, and it must be a single sentence.
- Prefer questions about projects and technologies that appear in the candidate's documents.
- Do not repeat or rephrase a question already asked in this conversation.

Reply with the question only.";

/// Directive for answer turns.
pub const ANSWER_DIRECTIVE: &str = "You are a professional technical interviewer and mentor. The candidate has just answered your last question. Give short, concrete feedback in the style of the examples: acknowledge what was good, point out what is missing or vague, and tell the candidate what detail would make the answer convincing. Do not ask a new question.";

/// Directive for summary turns.
pub const SUMMARY_DIRECTIVE: &str = "You are a backend interviewer at a large technology company. The conversation so far is a record of interview questions, the candidate's answers and your feedback. Summarize the candidate's technical weaknesses and concrete ways to improve, as a short list. Base every point on the conversation.";

/// Context note used for question turns when no document matched.
pub const NO_DOCUMENTS_NOTE: &str = "No documents from the candidate are available. Base the question on the requested topics only.";

/// User message sent for summary turns.
pub const SUMMARY_REQUEST: &str = "Summarize my technical weaknesses and what I should improve, based on this interview so far.";

/// Topic phrase used when a question is requested without topics.
pub const GENERAL_TOPIC: &str = "general software engineering";

/// Worked examples shown before the candidate's answer.
pub const FEEDBACK_EXAMPLES: &[(&str, &str)] = &[
    (
        "I used async/await in FastAPI to run the LLM calls in parallel.",
        "Good direction. It would be stronger if you explained exactly how the calls ran in parallel, for example whether you used asyncio.gather, and what happened when one call failed.",
    ),
    (
        "I used LangChain for a RAG chatbot.",
        "Mentioning LangChain is fine, but say which modules you used and describe your chunking strategy and retriever setup, and why you chose them.",
    ),
];

/// Returns the directive for `intent`.
#[must_use]
pub const fn directive(intent: &Intent) -> &'static str {
    match intent {
        Intent::Chat => CHAT_DIRECTIVE,
        Intent::Ask { .. } => ASK_DIRECTIVE,
        Intent::Answer => ANSWER_DIRECTIVE,
        Intent::Summarize => SUMMARY_DIRECTIVE,
    }
}

/// Formats retrieved snippets as a context block, or `None` when empty.
#[must_use]
pub fn build_context_block(snippets: &[ScoredSnippet]) -> Option<String> {
    if snippets.is_empty() {
        return None;
    }

    let mut block =
        String::from("Reference material from the candidate's documents (most relevant first):\n");
    for (i, snippet) in snippets.iter().enumerate() {
        let _ = write!(
            block,
            "\n<snippet rank=\"{rank}\" source=\"{source}\">\n{text}\n</snippet>\n",
            rank = i + 1,
            source = snippet.source,
            text = snippet.text.trim(),
        );
    }
    Some(block)
}

/// Formats seed questions, or `None` when empty.
#[must_use]
pub fn build_seed_block(seeds: &[SeedQuestion]) -> Option<String> {
    if seeds.is_empty() {
        return None;
    }

    let mut block = String::from(
        "Example questions for the topics in play. Use them for inspiration; do not copy them verbatim:\n",
    );
    for seed in seeds {
        let _ = write!(block, "\n- [{}] {}", seed.topic, seed.question);
    }
    Some(block)
}

/// Builds the user message for a question turn.
#[must_use]
pub fn build_ask_message(topics: &[String]) -> String {
    let topics = if topics.is_empty() {
        GENERAL_TOPIC.to_string()
    } else {
        topics.join(", ")
    };
    format!("Ask me one interview question about: {topics}")
}

/// Wraps the candidate's answer in the few-shot feedback frame.
#[must_use]
pub fn build_answer_message(answer: &str) -> String {
    let mut message = String::new();
    for (example, feedback) in FEEDBACK_EXAMPLES {
        let _ = write!(message, "Candidate: {example}\nFeedback: {feedback}\n\n");
    }
    let _ = write!(message, "Candidate: {}\nFeedback:", answer.trim());
    message
}

/// Everything that goes into one turn's prompt.
#[derive(Debug, Clone, Copy)]
pub struct PromptParts<'a> {
    /// Turn intent.
    pub intent: &'a Intent,
    /// The user's message as typed.
    pub message: &'a str,
    /// Topics for question turns (command arguments or session topics).
    pub topics: &'a [String],
    /// Prior turns to include, already windowed.
    pub history: &'a [Turn],
    /// Retrieved context.
    pub snippets: &'a [ScoredSnippet],
    /// Seed questions for matched topics.
    pub seeds: &'a [SeedQuestion],
}

/// Assembles the prompt for one turn.
#[must_use]
pub fn build_prompt(parts: &PromptParts<'_>) -> Prompt {
    let mut prompt = Prompt::new();
    prompt.push(Message::system(directive(parts.intent)));

    match build_context_block(parts.snippets) {
        Some(context) => prompt.push(Message::system(context)),
        None if matches!(parts.intent, Intent::Ask { .. }) => {
            prompt.push(Message::system(NO_DOCUMENTS_NOTE));
        }
        None => {}
    }

    if let Some(seeds) = build_seed_block(parts.seeds) {
        prompt.push(Message::system(seeds));
    }

    for turn in parts.history {
        prompt.push(Message::from(turn));
    }

    let user = match parts.intent {
        Intent::Chat => parts.message.to_string(),
        Intent::Ask { .. } => build_ask_message(parts.topics),
        Intent::Answer => build_answer_message(parts.message),
        Intent::Summarize => SUMMARY_REQUEST.to_string(),
    };
    prompt.push(Message::user(user));

    prompt
}

//! Topic keywords and seed interview questions.
//!
//! A question bank is a JSON array of topics:
//!
//! ```json
//! [{ "name": "Rust", "keywords": ["rust", "cargo"], "questions": ["..."] }]
//! ```
//!
//! A topic is triggered when any of its keywords appears in a message as a
//! whole word, ignoring case.

use crate::error::{ConfigError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// Question bank compiled into the binary.
const BUILTIN_BANK: &str = include_str!("../../data/question_bank.json");

/// Character class contents for word characters. A keyword must not touch
/// one of these on either side.
const WORD_CLASS: &str = r"\p{L}\p{N}_";

/// One practice topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Topic {
    /// Display name, e.g. `"Databases"`.
    pub name: String,
    /// Trigger words or phrases.
    pub keywords: Vec<String>,
    /// Seed questions offered to the model.
    #[serde(default)]
    pub questions: Vec<String>,
}

/// A seed question tagged with its topic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeedQuestion {
    /// Topic name.
    pub topic: String,
    /// Question text.
    pub question: String,
}

/// Compiled question bank.
#[derive(Debug, Clone)]
pub struct QuestionBank {
    topics: Vec<Topic>,
    matchers: Vec<Regex>,
}

impl QuestionBank {
    /// Loads the bank compiled into the binary.
    ///
    /// # Errors
    ///
    /// Returns an error only if the embedded bank is malformed.
    pub fn builtin() -> Result<Self> {
        Self::from_json(BUILTIN_BANK, "<builtin>")
    }

    /// Loads the bank from `path`, or the builtin bank when `path` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::QuestionBank`] if the file cannot be read or
    /// parsed.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Self::builtin();
        };
        let shown = path.display().to_string();
        let json = std::fs::read_to_string(path).map_err(|e| ConfigError::QuestionBank {
            path: shown.clone(),
            reason: e.to_string(),
        })?;
        let bank = Self::from_json(&json, &shown)?;
        info!(path = %shown, topics = bank.len(), "loaded question bank");
        Ok(bank)
    }

    /// Parses and compiles a bank from JSON text. `origin` names the source
    /// in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::QuestionBank`] on malformed JSON, a topic
    /// without a name, or a topic without usable keywords.
    pub fn from_json(json: &str, origin: &str) -> Result<Self> {
        let invalid = |reason: String| ConfigError::QuestionBank {
            path: origin.to_string(),
            reason,
        };

        let topics: Vec<Topic> = serde_json::from_str(json).map_err(|e| invalid(e.to_string()))?;
        let mut matchers = Vec::with_capacity(topics.len());
        for topic in &topics {
            if topic.name.trim().is_empty() {
                return Err(invalid("topic with empty name".to_string()).into());
            }
            let matcher = keyword_matcher(&topic.keywords)?.ok_or_else(|| {
                invalid(format!("topic '{}' has no keywords", topic.name))
            })?;
            matchers.push(matcher);
        }

        Ok(Self { topics, matchers })
    }

    /// Returns all topics in bank order.
    #[must_use]
    pub fn topics(&self) -> &[Topic] {
        &self.topics
    }

    /// Number of topics.
    #[must_use]
    pub fn len(&self) -> usize {
        self.topics.len()
    }

    /// Whether the bank has no topics.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Looks up a topic by name, ignoring case.
    #[must_use]
    pub fn topic(&self, name: &str) -> Option<&Topic> {
        self.topics
            .iter()
            .find(|t| t.name.eq_ignore_ascii_case(name.trim()))
    }

    /// Names of the topics whose keywords occur in `text`, in bank order.
    #[must_use]
    pub fn match_topics(&self, text: &str) -> Vec<String> {
        self.topics
            .iter()
            .zip(&self.matchers)
            .filter(|(_, matcher)| matcher.is_match(text))
            .map(|(topic, _)| topic.name.clone())
            .collect()
    }

    /// Up to `per_topic` seed questions for each named topic.
    ///
    /// Unknown topic names are skipped.
    #[must_use]
    pub fn seed_questions(&self, topics: &[String], per_topic: usize) -> Vec<SeedQuestion> {
        topics
            .iter()
            .filter_map(|name| self.topic(name))
            .flat_map(|topic| {
                topic.questions.iter().take(per_topic).map(|q| SeedQuestion {
                    topic: topic.name.clone(),
                    question: q.clone(),
                })
            })
            .collect()
    }
}

/// Builds a case-insensitive whole-word matcher for any of `keywords`.
///
/// Returns `None` when no keyword is non-blank.
fn keyword_matcher(keywords: &[String]) -> Result<Option<Regex>> {
    let alternation: Vec<String> = keywords
        .iter()
        .map(|k| k.trim())
        .filter(|k| !k.is_empty())
        .map(regex::escape)
        .collect();
    if alternation.is_empty() {
        return Ok(None);
    }

    let pattern = format!(
        "(?i)(?:^|[^{WORD_CLASS}])(?:{alts})(?:$|[^{WORD_CLASS}])",
        alts = alternation.join("|"),
    );
    Ok(Some(Regex::new(&pattern)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use test_case::test_case;

    const BANK: &str = r#"[
        {"name": "Rust", "keywords": ["rust", "cargo"], "questions": ["q1", "q2", "q3"]},
        {"name": "C++", "keywords": ["c++", "cpp"], "questions": ["q4"]},
        {"name": "Caching", "keywords": ["redis", "cache eviction"], "questions": []}
    ]"#;

    fn bank() -> QuestionBank {
        QuestionBank::from_json(BANK, "test").unwrap()
    }

    #[test]
    fn test_builtin_bank_loads() {
        let bank = QuestionBank::builtin().unwrap();
        assert!(!bank.is_empty());
        assert!(bank.topics().iter().all(|t| !t.questions.is_empty()));
    }

    #[test_case("I love Rust" => vec!["Rust"]; "case insensitive")]
    #[test_case("RUST." => vec!["Rust"]; "punctuation boundary")]
    #[test_case("trust me" => Vec::<&str>::new(); "inside a word")]
    #[test_case("rusty nails" => Vec::<&str>::new(); "prefix of a word")]
    #[test_case("C++ and cargo" => vec!["Rust", "C++"]; "bank order and escaping")]
    #[test_case("tell me about Cache Eviction" => vec!["Caching"]; "multi word keyword")]
    #[test_case("redis_client" => Vec::<&str>::new(); "underscore is a word char")]
    fn test_match_topics(text: &str) -> Vec<String> {
        bank().match_topics(text)
    }

    #[test]
    fn test_seed_questions() {
        let seeds = bank().seed_questions(&["rust".to_string(), "Go".to_string()], 2);
        assert_eq!(
            seeds,
            vec![
                SeedQuestion {
                    topic: "Rust".to_string(),
                    question: "q1".to_string()
                },
                SeedQuestion {
                    topic: "Rust".to_string(),
                    question: "q2".to_string()
                },
            ]
        );
    }

    #[test_case(r#"[{"name": "", "keywords": ["x"]}]"#; "empty name")]
    #[test_case(r#"[{"name": "X", "keywords": ["  "]}]"#; "blank keywords")]
    #[test_case(r#"{"name": "X"}"#; "not an array")]
    fn test_invalid_bank(json: &str) {
        assert!(matches!(
            QuestionBank::from_json(json, "bad.json"),
            Err(Error::Config(ConfigError::QuestionBank { .. }))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("bank.json");
        std::fs::write(&path, BANK).unwrap();
        assert_eq!(QuestionBank::load(Some(&path)).unwrap().len(), 3);

        let missing = dir.path().join("missing.json");
        assert!(QuestionBank::load(Some(&missing)).is_err());
    }
}

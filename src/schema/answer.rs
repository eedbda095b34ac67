/// Answers and the per-person answer store.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::question::Question;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnswerError {
    #[error("question '{question}' expects {expected}")]
    WrongShape {
        question: String,
        expected: &'static str,
    },
    #[error("'{value}' is not an option of question '{question}'")]
    UnknownOption { question: String, value: String },
    #[error("option '{value}' of question '{question}' does not take custom text")]
    CustomNotAllowed { question: String, value: String },
}

/// A recorded answer to one question.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    Text(String),
    /// A single option, plus free text when the option allows it.
    Choice {
        value: String,
        #[serde(default)]
        custom: Option<String>,
    },
    /// Selected option values in the order they were picked.
    MultiChoice(Vec<String>),
}

impl Answer {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn choice(value: impl Into<String>) -> Self {
        Self::Choice {
            value: value.into(),
            custom: None,
        }
    }

    pub fn custom(value: impl Into<String>, text: impl Into<String>) -> Self {
        Self::Choice {
            value: value.into(),
            custom: Some(text.into()),
        }
    }

    pub fn multi<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::MultiChoice(values.into_iter().map(Into::into).collect())
    }

    /// True when nothing usable was entered or picked.
    pub fn is_blank(&self) -> bool {
        match self {
            Self::Text(text) => text.trim().is_empty(),
            Self::Choice { value, .. } => value.is_empty(),
            Self::MultiChoice(values) => values.is_empty(),
        }
    }

    pub fn custom_text(&self) -> Option<&str> {
        match self {
            Self::Choice {
                custom: Some(text), ..
            } => Some(text),
            _ => None,
        }
    }
}

/// Answers for one person (or one group), keyed by question id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerStore {
    answers: FxHashMap<String, Answer>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, question_id: &str) -> Option<&Answer> {
        self.answers.get(question_id)
    }

    /// Store an answer without checking it against a question.
    pub fn set(&mut self, question_id: &str, answer: Answer) {
        self.answers.insert(question_id.to_string(), answer);
    }

    pub fn remove(&mut self, question_id: &str) -> Option<Answer> {
        self.answers.remove(question_id)
    }

    /// Validate and store an answer. Custom text survives only on an
    /// option that allows it.
    pub fn record(&mut self, question: &Question, answer: Answer) -> Result<(), AnswerError> {
        let answer = match answer {
            Answer::Choice { value, custom } => {
                let allows_custom = question
                    .option(&value)
                    .map(|o| o.allows_custom)
                    .unwrap_or(false);
                Answer::Choice {
                    value,
                    custom: if allows_custom { custom } else { None },
                }
            }
            other => other,
        };
        question.validate(&answer)?;
        self.set(&question.id, answer);
        Ok(())
    }

    /// Pick a single option. Switching to an option without a free-text
    /// box drops any custom text entered earlier.
    pub fn select(&mut self, question: &Question, value: &str) -> Result<(), AnswerError> {
        let previous_custom = self
            .get(&question.id)
            .and_then(Answer::custom_text)
            .map(str::to_string);
        self.record(
            question,
            Answer::Choice {
                value: value.to_string(),
                custom: previous_custom,
            },
        )
    }

    /// Enter free text for the currently selected option.
    pub fn set_custom(&mut self, question: &Question, text: &str) -> Result<(), AnswerError> {
        let value = match self.get(&question.id) {
            Some(Answer::Choice { value, .. }) => value.clone(),
            _ => {
                return Err(AnswerError::WrongShape {
                    question: question.id.clone(),
                    expected: "a selected option before custom text",
                })
            }
        };
        if !question.option(&value).map(|o| o.allows_custom).unwrap_or(false) {
            return Err(AnswerError::CustomNotAllowed {
                question: question.id.clone(),
                value,
            });
        }
        self.set(&question.id, Answer::custom(value, text));
        Ok(())
    }

    /// Add or remove one value of a checkbox question, keeping pick order.
    pub fn toggle(&mut self, question: &Question, value: &str) -> Result<(), AnswerError> {
        let mut values = match self.get(&question.id) {
            Some(Answer::MultiChoice(values)) => values.clone(),
            _ => Vec::new(),
        };
        if let Some(pos) = values.iter().position(|v| v == value) {
            values.remove(pos);
        } else {
            values.push(value.to_string());
        }
        self.record(question, Answer::MultiChoice(values))
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Answer)> {
        self.answers.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }
}

impl FromIterator<(String, Answer)> for AnswerStore {
    fn from_iter<T: IntoIterator<Item = (String, Answer)>>(iter: T) -> Self {
        Self {
            answers: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::question::{QuestionKind, QuestionOption};

    fn genre_question() -> Question {
        let mut q = Question::new("group-genre", "Genre?", QuestionKind::Radio);
        q.options = vec![
            QuestionOption::new("rock", "Rock"),
            QuestionOption {
                allows_custom: true,
                ..QuestionOption::new("other", "Other")
            },
        ];
        q
    }

    fn traits_question() -> Question {
        let mut q = Question::new("traits", "Traits?", QuestionKind::Checkbox);
        q.options = vec![
            QuestionOption::new("loyal", "Loyal"),
            QuestionOption::new("witty", "Witty"),
            QuestionOption::new("stubborn", "Stubborn"),
        ];
        q
    }

    #[test]
    fn selecting_plain_option_clears_custom_text() {
        let q = genre_question();
        let mut store = AnswerStore::new();
        store.select(&q, "other").unwrap();
        store.set_custom(&q, "sea shanty").unwrap();
        assert_eq!(store.get("group-genre"), Some(&Answer::custom("other", "sea shanty")));

        store.select(&q, "rock").unwrap();
        assert_eq!(store.get("group-genre"), Some(&Answer::choice("rock")));

        store.select(&q, "other").unwrap();
        assert_eq!(store.get("group-genre").and_then(Answer::custom_text), None);
    }

    #[test]
    fn reselecting_sentinel_keeps_custom_text() {
        let q = genre_question();
        let mut store = AnswerStore::new();
        store.select(&q, "other").unwrap();
        store.set_custom(&q, "sea shanty").unwrap();
        store.select(&q, "other").unwrap();
        assert_eq!(
            store.get("group-genre").and_then(Answer::custom_text),
            Some("sea shanty")
        );
    }

    #[test]
    fn custom_text_requires_sentinel_selection() {
        let q = genre_question();
        let mut store = AnswerStore::new();
        assert!(store.set_custom(&q, "polka").is_err());
        store.select(&q, "rock").unwrap();
        assert!(matches!(
            store.set_custom(&q, "polka"),
            Err(AnswerError::CustomNotAllowed { .. })
        ));
    }

    #[test]
    fn record_strips_custom_from_plain_option() {
        let q = genre_question();
        let mut store = AnswerStore::new();
        store.record(&q, Answer::custom("rock", "ignored")).unwrap();
        assert_eq!(store.get("group-genre"), Some(&Answer::choice("rock")));
    }

    #[test]
    fn toggle_keeps_selection_order() {
        let q = traits_question();
        let mut store = AnswerStore::new();
        store.toggle(&q, "witty").unwrap();
        store.toggle(&q, "loyal").unwrap();
        store.toggle(&q, "stubborn").unwrap();
        store.toggle(&q, "loyal").unwrap();
        assert_eq!(store.get("traits"), Some(&Answer::multi(["witty", "stubborn"])));
    }

    #[test]
    fn blank_answers() {
        assert!(Answer::text("   ").is_blank());
        assert!(Answer::choice("").is_blank());
        assert!(Answer::MultiChoice(Vec::new()).is_blank());
        assert!(!Answer::choice("rock").is_blank());
    }

    #[test]
    fn store_json_round_trip() {
        let mut store = AnswerStore::new();
        store.set("name", Answer::text("Kai"));
        store.set("group-genre", Answer::custom("other", "shoegaze"));
        let json = serde_json::to_string(&store).unwrap();
        let back: AnswerStore = serde_json::from_str(&json).unwrap();
        assert_eq!(back, store);
    }
}

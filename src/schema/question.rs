/// Questionnaire questions and their answer options.

use serde::{Deserialize, Serialize};

use super::answer::{Answer, AnswerError};

/// The input widget a question is answered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionKind {
    /// Single-line free text.
    Text,
    /// Multi-line free text.
    TextArea,
    /// One option from a short list.
    Radio,
    /// One option from a dropdown.
    Select,
    /// Any number of options.
    Checkbox,
}

impl QuestionKind {
    pub fn has_options(self) -> bool {
        match self {
            Self::Text | Self::TextArea => false,
            Self::Radio | Self::Select | Self::Checkbox => true,
        }
    }

    pub fn is_multi(self) -> bool {
        matches!(self, Self::Checkbox)
    }

    /// Short instruction shown next to the question.
    pub fn input_hint(self) -> &'static str {
        match self {
            Self::Text => "Type a short answer",
            Self::TextArea => "Write as much as you like",
            Self::Radio => "Choose one",
            Self::Select => "Pick one from the list",
            Self::Checkbox => "Select all that apply",
        }
    }

    /// Whether an answer has the shape this kind produces.
    pub fn accepts(self, answer: &Answer) -> bool {
        match self {
            Self::Text | Self::TextArea => matches!(answer, Answer::Text(_)),
            Self::Radio | Self::Select => matches!(answer, Answer::Choice { .. }),
            Self::Checkbox => matches!(answer, Answer::MultiChoice(_)),
        }
    }

    fn expected_shape(self) -> &'static str {
        match self {
            Self::Text | Self::TextArea => "a text answer",
            Self::Radio | Self::Select => "a single choice",
            Self::Checkbox => "a list of choices",
        }
    }
}

/// One selectable answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub value: String,
    pub label: String,
    /// Phrase used when the option is woven into narrative text.
    #[serde(default)]
    pub prose: Option<String>,
    /// Selecting this option opens a free-text box ("Other").
    #[serde(default)]
    pub allows_custom: bool,
}

impl QuestionOption {
    pub fn new(value: &str, label: &str) -> Self {
        Self {
            value: value.to_string(),
            label: label.to_string(),
            prose: None,
            allows_custom: false,
        }
    }

    /// The narrative phrase, falling back to the display label.
    pub fn phrase(&self) -> &str {
        self.prose.as_deref().unwrap_or(&self.label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    #[serde(default)]
    pub section: String,
    pub text: String,
    pub kind: QuestionKind,
    #[serde(default)]
    pub options: Vec<QuestionOption>,
    #[serde(default)]
    pub placeholder: Option<String>,
    /// Option value assumed when the question is left unanswered.
    #[serde(default)]
    pub default_value: Option<String>,
    /// Phrase used when a value matches no usable option.
    #[serde(default)]
    pub fallback: Option<String>,
}

impl Question {
    pub fn new(id: &str, text: &str, kind: QuestionKind) -> Self {
        Self {
            id: id.to_string(),
            section: String::new(),
            text: text.to_string(),
            kind,
            options: Vec::new(),
            placeholder: None,
            default_value: None,
            fallback: None,
        }
    }

    pub fn option(&self, value: &str) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.value == value)
    }

    /// Check that an answer fits this question's kind and options.
    pub fn validate(&self, answer: &Answer) -> Result<(), AnswerError> {
        if !self.kind.accepts(answer) {
            return Err(AnswerError::WrongShape {
                question: self.id.clone(),
                expected: self.kind.expected_shape(),
            });
        }
        match answer {
            Answer::Text(_) => Ok(()),
            Answer::Choice { value, custom } => {
                let option = self.option(value).ok_or_else(|| AnswerError::UnknownOption {
                    question: self.id.clone(),
                    value: value.clone(),
                })?;
                if custom.is_some() && !option.allows_custom {
                    return Err(AnswerError::CustomNotAllowed {
                        question: self.id.clone(),
                        value: value.clone(),
                    });
                }
                Ok(())
            }
            Answer::MultiChoice(values) => {
                for value in values {
                    if self.option(value).is_none() {
                        return Err(AnswerError::UnknownOption {
                            question: self.id.clone(),
                            value: value.clone(),
                        });
                    }
                }
                Ok(())
            }
        }
    }
}

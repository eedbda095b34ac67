/// Turns a recorded answer into the text shown to the user or woven into prose.

use crate::schema::answer::Answer;
use crate::schema::question::Question;

/// Which text an option contributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelMode {
    /// The option label, as shown in summaries.
    Display,
    /// The option's narrative phrase. A custom-input option with no
    /// custom text yields the question's fallback (or nothing).
    Prose,
}

/// Display label for an answer. Never fails; an absent answer with no
/// default resolves to `""`.
pub fn resolve(question: &Question, answer: Option<&Answer>) -> String {
    resolve_with(question, answer, LabelMode::Display)
}

/// Narrative phrase for an answer, as used by field templates.
pub fn resolve_prose(question: &Question, answer: Option<&Answer>) -> String {
    resolve_with(question, answer, LabelMode::Prose)
}

pub fn resolve_with(question: &Question, answer: Option<&Answer>, mode: LabelMode) -> String {
    match answer {
        Some(Answer::Text(text)) if !text.trim().is_empty() => text.clone(),
        Some(Answer::Choice { value, custom }) if !value.is_empty() => {
            resolve_value(question, value, custom.as_deref(), mode)
        }
        Some(Answer::MultiChoice(values)) if !values.is_empty() => values
            .iter()
            .map(|v| resolve_value(question, v, None, mode))
            .filter(|label| !label.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        _ => match &question.default_value {
            Some(value) => resolve_value(question, value, None, mode),
            None => String::new(),
        },
    }
}

fn resolve_value(question: &Question, value: &str, custom: Option<&str>, mode: LabelMode) -> String {
    let Some(option) = question.option(value) else {
        return question
            .fallback
            .clone()
            .unwrap_or_else(|| value.to_string());
    };

    if option.allows_custom {
        if let Some(text) = custom.map(str::trim).filter(|t| !t.is_empty()) {
            return text.to_string();
        }
        return match mode {
            LabelMode::Display => option.label.clone(),
            LabelMode::Prose => question.fallback.clone().unwrap_or_default(),
        };
    }

    match mode {
        LabelMode::Display => option.label.clone(),
        LabelMode::Prose => option.phrase().to_string(),
    }
}

/// Project onboarding: maps the `book_setup` questionnaire's answers onto
/// stored [`BookSetupAnswers`] and back.

use crate::core::questionnaire::Questionnaire;
use crate::core::store::{BookStore, StoreError};
use crate::schema::answer::{Answer, AnswerStore};
use crate::schema::project::{
    BookSetupAnswers, BookSetupCharacterAnswers, BookSetupWorldbuildingAnswers,
};

pub const PROJECT_NAME: &str = "projectName";
pub const ARCHETYPE: &str = "characterArchetype";
pub const BACKGROUND: &str = "characterBackground";
pub const MOTIVATION: &str = "characterMotivation";
pub const VOICE: &str = "characterVoice";
pub const WORLD_SETTING: &str = "worldSetting";
pub const WORLD_TONE: &str = "worldTone";
pub const HAS_PROLOGUE: &str = "hasPrologue";

/// What finishing the onboarding produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookSetupOutcome {
    /// New project name, when one was typed in.
    pub project_name: Option<String>,
    pub answers: BookSetupAnswers,
}

/// Stored form of an answer: custom text when present, else the raw value.
fn stored_value(answers: &AnswerStore, id: &str) -> String {
    match answers.get(id) {
        Some(Answer::Choice { value, custom }) => match custom.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => value.clone(),
        },
        Some(Answer::Text(text)) => text.clone(),
        Some(Answer::MultiChoice(values)) => values.join(", "),
        None => String::new(),
    }
}

pub fn collect(questionnaire: &Questionnaire, answers: &AnswerStore) -> BookSetupOutcome {
    let project_name = answers
        .get(PROJECT_NAME)
        .and_then(Answer::custom_text)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    let character = BookSetupCharacterAnswers {
        name: questionnaire.naming.default_name.clone(),
        background: stored_value(answers, BACKGROUND),
        motivations: stored_value(answers, MOTIVATION),
        relationships: String::new(),
        flaws: String::new(),
        voice: stored_value(answers, VOICE),
        role: stored_value(answers, ARCHETYPE),
    };

    let worldbuilding = [WORLD_SETTING, WORLD_TONE]
        .into_iter()
        .map(|id| BookSetupWorldbuildingAnswers {
            category_name: id.to_string(),
            description: stored_value(answers, id),
            freeform_notes: Vec::new(),
        })
        .collect();

    BookSetupOutcome {
        project_name,
        answers: BookSetupAnswers {
            characters: vec![character],
            worldbuilding,
            has_prologue: stored_value(answers, HAS_PROLOGUE) == "yes",
        },
    }
}

/// Rebuild editable answers from saved ones. A saved string that matches
/// no option goes back into the option that takes custom text.
pub fn restore(questionnaire: &Questionnaire, saved: &BookSetupAnswers) -> AnswerStore {
    let mut answers = AnswerStore::new();
    let mut put = |id: &str, stored: &str| {
        if stored.is_empty() {
            return;
        }
        let Some(question) = questionnaire.question(id) else {
            return;
        };
        if !question.kind.has_options() {
            answers.set(id, Answer::text(stored));
        } else if question.option(stored).is_some() {
            answers.set(id, Answer::choice(stored));
        } else if let Some(option) = question.options.iter().find(|o| o.allows_custom) {
            answers.set(id, Answer::custom(option.value.clone(), stored));
        }
    };

    if let Some(character) = saved.characters.first() {
        put(ARCHETYPE, &character.role);
        put(BACKGROUND, &character.background);
        put(MOTIVATION, &character.motivations);
        put(VOICE, &character.voice);
    }
    for world in &saved.worldbuilding {
        if world.category_name == WORLD_SETTING || world.category_name == WORLD_TONE {
            put(&world.category_name, &world.description);
        }
    }
    put(HAS_PROLOGUE, if saved.has_prologue { "yes" } else { "no" });
    answers
}

/// Rename the project if a new name was given, then store the answers.
pub fn save<S: BookStore + ?Sized>(
    store: &mut S,
    project_id: &str,
    current_name: &str,
    outcome: &BookSetupOutcome,
) -> Result<(), StoreError> {
    if let Some(name) = &outcome.project_name {
        if name != current_name {
            store.rename_project(project_id, name)?;
            tracing::info!(project = project_id, name = %name, "Project renamed");
        }
    }
    store.save_book_setup_answers(project_id, &outcome.answers)?;
    tracing::info!(project = project_id, "Book setup saved");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builtin;
    use crate::core::store::MemoryBookStore;

    fn setup() -> Questionnaire {
        builtin::load("book_setup").unwrap()
    }

    fn answered(q: &Questionnaire) -> AnswerStore {
        let mut answers = AnswerStore::new();
        let pick = |answers: &mut AnswerStore, id: &str, answer: Answer| {
            answers.record(q.question(id).unwrap(), answer).unwrap();
        };
        pick(&mut answers, PROJECT_NAME, Answer::custom("custom", "  Crown of Thorns "));
        pick(&mut answers, ARCHETYPE, Answer::choice("brooding-hero"));
        pick(&mut answers, BACKGROUND, Answer::custom("other", "Disgraced lighthouse keeper"));
        pick(&mut answers, HAS_PROLOGUE, Answer::choice("yes"));
        answers
    }

    #[test]
    fn collects_values_and_custom_text() {
        let q = setup();
        let outcome = collect(&q, &answered(&q));
        assert_eq!(outcome.project_name.as_deref(), Some("Crown of Thorns"));

        let character = &outcome.answers.characters[0];
        assert_eq!(character.name, "Book Boyfriend");
        assert_eq!(character.role, "brooding-hero");
        assert_eq!(character.background, "Disgraced lighthouse keeper");
        assert_eq!(character.motivations, "");
        assert!(outcome.answers.has_prologue);

        let categories: Vec<&str> = outcome
            .answers
            .worldbuilding
            .iter()
            .map(|w| w.category_name.as_str())
            .collect();
        assert_eq!(categories, vec!["worldSetting", "worldTone"]);
    }

    #[test]
    fn unsure_prologue_is_false() {
        let q = setup();
        let mut answers = AnswerStore::new();
        answers
            .record(q.question(HAS_PROLOGUE).unwrap(), Answer::choice("unsure"))
            .unwrap();
        assert!(!collect(&q, &answers).answers.has_prologue);
    }

    #[test]
    fn restore_round_trips() {
        let q = setup();
        let original = answered(&q);
        let outcome = collect(&q, &original);
        let restored = restore(&q, &outcome.answers);

        assert_eq!(restored.get(ARCHETYPE), Some(&Answer::choice("brooding-hero")));
        assert_eq!(
            restored.get(BACKGROUND),
            Some(&Answer::custom("other", "Disgraced lighthouse keeper"))
        );
        assert_eq!(restored.get(HAS_PROLOGUE), Some(&Answer::choice("yes")));
        assert_eq!(restored.get(MOTIVATION), None);
        assert_eq!(collect(&q, &restored).answers, outcome.answers);
    }

    #[test]
    fn save_renames_then_stores() {
        let q = setup();
        let mut store = MemoryBookStore::new();
        store.create_project("p1", "Untitled").unwrap();

        let outcome = collect(&q, &answered(&q));
        save(&mut store, "p1", "Untitled", &outcome).unwrap();
        assert_eq!(store.get_project("p1").unwrap().name, "Crown of Thorns");
        assert_eq!(
            store.get_book_setup_answers("p1").unwrap(),
            Some(outcome.answers)
        );
    }
}

/// Roster checks run before a multi-character questionnaire starts and
/// again before records are submitted.

use rustc_hash::FxHashSet;
use thiserror::Error;

use crate::core::questionnaire::SetupRules;
use crate::schema::character::{CharacterRecord, FamilyRole, PersonDraft};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("add at least one person before continuing")]
    EmptyRoster,
    #[error("at least {min} people are required, found {found}")]
    TooFewPeople { min: usize, found: usize },
    #[error("at most {max} people are allowed, found {found}")]
    TooManyPeople { max: usize, found: usize },
    #[error("person #{position} needs a name")]
    MissingName { position: usize },
    #[error("the name '{0}' is used more than once")]
    DuplicateName(String),
    #[error("a character named '{0}' already exists in this project")]
    NameTaken(String),
    #[error("choose a main character")]
    MissingMainCharacter,
    #[error("only one person can be the main character")]
    MultipleMainCharacters,
    #[error("'{name}' cannot be the main character as {role}")]
    IneligibleMainCharacter { name: String, role: String },
    #[error("the main character needs at least one parent")]
    MissingParent,
    #[error("'{name}' cannot be a parent as {role}")]
    IneligibleParent { name: String, role: String },
    #[error("parent '{0}' is not part of this roster")]
    UnknownParent(String),
}

fn role_label(role: Option<FamilyRole>) -> String {
    match role {
        Some(role) => format!("a {}", role.as_str()),
        None => "someone with no role".to_string(),
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Names must be unique within the batch and must not collide with
/// existing characters. Comparison ignores case and surrounding spaces.
pub fn validate_unique_names<S: AsRef<str>>(
    candidates: &[S],
    existing: &[CharacterRecord],
) -> Result<(), ValidationError> {
    let mut seen = FxHashSet::default();
    for name in candidates {
        let name = name.as_ref().trim();
        if name.is_empty() {
            continue;
        }
        if !seen.insert(name_key(name)) {
            return Err(ValidationError::DuplicateName(name.to_string()));
        }
    }

    let taken: FxHashSet<String> = existing.iter().map(|c| name_key(&c.name)).collect();
    for name in candidates {
        let name = name.as_ref().trim();
        if !name.is_empty() && taken.contains(&name_key(name)) {
            return Err(ValidationError::NameTaken(name.to_string()));
        }
    }
    Ok(())
}

/// Check a roster against the questionnaire's setup rules. Returns the
/// first problem found.
pub fn validate_setup(
    rules: &SetupRules,
    people: &[PersonDraft],
    existing: &[CharacterRecord],
) -> Result<(), ValidationError> {
    let result = check_setup(rules, people, existing);
    if let Err(ref e) = result {
        tracing::debug!(error = %e, people = people.len(), "Roster rejected");
    }
    result
}

fn check_setup(
    rules: &SetupRules,
    people: &[PersonDraft],
    existing: &[CharacterRecord],
) -> Result<(), ValidationError> {
    if people.is_empty() && rules.min_people > 0 {
        return Err(ValidationError::EmptyRoster);
    }
    if people.len() < rules.min_people {
        return Err(ValidationError::TooFewPeople {
            min: rules.min_people,
            found: people.len(),
        });
    }
    if let Some(max) = rules.max_people {
        if people.len() > max {
            return Err(ValidationError::TooManyPeople {
                max,
                found: people.len(),
            });
        }
    }

    if rules.require_names {
        if let Some(position) = people.iter().position(|p| p.name.trim().is_empty()) {
            return Err(ValidationError::MissingName {
                position: position + 1,
            });
        }
    }

    let names: Vec<&str> = people.iter().map(|p| p.name.as_str()).collect();
    validate_unique_names(&names, existing)?;

    let Some(rule) = &rules.main_character else {
        return Ok(());
    };

    let mut mains = people.iter().filter(|p| p.is_main_character);
    let main = mains.next().ok_or(ValidationError::MissingMainCharacter)?;
    if mains.next().is_some() {
        return Err(ValidationError::MultipleMainCharacters);
    }

    if !main.role.is_some_and(|r| rule.eligible_roles.contains(&r)) {
        return Err(ValidationError::IneligibleMainCharacter {
            name: main.name.clone(),
            role: role_label(main.role),
        });
    }

    if rule.require_parent && main.parent_ids.is_empty() {
        return Err(ValidationError::MissingParent);
    }

    for parent_id in &main.parent_ids {
        let parent = people
            .iter()
            .find(|p| &p.id == parent_id && p.id != main.id)
            .ok_or_else(|| ValidationError::UnknownParent(parent_id.clone()))?;
        if !parent.role.is_some_and(|r| rule.parent_roles.contains(&r)) {
            return Err(ValidationError::IneligibleParent {
                name: parent.name.clone(),
                role: role_label(parent.role),
            });
        }
    }

    Ok(())
}

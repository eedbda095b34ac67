/// The book store seam: the external CRUD collaborator that owns projects,
/// plus an in-memory implementation for tools and tests.

use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::schema::character::CharacterRecord;
use crate::schema::project::{
    category_index, BookSetupAnswers, Project, Prologue, WorldbuildingCategory,
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("project '{0}' not found")]
    ProjectNotFound(String),
    #[error("project '{0}' already exists")]
    ProjectExists(String),
    #[error("character '{name}' not found in project '{project}'")]
    CharacterNotFound { project: String, name: String },
    #[error("character '{name}' already exists in project '{project}'")]
    DuplicateCharacter { project: String, name: String },
    #[error("unknown worldbuilding category '{0}'")]
    UnknownCategory(String),
    #[error("request rejected: {0}")]
    Rejected(String),
}

/// A batch submission stopped partway. Records before the failing one
/// stay committed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("created {created} of {total} characters before '{failed_name}' failed: {source}")]
pub struct BatchError {
    pub created: usize,
    pub total: usize,
    pub failed_name: String,
    #[source]
    pub source: StoreError,
}

/// Project persistence. Every call is a single remote operation.
pub trait BookStore {
    fn create_project(&mut self, id: &str, name: &str) -> Result<(), StoreError>;
    fn rename_project(&mut self, id: &str, new_name: &str) -> Result<(), StoreError>;
    fn delete_project(&mut self, id: &str) -> Result<(), StoreError>;
    fn get_project(&self, id: &str) -> Result<Project, StoreError>;
    fn get_all_projects(&self) -> Result<Vec<Project>, StoreError>;

    fn add_character(&mut self, project_id: &str, record: &CharacterRecord) -> Result<(), StoreError>;
    fn update_character(&mut self, project_id: &str, record: &CharacterRecord) -> Result<(), StoreError>;

    fn add_worldbuilding_note(
        &mut self,
        project_id: &str,
        category: &str,
        note: &str,
    ) -> Result<(), StoreError>;
    fn update_worldbuilding_category(
        &mut self,
        project_id: &str,
        category: &str,
        description: &str,
    ) -> Result<(), StoreError>;

    fn save_prologue(&mut self, project_id: &str, prologue: &Prologue) -> Result<(), StoreError>;

    fn save_book_setup_answers(
        &mut self,
        project_id: &str,
        answers: &BookSetupAnswers,
    ) -> Result<(), StoreError>;
    fn get_book_setup_answers(&self, project_id: &str) -> Result<Option<BookSetupAnswers>, StoreError>;

    /// Add characters one at a time, in order. Stops at the first failure;
    /// nothing already created is rolled back.
    fn batch_create_characters(
        &mut self,
        project_id: &str,
        records: &[CharacterRecord],
    ) -> Result<usize, BatchError> {
        let total = records.len();
        for (created, record) in records.iter().enumerate() {
            if let Err(source) = self.add_character(project_id, record) {
                tracing::warn!(
                    project = project_id,
                    created,
                    total,
                    name = %record.name,
                    error = %source,
                    "Batch character creation stopped"
                );
                return Err(BatchError {
                    created,
                    total,
                    failed_name: record.name.clone(),
                    source,
                });
            }
            tracing::debug!(project = project_id, name = %record.name, "Character created");
        }
        tracing::info!(project = project_id, total, "Batch character creation finished");
        Ok(total)
    }
}

/// In-memory book store. Mirrors the remote rules: names are unique per
/// project (ignoring case) and unknown projects are rejected.
#[derive(Debug, Clone, Default)]
pub struct MemoryBookStore {
    projects: FxHashMap<String, Project>,
    setup_answers: FxHashMap<String, BookSetupAnswers>,
    /// Creation order, so listings are stable.
    order: Vec<String>,
}

impl MemoryBookStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn project_mut(&mut self, id: &str) -> Result<&mut Project, StoreError> {
        self.projects
            .get_mut(id)
            .ok_or_else(|| StoreError::ProjectNotFound(id.to_string()))
    }

    fn category_slot<'p>(
        project: &'p mut Project,
        category: &str,
    ) -> Result<&'p mut WorldbuildingCategory, StoreError> {
        let index =
            category_index(category).ok_or_else(|| StoreError::UnknownCategory(category.to_string()))?;
        if project.worldbuilding.len() <= index {
            project.worldbuilding.resize(index + 1, Default::default());
        }
        Ok(&mut project.worldbuilding[index])
    }
}

impl BookStore for MemoryBookStore {
    fn create_project(&mut self, id: &str, name: &str) -> Result<(), StoreError> {
        if self.projects.contains_key(id) {
            return Err(StoreError::ProjectExists(id.to_string()));
        }
        self.projects.insert(id.to_string(), Project::new(id, name));
        self.order.push(id.to_string());
        Ok(())
    }

    fn rename_project(&mut self, id: &str, new_name: &str) -> Result<(), StoreError> {
        self.project_mut(id)?.name = new_name.to_string();
        Ok(())
    }

    fn delete_project(&mut self, id: &str) -> Result<(), StoreError> {
        self.projects
            .remove(id)
            .ok_or_else(|| StoreError::ProjectNotFound(id.to_string()))?;
        self.setup_answers.remove(id);
        self.order.retain(|p| p != id);
        Ok(())
    }

    fn get_project(&self, id: &str) -> Result<Project, StoreError> {
        self.projects
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::ProjectNotFound(id.to_string()))
    }

    fn get_all_projects(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self
            .order
            .iter()
            .filter_map(|id| self.projects.get(id).cloned())
            .collect())
    }

    fn add_character(&mut self, project_id: &str, record: &CharacterRecord) -> Result<(), StoreError> {
        let project = self.project_mut(project_id)?;
        let key = record.name.to_lowercase();
        if project
            .characters
            .iter()
            .any(|c| c.name.to_lowercase() == key)
        {
            return Err(StoreError::DuplicateCharacter {
                project: project_id.to_string(),
                name: record.name.clone(),
            });
        }
        project.characters.push(record.clone());
        Ok(())
    }

    fn update_character(&mut self, project_id: &str, record: &CharacterRecord) -> Result<(), StoreError> {
        let project = self.project_mut(project_id)?;
        let key = record.name.to_lowercase();
        let existing = project
            .characters
            .iter_mut()
            .find(|c| c.name.to_lowercase() == key)
            .ok_or_else(|| StoreError::CharacterNotFound {
                project: project_id.to_string(),
                name: record.name.clone(),
            })?;
        *existing = record.clone();
        Ok(())
    }

    fn add_worldbuilding_note(
        &mut self,
        project_id: &str,
        category: &str,
        note: &str,
    ) -> Result<(), StoreError> {
        let project = self.project_mut(project_id)?;
        Self::category_slot(project, category)?
            .freeform_notes
            .push(note.to_string());
        Ok(())
    }

    fn update_worldbuilding_category(
        &mut self,
        project_id: &str,
        category: &str,
        description: &str,
    ) -> Result<(), StoreError> {
        let project = self.project_mut(project_id)?;
        Self::category_slot(project, category)?.description = description.to_string();
        Ok(())
    }

    fn save_prologue(&mut self, project_id: &str, prologue: &Prologue) -> Result<(), StoreError> {
        self.project_mut(project_id)?.prologue = Some(prologue.clone());
        Ok(())
    }

    fn save_book_setup_answers(
        &mut self,
        project_id: &str,
        answers: &BookSetupAnswers,
    ) -> Result<(), StoreError> {
        self.project_mut(project_id)?;
        self.setup_answers
            .insert(project_id.to_string(), answers.clone());
        Ok(())
    }

    fn get_book_setup_answers(&self, project_id: &str) -> Result<Option<BookSetupAnswers>, StoreError> {
        if !self.projects.contains_key(project_id) {
            return Err(StoreError::ProjectNotFound(project_id.to_string()));
        }
        Ok(self.setup_answers.get(project_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn store_with_project() -> MemoryBookStore {
        let mut store = MemoryBookStore::new();
        store.create_project("p1", "Midnight Vows").unwrap();
        store
    }

    #[test]
    fn project_lifecycle() {
        let mut store = store_with_project();
        store.create_project("p2", "Second").unwrap();
        assert_matches!(store.create_project("p1", "Again"), Err(StoreError::ProjectExists(_)));

        store.rename_project("p1", "Midnight Oaths").unwrap();
        assert_eq!(store.get_project("p1").unwrap().name, "Midnight Oaths");

        let ids: Vec<String> = store.get_all_projects().unwrap().into_iter().map(|p| p.id).collect();
        assert_eq!(ids, vec!["p1", "p2"]);

        store.delete_project("p1").unwrap();
        assert_matches!(store.get_project("p1"), Err(StoreError::ProjectNotFound(_)));
        assert_eq!(store.get_all_projects().unwrap().len(), 1);
    }

    #[test]
    fn characters_are_unique_per_project() {
        let mut store = store_with_project();
        store.add_character("p1", &CharacterRecord::new("Kai")).unwrap();
        assert_matches!(
            store.add_character("p1", &CharacterRecord::new("KAI")),
            Err(StoreError::DuplicateCharacter { .. })
        );
        assert_matches!(
            store.add_character("nope", &CharacterRecord::new("Kai")),
            Err(StoreError::ProjectNotFound(_))
        );
    }

    #[test]
    fn update_character_replaces_fields() {
        let mut store = store_with_project();
        store.add_character("p1", &CharacterRecord::new("Kai")).unwrap();
        let mut updated = CharacterRecord::new("Kai");
        updated.voice = "Soft-spoken.".to_string();
        store.update_character("p1", &updated).unwrap();
        assert_eq!(store.get_project("p1").unwrap().characters[0].voice, "Soft-spoken.");

        assert_matches!(
            store.update_character("p1", &CharacterRecord::new("Mira")),
            Err(StoreError::CharacterNotFound { .. })
        );
    }

    #[test]
    fn update_character_matches_names_like_add() {
        let mut store = store_with_project();
        store.add_character("p1", &CharacterRecord::new("Kai")).unwrap();
        let mut updated = CharacterRecord::new("KAI");
        updated.flaws = "Stubborn.".to_string();
        store.update_character("p1", &updated).unwrap();

        let characters = store.get_project("p1").unwrap().characters;
        assert_eq!(characters.len(), 1);
        assert_eq!(characters[0].flaws, "Stubborn.");
    }

    #[test]
    fn worldbuilding_updates() {
        let mut store = store_with_project();
        store
            .update_worldbuilding_category("p1", "Geography", "Islands in a cold sea.")
            .unwrap();
        store.add_worldbuilding_note("p1", "Geography", "Ferries stop in winter.").unwrap();
        assert_matches!(
            store.add_worldbuilding_note("p1", "Cuisine", "Fish."),
            Err(StoreError::UnknownCategory(_))
        );

        let project = store.get_project("p1").unwrap();
        let geography = project.category("Geography").unwrap();
        assert_eq!(geography.description, "Islands in a cold sea.");
        assert_eq!(geography.freeform_notes, vec!["Ferries stop in winter."]);
    }

    #[test]
    fn prologue_and_setup_answers() {
        let mut store = store_with_project();
        assert_eq!(store.get_book_setup_answers("p1").unwrap(), None);

        let answers = BookSetupAnswers {
            has_prologue: true,
            ..Default::default()
        };
        store.save_book_setup_answers("p1", &answers).unwrap();
        assert_eq!(store.get_book_setup_answers("p1").unwrap(), Some(answers));

        let prologue = Prologue {
            hook: "A letter arrives.".to_string(),
            ..Default::default()
        };
        store.save_prologue("p1", &prologue).unwrap();
        assert_eq!(store.get_project("p1").unwrap().prologue, Some(prologue));
    }

    #[test]
    fn batch_stops_at_first_failure() {
        let mut store = store_with_project();
        store.add_character("p1", &CharacterRecord::new("Mira")).unwrap();

        let batch = vec![
            CharacterRecord::new("Kai"),
            CharacterRecord::new("Mira"),
            CharacterRecord::new("Jun"),
        ];
        let err = store.batch_create_characters("p1", &batch).unwrap_err();
        assert_eq!(err.created, 1);
        assert_eq!(err.total, 3);
        assert_eq!(err.failed_name, "Mira");
        assert_matches!(err.source, StoreError::DuplicateCharacter { .. });

        let names: Vec<String> = store
            .get_project("p1")
            .unwrap()
            .characters
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["Mira", "Kai"]);
    }

    #[test]
    fn batch_creates_all_in_order() {
        let mut store = store_with_project();
        let batch = vec![CharacterRecord::new("Kai"), CharacterRecord::new("Jun")];
        assert_eq!(store.batch_create_characters("p1", &batch).unwrap(), 2);
        assert_eq!(store.get_project("p1").unwrap().characters.len(), 2);
    }
}

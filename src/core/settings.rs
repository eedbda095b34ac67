/// User preferences and questionnaire drafts over injected key/value storage.

use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use rustc_hash::FxHashMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::schema::project::Project;

pub const SELECTED_PROJECT_KEY: &str = "selectedProjectId";
pub const CUSTOM_CATEGORIES_KEY: &str = "legendary-lovers-custom-categories";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("storage error: {0}")]
    Storage(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("category name is required")]
    EmptyCategoryName,
}

/// String key/value persistence, e.g. browser local storage or a file.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError>;
    fn remove(&mut self, key: &str) -> Result<(), SettingsError>;
}

impl<S: KeyValueStore + ?Sized> KeyValueStore for &mut S {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        (**self).get(key)
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        (**self).set(key, value)
    }

    fn remove(&mut self, key: &str) -> Result<(), SettingsError> {
        (**self).remove(key)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: FxHashMap<String, String>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, SettingsError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), SettingsError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), SettingsError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// A workspace category: a built-in genre or one the user added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub is_custom: bool,
}

/// Built-in genres as `(id, label, icon)`.
pub const BUILT_IN_GENRES: [(&str, &str, &str); 8] = [
    ("dark-romance", "Dark Romance", "Moon"),
    ("romance", "Romance", "Heart"),
    ("romantasy", "Romantasy", "Sparkles"),
    ("rom-com", "Rom-Com", "Laugh"),
    ("thriller", "Thriller", "Zap"),
    ("psychological", "Psychological Thriller", "Brain"),
    ("fanfiction", "Fanfiction", "BookHeart"),
    ("music", "Music", "Music"),
];

/// `custom-<slug>-<millis>-<7 random chars>`, where the slug is the
/// lower-cased name with anything but `[a-z0-9]` replaced by `-`, cut to 20
/// characters.
pub fn generate_safe_id(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_lowercase() || c.is_ascii_digit() { c } else { '-' })
        .take(20)
        .collect();
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(7)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("custom-{}-{}-{}", slug, Utc::now().timestamp_millis(), suffix)
}

/// Selected project and custom categories.
pub struct Preferences<S> {
    storage: S,
}

impl<S: KeyValueStore> Preferences<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn into_inner(self) -> S {
        self.storage
    }

    pub fn selected_project(&self) -> Result<Option<String>, SettingsError> {
        self.storage.get(SELECTED_PROJECT_KEY)
    }

    /// `None` clears the selection.
    pub fn set_selected_project(&mut self, id: Option<&str>) -> Result<(), SettingsError> {
        match id {
            Some(id) => self.storage.set(SELECTED_PROJECT_KEY, id),
            None => self.storage.remove(SELECTED_PROJECT_KEY),
        }
    }

    /// Point the selection at a project that exists. With no selection, or
    /// a selection that is gone, the first project is chosen. An empty
    /// project list leaves the selection alone.
    pub fn reconcile_selection(&mut self, projects: &[Project]) -> Result<Option<String>, SettingsError> {
        let selected = self.selected_project()?;
        let Some(first) = projects.first() else {
            return Ok(selected);
        };
        match selected {
            Some(id) if projects.iter().any(|p| p.id == id) => Ok(Some(id)),
            stale => {
                if let Some(id) = &stale {
                    tracing::debug!(stale = %id, selected = %first.id, "Selected project no longer exists");
                }
                self.set_selected_project(Some(&first.id))?;
                Ok(Some(first.id.clone()))
            }
        }
    }

    /// User-added categories. Unreadable data counts as none.
    pub fn custom_categories(&self) -> Result<Vec<Category>, SettingsError> {
        let Some(raw) = self.storage.get(CUSTOM_CATEGORIES_KEY)? else {
            return Ok(Vec::new());
        };
        match serde_json::from_str(&raw) {
            Ok(categories) => Ok(categories),
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load custom categories");
                Ok(Vec::new())
            }
        }
    }

    fn save_custom_categories(&mut self, categories: &[Category]) -> Result<(), SettingsError> {
        let json = serde_json::to_string(categories)?;
        self.storage.set(CUSTOM_CATEGORIES_KEY, &json)
    }

    /// Add a category under the trimmed name. Returns its generated id.
    pub fn add_custom_category(&mut self, name: &str) -> Result<String, SettingsError> {
        let label = name.trim();
        if label.is_empty() {
            return Err(SettingsError::EmptyCategoryName);
        }
        let category = Category {
            id: generate_safe_id(label),
            label: label.to_string(),
            icon: None,
            is_custom: true,
        };
        let id = category.id.clone();
        let mut categories = self.custom_categories()?;
        categories.push(category);
        self.save_custom_categories(&categories)?;
        Ok(id)
    }

    pub fn remove_custom_category(&mut self, id: &str) -> Result<(), SettingsError> {
        let mut categories = self.custom_categories()?;
        categories.retain(|c| c.id != id);
        self.save_custom_categories(&categories)
    }

    /// Built-in genres first, then custom categories in the order added.
    pub fn all_categories(&self) -> Result<Vec<Category>, SettingsError> {
        let mut all: Vec<Category> = BUILT_IN_GENRES
            .iter()
            .map(|(id, label, icon)| Category {
                id: id.to_string(),
                label: label.to_string(),
                icon: Some(icon.to_string()),
                is_custom: false,
            })
            .collect();
        all.extend(self.custom_categories()?);
        Ok(all)
    }

    pub fn category_label(&self, id: &str) -> Result<Option<String>, SettingsError> {
        Ok(self
            .all_categories()?
            .into_iter()
            .find(|c| c.id == id)
            .map(|c| c.label))
    }

    pub fn category_exists(&self, id: &str) -> Result<bool, SettingsError> {
        Ok(self.all_categories()?.iter().any(|c| c.id == id))
    }
}

/// Saved progress for a single-character questionnaire, keyed by project
/// and character slot.
pub struct DraftStore<S> {
    storage: S,
}

impl<S: KeyValueStore> DraftStore<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    pub fn into_inner(self) -> S {
        self.storage
    }

    pub fn draft_key(project_id: &str, slot: usize) -> String {
        format!("character-questionnaire-{}-{}", project_id, slot)
    }

    pub fn save<T: Serialize>(&mut self, project_id: &str, slot: usize, draft: &T) -> Result<(), SettingsError> {
        let json = serde_json::to_string(draft)?;
        self.storage.set(&Self::draft_key(project_id, slot), &json)?;
        tracing::debug!(project = project_id, slot, "Draft saved");
        Ok(())
    }

    /// A draft that no longer parses is treated as absent.
    pub fn load<T: DeserializeOwned>(&self, project_id: &str, slot: usize) -> Result<Option<T>, SettingsError> {
        let Some(raw) = self.storage.get(&Self::draft_key(project_id, slot))? else {
            return Ok(None);
        };
        match serde_json::from_str(&raw) {
            Ok(draft) => Ok(Some(draft)),
            Err(e) => {
                tracing::warn!(project = project_id, slot, error = %e, "Failed to load draft");
                Ok(None)
            }
        }
    }

    pub fn clear(&mut self, project_id: &str, slot: usize) -> Result<(), SettingsError> {
        self.storage.remove(&Self::draft_key(project_id, slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn selection_round_trip() {
        let mut prefs = Preferences::new(MemoryKeyValueStore::new());
        assert_eq!(prefs.selected_project().unwrap(), None);
        prefs.set_selected_project(Some("p2")).unwrap();
        assert_eq!(prefs.selected_project().unwrap().as_deref(), Some("p2"));
        prefs.set_selected_project(None).unwrap();
        assert_eq!(prefs.selected_project().unwrap(), None);
    }

    #[test]
    fn reconcile_picks_first_project() {
        let projects = vec![Project::new("p1", "One"), Project::new("p2", "Two")];
        let mut prefs = Preferences::new(MemoryKeyValueStore::new());
        assert_eq!(prefs.reconcile_selection(&projects).unwrap().as_deref(), Some("p1"));

        prefs.set_selected_project(Some("p2")).unwrap();
        assert_eq!(prefs.reconcile_selection(&projects).unwrap().as_deref(), Some("p2"));

        prefs.set_selected_project(Some("gone")).unwrap();
        assert_eq!(prefs.reconcile_selection(&projects).unwrap().as_deref(), Some("p1"));
        assert_eq!(prefs.selected_project().unwrap().as_deref(), Some("p1"));
    }

    #[test]
    fn reconcile_keeps_selection_without_projects() {
        let mut prefs = Preferences::new(MemoryKeyValueStore::new());
        prefs.set_selected_project(Some("p9")).unwrap();
        assert_eq!(prefs.reconcile_selection(&[]).unwrap().as_deref(), Some("p9"));
    }

    #[test]
    fn custom_categories() {
        let mut prefs = Preferences::new(MemoryKeyValueStore::new());
        assert_matches!(prefs.add_custom_category("   "), Err(SettingsError::EmptyCategoryName));

        let id = prefs.add_custom_category("  Space Opera  ").unwrap();
        assert!(id.starts_with("custom-space-opera-"));
        assert_eq!(prefs.category_label(&id).unwrap().as_deref(), Some("Space Opera"));
        assert!(prefs.category_exists("music").unwrap());
        assert_eq!(prefs.all_categories().unwrap().len(), BUILT_IN_GENRES.len() + 1);

        prefs.remove_custom_category(&id).unwrap();
        assert!(!prefs.category_exists(&id).unwrap());
    }

    #[test]
    fn corrupt_categories_read_as_empty() {
        let mut storage = MemoryKeyValueStore::new();
        storage.set(CUSTOM_CATEGORIES_KEY, "not json").unwrap();
        let prefs = Preferences::new(storage);
        assert!(prefs.custom_categories().unwrap().is_empty());
    }

    #[test]
    fn safe_ids() {
        let id = generate_safe_id("Über Long Category Name!!");
        assert!(id.starts_with("custom--ber-long-category-n-"));
        assert_eq!(id.rsplit('-').next().map(str::len), Some(7));
    }

    #[test]
    fn drafts_share_storage_with_preferences() {
        let mut storage = MemoryKeyValueStore::new();
        {
            let mut drafts = DraftStore::new(&mut storage);
            drafts.save("p1", 0, &vec!["a", "b"]).unwrap();
        }
        Preferences::new(&mut storage)
            .set_selected_project(Some("p1"))
            .unwrap();
        assert_eq!(storage.len(), 2);

        let mut drafts = DraftStore::new(&mut storage);
        let loaded: Option<Vec<String>> = drafts.load("p1", 0).unwrap();
        assert_eq!(loaded, Some(vec!["a".to_string(), "b".to_string()]));
        assert_eq!(drafts.load::<Vec<String>>("p1", 1).unwrap(), None);

        drafts.clear("p1", 0).unwrap();
        assert_eq!(drafts.load::<Vec<String>>("p1", 0).unwrap(), None);
    }

    #[test]
    fn draft_key_format() {
        assert_eq!(
            DraftStore::<MemoryKeyValueStore>::draft_key("p1", 3),
            "character-questionnaire-p1-3"
        );
    }
}

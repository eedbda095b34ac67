/// The workshop: a registry of questionnaires and the entry point for
/// generating character records. Built via `Workshop::builder()`.
///
/// Built-in questionnaires load first, then questionnaire directories under
/// the configured data dir replace or extend them.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::assembler::ProfileAssembler;
use crate::core::builtin::{self, BUILTIN_IDS};
use crate::core::questionnaire::{Questionnaire, QuestionnaireError, DEFAULT_CHARACTER_NAME};
use crate::core::template::{FieldSpecSet, TemplateError};
use crate::core::wizard::Wizard;
use crate::schema::answer::AnswerStore;
use crate::schema::character::{CharacterRecord, PersonDraft};

#[derive(Debug, Error)]
pub enum WorkshopError {
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("questionnaire error: {0}")]
    Questionnaire(#[from] QuestionnaireError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("unknown questionnaire: {0}")]
    UnknownQuestionnaire(String),
}

/// Workshop settings, usually read from a `workshop.ron` file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkshopConfig {
    /// Built-in questionnaires to load.
    pub builtins: Vec<String>,
    /// Directory of questionnaire overrides, one subdirectory each.
    pub data_dir: Option<PathBuf>,
    /// Replaces the generic "Unnamed Character" fallback name.
    pub default_character_name: Option<String>,
    /// Overrides the band questionnaire's minimum roster size.
    pub band_min_members: Option<usize>,
}

impl Default for WorkshopConfig {
    fn default() -> Self {
        Self {
            builtins: BUILTIN_IDS.iter().map(|id| id.to_string()).collect(),
            data_dir: None,
            default_character_name: None,
            band_min_members: None,
        }
    }
}

impl WorkshopConfig {
    pub fn load_from_ron(path: &Path) -> Result<WorkshopConfig, WorkshopError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<WorkshopConfig, WorkshopError> {
        Ok(ron::from_str(input)?)
    }
}

#[derive(Debug)]
pub struct Workshop {
    questionnaires: FxHashMap<String, Questionnaire>,
    /// Registration order, for listings.
    order: Vec<String>,
}

pub struct WorkshopBuilder {
    config: WorkshopConfig,
    /// Directly provided questionnaires (for testing without files).
    questionnaires: Vec<Questionnaire>,
}

impl Workshop {
    pub fn builder() -> WorkshopBuilder {
        WorkshopBuilder {
            config: WorkshopConfig::default(),
            questionnaires: Vec::new(),
        }
    }

    pub fn questionnaire(&self, id: &str) -> Result<&Questionnaire, WorkshopError> {
        self.questionnaires
            .get(id)
            .ok_or_else(|| WorkshopError::UnknownQuestionnaire(id.to_string()))
    }

    /// Questionnaire ids in registration order.
    pub fn ids(&self) -> Vec<&str> {
        self.order.iter().map(String::as_str).collect()
    }

    pub fn questionnaires(&self) -> impl Iterator<Item = &Questionnaire> {
        self.order.iter().filter_map(|id| self.questionnaires.get(id))
    }

    /// Build one person's record.
    pub fn generate(
        &self,
        questionnaire: &str,
        group: &AnswerStore,
        person: &PersonDraft,
        people: &[PersonDraft],
    ) -> Result<CharacterRecord, WorkshopError> {
        let questionnaire = self.questionnaire(questionnaire)?;
        Ok(ProfileAssembler::new(questionnaire).assemble(group, person, people))
    }

    /// Build every roster entry's record, in roster order.
    pub fn generate_all(
        &self,
        questionnaire: &str,
        group: &AnswerStore,
        people: &[PersonDraft],
    ) -> Result<Vec<CharacterRecord>, WorkshopError> {
        let questionnaire = self.questionnaire(questionnaire)?;
        Ok(ProfileAssembler::new(questionnaire).assemble_all(group, people))
    }

    pub fn wizard(&self, questionnaire: &str) -> Result<Wizard<'_>, WorkshopError> {
        Ok(Wizard::new(self.questionnaire(questionnaire)?))
    }

    fn register(&mut self, questionnaire: Questionnaire) {
        if !self.questionnaires.contains_key(&questionnaire.id) {
            self.order.push(questionnaire.id.clone());
        }
        self.questionnaires
            .insert(questionnaire.id.clone(), questionnaire);
    }
}

impl WorkshopBuilder {
    pub fn builtins(mut self, ids: &[&str]) -> Self {
        self.config.builtins = ids.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn data_dir(mut self, path: impl AsRef<Path>) -> Self {
        self.config.data_dir = Some(path.as_ref().to_path_buf());
        self
    }

    pub fn default_character_name(mut self, name: &str) -> Self {
        self.config.default_character_name = Some(name.to_string());
        self
    }

    pub fn band_min_members(mut self, min: usize) -> Self {
        self.config.band_min_members = Some(min);
        self
    }

    /// Replace every setting at once.
    pub fn config(mut self, config: WorkshopConfig) -> Self {
        self.config = config;
        self
    }

    /// Provide a questionnaire directly (for testing without files).
    pub fn with_questionnaire(mut self, questionnaire: Questionnaire) -> Self {
        self.questionnaires.push(questionnaire);
        self
    }

    pub fn build(self) -> Result<Workshop, WorkshopError> {
        let mut workshop = Workshop {
            questionnaires: FxHashMap::default(),
            order: Vec::new(),
        };

        for id in &self.config.builtins {
            workshop.register(builtin::load(id)?);
        }

        // On-disk questionnaires override built-ins
        if let Some(ref dir) = self.config.data_dir {
            if dir.exists() {
                load_questionnaire_dirs(dir, |path| {
                    let id = path
                        .file_name()
                        .and_then(|s| s.to_str())
                        .unwrap_or_default()
                        .to_string();
                    if path.join("questionnaire.ron").exists() {
                        workshop.register(Questionnaire::load_from_dir(path)?);
                    } else if path.join("fields.ron").exists() {
                        let fields = FieldSpecSet::load_from_ron(&path.join("fields.ron"))?;
                        match workshop.questionnaires.get_mut(&id) {
                            Some(existing) => existing.fields.merge(fields),
                            None => return Err(WorkshopError::UnknownQuestionnaire(id)),
                        }
                        tracing::debug!(questionnaire = %id, "Merged field templates");
                    }
                    Ok(())
                })?;
            } else {
                tracing::warn!(dir = %dir.display(), "Questionnaire data dir does not exist");
            }
        }

        for questionnaire in self.questionnaires {
            workshop.register(questionnaire);
        }

        if let Some(ref name) = self.config.default_character_name {
            for questionnaire in workshop.questionnaires.values_mut() {
                if questionnaire.naming.default_name == DEFAULT_CHARACTER_NAME {
                    questionnaire.naming.default_name = name.clone();
                }
            }
        }
        if let Some(min) = self.config.band_min_members {
            if let Some(band) = workshop.questionnaires.get_mut("band") {
                band.rules.min_people = min;
            }
        }

        tracing::info!(questionnaires = workshop.order.len(), "Workshop ready");
        Ok(workshop)
    }
}

/// Call `loader` for every subdirectory of `dir`, in name order.
fn load_questionnaire_dirs<F>(dir: &Path, mut loader: F) -> Result<(), WorkshopError>
where
    F: FnMut(&Path) -> Result<(), WorkshopError>,
{
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_dir() {
            paths.push(path);
        }
    }
    paths.sort();
    for path in paths {
        loader(&path)?;
    }
    Ok(())
}

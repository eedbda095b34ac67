use serde::{Deserialize, Serialize};

use super::character::CharacterRecord;

/// The fixed worldbuilding categories, in display order.
pub const WORLDBUILDING_CATEGORIES: [&str; 7] = [
    "Setting",
    "History",
    "Culture/Society",
    "Geography",
    "Politics/Power",
    "Rules/Systems",
    "Themes/Tone",
];

pub fn category_index(name: &str) -> Option<usize> {
    WORLDBUILDING_CATEGORIES.iter().position(|c| *c == name)
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorldbuildingCategory {
    pub description: String,
    #[serde(default)]
    pub freeform_notes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prologue {
    pub hook: String,
    pub pov_voice: String,
    pub stakes: String,
    pub key_reveals: String,
    pub connection_to_chapter_one: String,
    pub draft: String,
}

/// A book project. `worldbuilding` is positional, one entry per
/// [`WORLDBUILDING_CATEGORIES`] name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub characters: Vec<CharacterRecord>,
    #[serde(default)]
    pub worldbuilding: Vec<WorldbuildingCategory>,
    #[serde(default)]
    pub prologue: Option<Prologue>,
}

impl Project {
    pub fn new(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            characters: Vec::new(),
            worldbuilding: vec![WorldbuildingCategory::default(); WORLDBUILDING_CATEGORIES.len()],
            prologue: None,
        }
    }

    pub fn character(&self, name: &str) -> Option<&CharacterRecord> {
        self.characters.iter().find(|c| c.name == name)
    }

    pub fn category(&self, name: &str) -> Option<&WorldbuildingCategory> {
        category_index(name).and_then(|i| self.worldbuilding.get(i))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSetupCharacterAnswers {
    pub name: String,
    pub background: String,
    pub motivations: String,
    pub relationships: String,
    pub flaws: String,
    pub voice: String,
    pub role: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSetupWorldbuildingAnswers {
    pub category_name: String,
    pub description: String,
    #[serde(default)]
    pub freeform_notes: Vec<String>,
}

/// Onboarding answers saved once per project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookSetupAnswers {
    pub characters: Vec<BookSetupCharacterAnswers>,
    pub worldbuilding: Vec<BookSetupWorldbuildingAnswers>,
    pub has_prologue: bool,
}

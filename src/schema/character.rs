use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::answer::AnswerStore;

/// The six narrative fields of a character profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NarrativeField {
    Background,
    Motivations,
    Relationships,
    Flaws,
    Voice,
    StoryRole,
}

impl NarrativeField {
    pub const ALL: [NarrativeField; 6] = [
        Self::Background,
        Self::Motivations,
        Self::Relationships,
        Self::Flaws,
        Self::Voice,
        Self::StoryRole,
    ];

    /// Key used in field template files.
    pub fn key(self) -> &'static str {
        match self {
            Self::Background => "background",
            Self::Motivations => "motivations",
            Self::Relationships => "relationships",
            Self::Flaws => "flaws",
            Self::Voice => "voice",
            Self::StoryRole => "story_role",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.key() == key)
    }

    /// Heading used when the field is exported.
    pub fn heading(self) -> &'static str {
        match self {
            Self::Background => "Background & Identity",
            Self::Motivations => "Motivations & Goals",
            Self::Relationships => "Relationships",
            Self::Flaws => "Conflicts & Flaws",
            Self::Voice => "Voice & Dialogue",
            Self::StoryRole => "Story Role & Arc",
        }
    }
}

/// A finished character as the book store keeps it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterRecord {
    pub name: String,
    pub background: String,
    pub motivations: String,
    pub relationships: String,
    pub flaws: String,
    pub voice: String,
    pub story_role: String,
}

impl CharacterRecord {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn field(&self, field: NarrativeField) -> &str {
        match field {
            NarrativeField::Background => &self.background,
            NarrativeField::Motivations => &self.motivations,
            NarrativeField::Relationships => &self.relationships,
            NarrativeField::Flaws => &self.flaws,
            NarrativeField::Voice => &self.voice,
            NarrativeField::StoryRole => &self.story_role,
        }
    }

    pub fn set_field(&mut self, field: NarrativeField, text: String) {
        let slot = match field {
            NarrativeField::Background => &mut self.background,
            NarrativeField::Motivations => &mut self.motivations,
            NarrativeField::Relationships => &mut self.relationships,
            NarrativeField::Flaws => &mut self.flaws,
            NarrativeField::Voice => &mut self.voice,
            NarrativeField::StoryRole => &mut self.story_role,
        };
        *slot = text;
    }
}

/// Family role of a person in a multi-character roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FamilyRole {
    Mother,
    Father,
    Son,
    Daughter,
    Grandparent,
    Child,
    Other,
}

impl FamilyRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Mother => "mother",
            Self::Father => "father",
            Self::Son => "son",
            Self::Daughter => "daughter",
            Self::Grandparent => "grandparent",
            Self::Child => "child",
            Self::Other => "other",
        }
    }

    /// How a child in this role is named in prose: "son", "daughter" or "child".
    pub fn child_noun(self) -> &'static str {
        match self {
            Self::Son => "son",
            Self::Daughter => "daughter",
            _ => "child",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Male => "male",
            Self::Female => "female",
            Self::Other => "other",
        }
    }

    pub fn noun(self) -> &'static str {
        match self {
            Self::Male => "man",
            Self::Female => "woman",
            Self::Other => "person",
        }
    }
}

/// An in-progress person in a questionnaire roster.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonDraft {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: Option<FamilyRole>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub answers: AnswerStore,
    #[serde(default)]
    pub is_main_character: bool,
    #[serde(default)]
    pub parent_ids: Vec<String>,
}

impl PersonDraft {
    pub fn new(name: &str) -> Self {
        Self::with_id(&generate_person_id(), name)
    }

    pub fn with_id(id: &str, name: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            role: None,
            gender: None,
            answers: AnswerStore::new(),
            is_main_character: false,
            parent_ids: Vec::new(),
        }
    }

    pub fn role(mut self, role: FamilyRole) -> Self {
        self.role = Some(role);
        self
    }

    pub fn gender(mut self, gender: Gender) -> Self {
        self.gender = Some(gender);
        self
    }

    pub fn main_character(mut self, parent_ids: &[&str]) -> Self {
        self.is_main_character = true;
        self.parent_ids = parent_ids.iter().map(|id| id.to_string()).collect();
        self
    }
}

/// `person-<millis>-<9 random chars>`, unique enough for a roster.
pub fn generate_person_id() -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(9)
        .map(|c| char::from(c).to_ascii_lowercase())
        .collect();
    format!("person-{}-{}", Utc::now().timestamp_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_keys_round_trip() {
        for field in NarrativeField::ALL {
            assert_eq!(NarrativeField::from_key(field.key()), Some(field));
        }
        assert_eq!(NarrativeField::from_key("storyRole"), None);
    }

    #[test]
    fn set_and_read_fields() {
        let mut record = CharacterRecord::new("Mara");
        record.set_field(NarrativeField::StoryRole, "The mentor.".to_string());
        assert_eq!(record.field(NarrativeField::StoryRole), "The mentor.");
        assert_eq!(record.field(NarrativeField::Voice), "");
    }

    #[test]
    fn record_serializes_camel_case() {
        let json = serde_json::to_value(CharacterRecord::new("Mara")).unwrap();
        assert!(json.get("storyRole").is_some());
        assert!(json.get("story_role").is_none());
    }

    #[test]
    fn child_nouns() {
        assert_eq!(FamilyRole::Son.child_noun(), "son");
        assert_eq!(FamilyRole::Daughter.child_noun(), "daughter");
        assert_eq!(FamilyRole::Child.child_noun(), "child");
    }

    #[test]
    fn person_ids_are_prefixed_and_distinct() {
        let a = generate_person_id();
        let b = generate_person_id();
        assert!(a.starts_with("person-"));
        assert_eq!(a.rsplit('-').next().map(str::len), Some(9));
        assert_ne!(a, b);
    }
}

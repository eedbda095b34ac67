/// Questionnaire definitions: question banks, field templates, setup rules,
/// and loading/linting of questionnaire data.

use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::template::{field_spec_from_ron, FieldSpec, FieldSpecSet, RonClause, TemplateError};
use crate::schema::character::{FamilyRole, NarrativeField};
use crate::schema::question::Question;

pub const DEFAULT_CHARACTER_NAME: &str = "Unnamed Character";

/// Slots the assembler fills for every person, whatever the questionnaire.
pub const STANDARD_SLOTS: [&str; 6] = [
    "name",
    "gender",
    "role",
    "is-main-character",
    "child-role",
    "parent-names",
];

#[derive(Debug, Error)]
pub enum QuestionnaireError {
    #[error("template error: {0}")]
    Template(#[from] TemplateError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("questionnaire '{questionnaire}' defines question '{question}' twice")]
    DuplicateQuestion {
        questionnaire: String,
        question: String,
    },
    #[error("unknown built-in questionnaire '{0}'")]
    UnknownBuiltin(String),
}

/// Main-character requirement for family-style rosters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MainCharacterRule {
    /// Roles the main character may have.
    pub eligible_roles: Vec<FamilyRole>,
    /// Roles a linked parent may have.
    pub parent_roles: Vec<FamilyRole>,
    #[serde(default)]
    pub require_parent: bool,
}

/// What a roster must look like before answering starts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SetupRules {
    pub min_people: usize,
    pub max_people: Option<usize>,
    pub require_names: bool,
    pub main_character: Option<MainCharacterRule>,
}

impl Default for SetupRules {
    fn default() -> Self {
        Self {
            min_people: 1,
            max_people: None,
            require_names: true,
            main_character: None,
        }
    }
}

/// Where a character's display name comes from when the roster entry
/// has none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Naming {
    /// Question whose answer names the character.
    pub question: Option<String>,
    pub default_name: String,
}

impl Default for Naming {
    fn default() -> Self {
        Self {
            question: None,
            default_name: DEFAULT_CHARACTER_NAME.to_string(),
        }
    }
}

/// A slot computed from other slots before the fields are composed.
#[derive(Debug, Clone, PartialEq)]
pub enum DerivedSlot {
    /// Compose a fragment from clauses, like a miniature field.
    Compose { slot: String, spec: FieldSpec },
    /// Copy `source` only when it differs from `unlike`.
    Distinct {
        slot: String,
        source: String,
        unlike: String,
    },
}

impl DerivedSlot {
    pub fn slot(&self) -> &str {
        match self {
            Self::Compose { slot, .. } | Self::Distinct { slot, .. } => slot,
        }
    }

    fn referenced_slots(&self) -> Vec<&str> {
        match self {
            Self::Compose { spec, .. } => spec
                .clauses
                .iter()
                .flat_map(|c| c.referenced_slots())
                .collect(),
            Self::Distinct { source, unlike, .. } => vec![source.as_str(), unlike.as_str()],
        }
    }
}

/// One questionnaire flow: group questions asked once, person questions
/// asked per roster entry, and the templates that turn answers into a
/// character record.
#[derive(Debug, Clone)]
pub struct Questionnaire {
    pub id: String,
    pub title: String,
    pub description: String,
    pub group_questions: Vec<Question>,
    pub person_questions: Vec<Question>,
    pub fields: FieldSpecSet,
    pub derived: Vec<DerivedSlot>,
    pub rules: SetupRules,
    pub naming: Naming,
}

// RON deserialization helpers.

fn default_joiner() -> String {
    " ".to_string()
}

#[derive(Debug, Deserialize)]
#[serde(rename = "Questionnaire")]
struct RonQuestionnaire {
    id: String,
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    group_questions: Vec<Question>,
    #[serde(default)]
    person_questions: Vec<Question>,
    #[serde(default)]
    derived: Vec<RonDerived>,
    #[serde(default)]
    rules: SetupRules,
    #[serde(default)]
    naming: Naming,
}

#[derive(Debug, Deserialize)]
enum RonDerived {
    Compose {
        slot: String,
        #[serde(default = "default_joiner")]
        joiner: String,
        #[serde(default)]
        terminator: String,
        clauses: Vec<RonClause>,
    },
    Distinct {
        slot: String,
        source: String,
        unlike: String,
    },
}

/// Findings from [`Questionnaire::lint`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LintReport {
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl LintReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }
}

impl Questionnaire {
    /// Parse a questionnaire and, optionally, its field templates.
    pub fn parse_ron(
        questionnaire: &str,
        fields: Option<&str>,
    ) -> Result<Questionnaire, QuestionnaireError> {
        let raw: RonQuestionnaire = ron::from_str(questionnaire)?;
        let fields = match fields {
            Some(input) => FieldSpecSet::parse_ron(input)?,
            None => FieldSpecSet::default(),
        };

        let mut derived = Vec::with_capacity(raw.derived.len());
        for entry in raw.derived {
            derived.push(match entry {
                RonDerived::Compose {
                    slot,
                    joiner,
                    terminator,
                    clauses,
                } => DerivedSlot::Compose {
                    slot,
                    spec: field_spec_from_ron(joiner, terminator, clauses)?,
                },
                RonDerived::Distinct {
                    slot,
                    source,
                    unlike,
                } => DerivedSlot::Distinct {
                    slot,
                    source,
                    unlike,
                },
            });
        }

        let mut seen = FxHashSet::default();
        for question in raw.group_questions.iter().chain(&raw.person_questions) {
            if !seen.insert(question.id.as_str()) {
                return Err(QuestionnaireError::DuplicateQuestion {
                    questionnaire: raw.id.clone(),
                    question: question.id.clone(),
                });
            }
        }

        Ok(Questionnaire {
            id: raw.id,
            title: raw.title,
            description: raw.description,
            group_questions: raw.group_questions,
            person_questions: raw.person_questions,
            fields,
            derived,
            rules: raw.rules,
            naming: raw.naming,
        })
    }

    /// Load `questionnaire.ron` (and `fields.ron` when present) from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Questionnaire, QuestionnaireError> {
        let questionnaire = std::fs::read_to_string(dir.join("questionnaire.ron"))?;
        let fields_path = dir.join("fields.ron");
        let fields = if fields_path.exists() {
            Some(std::fs::read_to_string(&fields_path)?)
        } else {
            None
        };
        let loaded = Self::parse_ron(&questionnaire, fields.as_deref())?;
        tracing::debug!(
            questionnaire = %loaded.id,
            dir = %dir.display(),
            questions = loaded.group_questions.len() + loaded.person_questions.len(),
            "Loaded questionnaire"
        );
        Ok(loaded)
    }

    /// Find a question in either bank.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.group_questions
            .iter()
            .chain(&self.person_questions)
            .find(|q| q.id == id)
    }

    /// Section names in the order they are first asked.
    pub fn sections(&self) -> Vec<&str> {
        let mut sections: Vec<&str> = Vec::new();
        for question in self.group_questions.iter().chain(&self.person_questions) {
            if !sections.contains(&question.section.as_str()) {
                sections.push(&question.section);
            }
        }
        sections
    }

    /// Every slot a template in this questionnaire may read.
    pub fn known_slots(&self) -> FxHashSet<&str> {
        self.group_questions
            .iter()
            .chain(&self.person_questions)
            .map(|q| q.id.as_str())
            .chain(STANDARD_SLOTS)
            .chain(self.derived.iter().map(DerivedSlot::slot))
            .collect()
    }

    /// Check the definition for broken references and suspicious data.
    pub fn lint(&self) -> LintReport {
        let mut report = LintReport::default();
        let known = self.known_slots();

        for question in self.group_questions.iter().chain(&self.person_questions) {
            lint_question(&self.id, question, &mut report);
        }

        if let Some(name_question) = &self.naming.question {
            if self.question(name_question).is_none() {
                report.errors.push(format!(
                    "[{}] naming question '{}' does not exist",
                    self.id, name_question
                ));
            }
        }

        if let Some(max) = self.rules.max_people {
            if max < self.rules.min_people {
                report.errors.push(format!(
                    "[{}] max_people ({}) is below min_people ({})",
                    self.id, max, self.rules.min_people
                ));
            }
        }
        if let Some(rule) = &self.rules.main_character {
            if rule.eligible_roles.is_empty() {
                report.errors.push(format!(
                    "[{}] main character rule allows no roles",
                    self.id
                ));
            }
            if rule.require_parent && rule.parent_roles.is_empty() {
                report.errors.push(format!(
                    "[{}] main character needs a parent but no parent roles are allowed",
                    self.id
                ));
            }
        }

        for derived in &self.derived {
            for slot in derived.referenced_slots() {
                if !known.contains(slot) {
                    report.errors.push(format!(
                        "[{}] derived slot '{}' references unknown slot '{}'",
                        self.id,
                        derived.slot(),
                        slot
                    ));
                }
            }
        }

        if !self.person_questions.is_empty() {
            if self.fields.is_empty() {
                report
                    .warnings
                    .push(format!("[{}] defines no field templates", self.id));
            } else {
                for field in NarrativeField::ALL {
                    if self.fields.get(field).is_none() {
                        report.warnings.push(format!(
                            "[{}] has no template for field '{}'",
                            self.id,
                            field.key()
                        ));
                    }
                }
            }
        }

        let mut used: FxHashSet<&str> = FxHashSet::default();
        for field in NarrativeField::ALL {
            let Some(spec) = self.fields.get(field) else {
                continue;
            };
            for clause in &spec.clauses {
                for slot in clause.referenced_slots() {
                    used.insert(slot);
                    if !known.contains(slot) {
                        report.errors.push(format!(
                            "[{}] field '{}' references unknown slot '{}'",
                            self.id,
                            field.key(),
                            slot
                        ));
                    }
                }
            }
        }
        for derived in &self.derived {
            used.extend(derived.referenced_slots());
        }
        if let Some(name_question) = &self.naming.question {
            used.insert(name_question.as_str());
        }

        if !self.fields.is_empty() {
            for question in self.group_questions.iter().chain(&self.person_questions) {
                if !used.contains(question.id.as_str()) {
                    report.warnings.push(format!(
                        "[{}] question '{}' is never used in a template",
                        self.id, question.id
                    ));
                }
            }
        }

        report
    }
}

fn lint_question(questionnaire: &str, question: &Question, report: &mut LintReport) {
    if question.kind.has_options() {
        if question.options.is_empty() {
            report.errors.push(format!(
                "[{}] question '{}' has no options",
                questionnaire, question.id
            ));
        }
        let mut values = FxHashSet::default();
        for option in &question.options {
            if !values.insert(option.value.as_str()) {
                report.errors.push(format!(
                    "[{}] question '{}' repeats option '{}'",
                    questionnaire, question.id, option.value
                ));
            }
        }
        if let Some(default) = &question.default_value {
            if question.option(default).is_none() {
                report.errors.push(format!(
                    "[{}] question '{}' defaults to unknown option '{}'",
                    questionnaire, question.id, default
                ));
            }
        }
    } else if !question.options.is_empty() {
        report.warnings.push(format!(
            "[{}] free-text question '{}' lists options that will never be shown",
            questionnaire, question.id
        ));
    }

    if question.text.trim().is_empty() {
        report.errors.push(format!(
            "[{}] question '{}' has no text",
            questionnaire, question.id
        ));
    }
}

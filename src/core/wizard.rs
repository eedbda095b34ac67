/// Questionnaire navigation: roster setup, question-by-question answering,
/// preview and batch submission.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::core::assembler::ProfileAssembler;
use crate::core::questionnaire::Questionnaire;
use crate::core::store::{BatchError, BookStore, StoreError};
use crate::core::validation::{validate_setup, validate_unique_names, ValidationError};
use crate::schema::answer::{Answer, AnswerError, AnswerStore};
use crate::schema::character::{CharacterRecord, PersonDraft};
use crate::schema::question::Question;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WizardStep {
    Setup,
    /// Index into the flattened question sequence.
    Answering(usize),
    Preview,
    Submitted,
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::Answering(i) => write!(f, "question {}", i + 1),
            Self::Preview => write!(f, "preview"),
            Self::Submitted => write!(f, "submitted"),
        }
    }
}

/// Whose answer a question collects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Group,
    /// Roster position.
    Person(usize),
}

#[derive(Debug, Error)]
pub enum WizardError {
    #[error("setup is incomplete: {0}")]
    Setup(#[from] ValidationError),
    #[error("cannot {action} during {step}")]
    WrongStep {
        action: &'static str,
        step: WizardStep,
    },
    #[error("invalid answer: {0}")]
    Answer(#[from] AnswerError),
    #[error("submission failed: {0}")]
    Batch(#[from] BatchError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("no person with id '{0}' in the roster")]
    UnknownPerson(String),
    #[error("draft belongs to questionnaire '{found}', not '{expected}'")]
    QuestionnaireMismatch { expected: String, found: String },
}

/// Serializable snapshot of an unfinished wizard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WizardDraft {
    pub questionnaire_id: String,
    pub step: WizardStep,
    #[serde(default)]
    pub group_answers: AnswerStore,
    #[serde(default)]
    pub people: Vec<PersonDraft>,
}

/// One run through a questionnaire. Group questions come first, then each
/// person's questions in roster order.
#[derive(Debug)]
pub struct Wizard<'a> {
    questionnaire: &'a Questionnaire,
    step: WizardStep,
    group: AnswerStore,
    people: Vec<PersonDraft>,
}

impl<'a> Wizard<'a> {
    pub fn new(questionnaire: &'a Questionnaire) -> Self {
        Self {
            questionnaire,
            step: WizardStep::Setup,
            group: AnswerStore::new(),
            people: Vec::new(),
        }
    }

    pub fn questionnaire(&self) -> &'a Questionnaire {
        self.questionnaire
    }

    pub fn step(&self) -> WizardStep {
        self.step
    }

    pub fn people(&self) -> &[PersonDraft] {
        &self.people
    }

    pub fn group_answers(&self) -> &AnswerStore {
        &self.group
    }

    fn require_setup(&self, action: &'static str) -> Result<(), WizardError> {
        match self.step {
            WizardStep::Setup => Ok(()),
            step => Err(WizardError::WrongStep { action, step }),
        }
    }

    pub fn add_person(&mut self, person: PersonDraft) -> Result<(), WizardError> {
        self.require_setup("add a person")?;
        self.people.push(person);
        Ok(())
    }

    pub fn remove_person(&mut self, id: &str) -> Result<PersonDraft, WizardError> {
        self.require_setup("remove a person")?;
        let pos = self
            .people
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| WizardError::UnknownPerson(id.to_string()))?;
        let removed = self.people.remove(pos);
        for person in &mut self.people {
            person.parent_ids.retain(|parent| parent != id);
        }
        Ok(removed)
    }

    /// Edit a roster entry (name, role, main-character links) during setup.
    pub fn person_mut(&mut self, id: &str) -> Result<&mut PersonDraft, WizardError> {
        self.require_setup("edit a person")?;
        self.people
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| WizardError::UnknownPerson(id.to_string()))
    }

    /// Validate the roster and move to the first question.
    pub fn start(&mut self, existing: &[CharacterRecord]) -> Result<(), WizardError> {
        self.require_setup("start")?;
        validate_setup(&self.questionnaire.rules, &self.people, existing)?;
        self.step = if self.total_questions() == 0 {
            WizardStep::Preview
        } else {
            WizardStep::Answering(0)
        };
        tracing::debug!(
            questionnaire = %self.questionnaire.id,
            people = self.people.len(),
            questions = self.total_questions(),
            "Wizard started"
        );
        Ok(())
    }

    pub fn total_questions(&self) -> usize {
        self.questionnaire.group_questions.len()
            + self.people.len() * self.questionnaire.person_questions.len()
    }

    fn question_at(&self, index: usize) -> Option<(Scope, &'a Question)> {
        let questionnaire = self.questionnaire;
        let group = questionnaire.group_questions.len();
        if index < group {
            return Some((Scope::Group, &questionnaire.group_questions[index]));
        }
        let per_person = questionnaire.person_questions.len();
        if per_person == 0 {
            return None;
        }
        let offset = index - group;
        let person = offset / per_person;
        if person >= self.people.len() {
            return None;
        }
        Some((
            Scope::Person(person),
            &questionnaire.person_questions[offset % per_person],
        ))
    }

    /// The question on screen, if answering.
    pub fn current(&self) -> Option<(Scope, &'a Question)> {
        match self.step {
            WizardStep::Answering(i) => self.question_at(i),
            _ => None,
        }
    }

    /// Answers recorded so far for a scope.
    pub fn answers(&self, scope: Scope) -> Option<&AnswerStore> {
        match scope {
            Scope::Group => Some(&self.group),
            Scope::Person(i) => self.people.get(i).map(|p| &p.answers),
        }
    }

    fn current_target(&mut self, action: &'static str) -> Result<(&'a Question, &mut AnswerStore), WizardError> {
        let (scope, question) = self.current().ok_or(WizardError::WrongStep {
            action,
            step: self.step,
        })?;
        let store = match scope {
            Scope::Group => &mut self.group,
            Scope::Person(i) => &mut self.people[i].answers,
        };
        Ok((question, store))
    }

    /// Record a complete answer for the current question.
    pub fn answer(&mut self, answer: Answer) -> Result<(), WizardError> {
        let (question, store) = self.current_target("answer")?;
        store.record(question, answer)?;
        Ok(())
    }

    pub fn select(&mut self, value: &str) -> Result<(), WizardError> {
        let (question, store) = self.current_target("select an option")?;
        store.select(question, value)?;
        Ok(())
    }

    pub fn set_custom(&mut self, text: &str) -> Result<(), WizardError> {
        let (question, store) = self.current_target("enter custom text")?;
        store.set_custom(question, text)?;
        Ok(())
    }

    pub fn toggle(&mut self, value: &str) -> Result<(), WizardError> {
        let (question, store) = self.current_target("toggle an option")?;
        store.toggle(question, value)?;
        Ok(())
    }

    /// Advance to the next question, or to the preview after the last one.
    pub fn next(&mut self) -> Result<WizardStep, WizardError> {
        let WizardStep::Answering(i) = self.step else {
            return Err(WizardError::WrongStep {
                action: "go forward",
                step: self.step,
            });
        };
        self.step = if i + 1 < self.total_questions() {
            WizardStep::Answering(i + 1)
        } else {
            WizardStep::Preview
        };
        Ok(self.step)
    }

    /// Step back. The first question returns to setup; the preview returns
    /// to the last question.
    pub fn back(&mut self) -> Result<WizardStep, WizardError> {
        self.step = match self.step {
            WizardStep::Answering(0) => WizardStep::Setup,
            WizardStep::Answering(i) => WizardStep::Answering(i - 1),
            WizardStep::Preview => match self.total_questions() {
                0 => WizardStep::Setup,
                n => WizardStep::Answering(n - 1),
            },
            step => {
                return Err(WizardError::WrongStep {
                    action: "go back",
                    step,
                })
            }
        };
        Ok(self.step)
    }

    /// Fraction of the flow completed, 0.0 during setup.
    pub fn progress(&self) -> f32 {
        match self.step {
            WizardStep::Setup => 0.0,
            WizardStep::Answering(i) => (i + 1) as f32 / self.total_questions().max(1) as f32,
            WizardStep::Preview | WizardStep::Submitted => 1.0,
        }
    }

    /// The records that submission would create.
    pub fn preview(&self) -> Vec<CharacterRecord> {
        ProfileAssembler::new(self.questionnaire).assemble_all(&self.group, &self.people)
    }

    /// Re-check the roster against the project, then create every record
    /// in order. Returns the number created.
    pub fn submit<S: BookStore + ?Sized>(
        &mut self,
        store: &mut S,
        project_id: &str,
    ) -> Result<usize, WizardError> {
        if self.step != WizardStep::Preview {
            return Err(WizardError::WrongStep {
                action: "submit",
                step: self.step,
            });
        }

        let existing = store.get_project(project_id)?.characters;
        validate_setup(&self.questionnaire.rules, &self.people, &existing)?;

        let records = self.preview();
        let names: Vec<&str> = records.iter().map(|r| r.name.as_str()).collect();
        validate_unique_names(&names, &existing)?;

        let created = store.batch_create_characters(project_id, &records)?;
        self.step = WizardStep::Submitted;
        tracing::info!(
            questionnaire = %self.questionnaire.id,
            project = project_id,
            created,
            "Questionnaire submitted"
        );
        Ok(created)
    }

    pub fn draft(&self) -> WizardDraft {
        WizardDraft {
            questionnaire_id: self.questionnaire.id.clone(),
            step: self.step,
            group_answers: self.group.clone(),
            people: self.people.clone(),
        }
    }

    /// Resume from a saved draft. A step past the end of the question
    /// sequence lands on the preview.
    pub fn restore(questionnaire: &'a Questionnaire, draft: WizardDraft) -> Result<Self, WizardError> {
        if draft.questionnaire_id != questionnaire.id {
            return Err(WizardError::QuestionnaireMismatch {
                expected: questionnaire.id.clone(),
                found: draft.questionnaire_id,
            });
        }
        let mut wizard = Self {
            questionnaire,
            step: WizardStep::Setup,
            group: draft.group_answers,
            people: draft.people,
        };
        wizard.step = match draft.step {
            WizardStep::Answering(i) if i >= wizard.total_questions() => WizardStep::Preview,
            WizardStep::Submitted => WizardStep::Preview,
            step => step,
        };
        Ok(wizard)
    }
}

//! WASM bindings for novel-workshop: questionnaires, character generation
//! and markdown export for the browser app.

use chrono::NaiveDate;
use wasm_bindgen::prelude::*;

use novel_workshop::core::book_setup;
use novel_workshop::core::export::{export_file_name, export_markdown};
use novel_workshop::core::questionnaire::{Naming, Questionnaire, SetupRules};
use novel_workshop::core::validation::validate_setup;
use novel_workshop::core::workshop::Workshop;
use novel_workshop::schema::answer::AnswerStore;
use novel_workshop::schema::character::{CharacterRecord, PersonDraft};
use novel_workshop::schema::project::{BookSetupAnswers, Project};
use novel_workshop::schema::question::Question;

// ---------------------------------------------------------------------------
// JSON helper types for communication across the WASM boundary
// ---------------------------------------------------------------------------
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateInput {
    #[serde(default)]
    group: AnswerStore,
    people: Vec<PersonDraft>,
    #[serde(default)]
    existing: Vec<CharacterRecord>,
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct QuestionnaireInfo<'a> {
    id: &'a str,
    title: &'a str,
    description: &'a str,
    sections: Vec<&'a str>,
    group_questions: &'a [Question],
    person_questions: &'a [Question],
    rules: &'a SetupRules,
    naming: &'a Naming,
}

impl<'a> From<&'a Questionnaire> for QuestionnaireInfo<'a> {
    fn from(q: &'a Questionnaire) -> Self {
        Self {
            id: &q.id,
            title: &q.title,
            description: &q.description,
            sections: q.sections(),
            group_questions: &q.group_questions,
            person_questions: &q.person_questions,
            rules: &q.rules,
            naming: &q.naming,
        }
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct BookSetupInfo {
    project_name: Option<String>,
    answers: BookSetupAnswers,
}

fn to_json<T: serde::Serialize>(value: &T) -> Result<String, JsError> {
    serde_json::to_string(value).map_err(|e| JsError::new(&format!("Serialization error: {e}")))
}

// ---------------------------------------------------------------------------
// WASM API
// ---------------------------------------------------------------------------
#[wasm_bindgen]
pub struct NovelWorkshop {
    workshop: Workshop,
}

#[wasm_bindgen]
impl NovelWorkshop {
    /// Load every built-in questionnaire.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Result<NovelWorkshop, JsError> {
        let workshop = Workshop::builder()
            .build()
            .map_err(|e| JsError::new(&format!("Workshop build error: {e}")))?;
        Ok(NovelWorkshop { workshop })
    }

    /// JSON array of questionnaire ids.
    pub fn questionnaire_ids(&self) -> Result<String, JsError> {
        to_json(&self.workshop.ids())
    }

    /// JSON description of one questionnaire: questions, sections and rules.
    pub fn questionnaire(&self, id: &str) -> Result<String, JsError> {
        let questionnaire = self
            .workshop
            .questionnaire(id)
            .map_err(|e| JsError::new(&e.to_string()))?;
        to_json(&QuestionnaireInfo::from(questionnaire))
    }

    /// Check a roster against the questionnaire's rules. Returns the error
    /// message, or an empty string when the roster is fine.
    pub fn validate(&self, id: &str, input_json: &str) -> Result<String, JsError> {
        let questionnaire = self
            .workshop
            .questionnaire(id)
            .map_err(|e| JsError::new(&e.to_string()))?;
        let input: GenerateInput = serde_json::from_str(input_json)
            .map_err(|e| JsError::new(&format!("Invalid input JSON: {e}")))?;
        Ok(validate_setup(&questionnaire.rules, &input.people, &input.existing)
            .err()
            .map(|e| e.to_string())
            .unwrap_or_default())
    }

    /// Generate character records for a roster. Returns a JSON array.
    pub fn generate(&self, id: &str, input_json: &str) -> Result<String, JsError> {
        let input: GenerateInput = serde_json::from_str(input_json)
            .map_err(|e| JsError::new(&format!("Invalid input JSON: {e}")))?;
        let records = self
            .workshop
            .generate_all(id, &input.group, &input.people)
            .map_err(|e| JsError::new(&format!("Generation error: {e}")))?;
        to_json(&records)
    }

    /// Turn book setup answers into the stored form.
    pub fn collect_book_setup(&self, answers_json: &str) -> Result<String, JsError> {
        let questionnaire = self
            .workshop
            .questionnaire("book_setup")
            .map_err(|e| JsError::new(&e.to_string()))?;
        let answers: AnswerStore = serde_json::from_str(answers_json)
            .map_err(|e| JsError::new(&format!("Invalid answers JSON: {e}")))?;
        let outcome = book_setup::collect(questionnaire, &answers);
        to_json(&BookSetupInfo {
            project_name: outcome.project_name,
            answers: outcome.answers,
        })
    }

    /// Render a project as markdown. `date` is `YYYY-MM-DD`.
    pub fn export_markdown(project_json: &str, date: &str) -> Result<String, JsError> {
        let project: Project = serde_json::from_str(project_json)
            .map_err(|e| JsError::new(&format!("Invalid project JSON: {e}")))?;
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
            .map_err(|e| JsError::new(&format!("Invalid date: {e}")))?;
        Ok(export_markdown(&project, date))
    }

    pub fn export_file_name(project_name: &str) -> String {
        export_file_name(project_name)
    }
}

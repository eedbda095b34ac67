/// Profile assembly: answers + roster → slot map → six composed fields.

use crate::core::composer::FieldComposer;
use crate::core::questionnaire::{DerivedSlot, Questionnaire};
use crate::core::resolver::{resolve, resolve_prose};
use crate::core::template::Slots;
use crate::schema::answer::AnswerStore;
use crate::schema::character::{CharacterRecord, NarrativeField, PersonDraft};

/// Builds character records for one questionnaire. Pure; uniqueness of
/// names is checked elsewhere.
pub struct ProfileAssembler<'a> {
    questionnaire: &'a Questionnaire,
}

impl<'a> ProfileAssembler<'a> {
    pub fn new(questionnaire: &'a Questionnaire) -> Self {
        Self { questionnaire }
    }

    /// Resolve every slot available to the field templates for `person`.
    pub fn slots(&self, group: &AnswerStore, person: &PersonDraft, people: &[PersonDraft]) -> Slots {
        let mut slots = Slots::default();

        for question in &self.questionnaire.group_questions {
            slots.insert(question.id.clone(), resolve_prose(question, group.get(&question.id)));
        }
        for question in &self.questionnaire.person_questions {
            slots.insert(
                question.id.clone(),
                resolve_prose(question, person.answers.get(&question.id)),
            );
        }

        slots.insert("name".to_string(), self.display_name(person));
        slots.insert(
            "gender".to_string(),
            person.gender.map(|g| g.noun()).unwrap_or("person").to_string(),
        );
        slots.insert(
            "role".to_string(),
            person.role.map(|r| r.as_str()).unwrap_or("").to_string(),
        );

        if person.is_main_character {
            slots.insert("is-main-character".to_string(), "yes".to_string());
            slots.insert(
                "child-role".to_string(),
                person.role.map(|r| r.child_noun()).unwrap_or("child").to_string(),
            );
            let parents: Vec<String> = people
                .iter()
                .filter(|p| person.parent_ids.contains(&p.id))
                .map(|p| self.display_name(p))
                .collect();
            slots.insert("parent-names".to_string(), parents.join(" and "));
        }

        for derived in &self.questionnaire.derived {
            let value = match derived {
                DerivedSlot::Compose { spec, .. } => FieldComposer::compose(spec, &slots),
                DerivedSlot::Distinct { source, unlike, .. } => {
                    let source_value = slots.get(source).map(String::as_str).unwrap_or("");
                    let unlike_value = slots.get(unlike).map(String::as_str).unwrap_or("");
                    if source_value.trim().is_empty() || source_value == unlike_value {
                        String::new()
                    } else {
                        source_value.to_string()
                    }
                }
            };
            slots.insert(derived.slot().to_string(), value);
        }

        slots
    }

    /// Name shown on the record: the roster name, else the naming
    /// question's answer, else the questionnaire default.
    pub fn display_name(&self, person: &PersonDraft) -> String {
        let name = person.name.trim();
        if !name.is_empty() {
            return name.to_string();
        }
        if let Some(question) = self
            .questionnaire
            .naming
            .question
            .as_deref()
            .and_then(|id| self.questionnaire.question(id))
        {
            let answered = resolve(question, person.answers.get(&question.id));
            if !answered.trim().is_empty() {
                return answered.trim().to_string();
            }
        }
        self.questionnaire.naming.default_name.clone()
    }

    pub fn assemble(&self, group: &AnswerStore, person: &PersonDraft, people: &[PersonDraft]) -> CharacterRecord {
        let slots = self.slots(group, person, people);
        self.compose(&slots)
    }

    /// Assemble under an explicit name, which also feeds the `{name}` slot.
    pub fn assemble_with_name(
        &self,
        group: &AnswerStore,
        person: &PersonDraft,
        people: &[PersonDraft],
        name: &str,
    ) -> CharacterRecord {
        let mut slots = self.slots(group, person, people);
        if !name.trim().is_empty() {
            slots.insert("name".to_string(), name.trim().to_string());
        }
        self.compose(&slots)
    }

    /// One record per roster entry, in roster order.
    pub fn assemble_all(&self, group: &AnswerStore, people: &[PersonDraft]) -> Vec<CharacterRecord> {
        people
            .iter()
            .map(|person| self.assemble(group, person, people))
            .collect()
    }

    fn compose(&self, slots: &Slots) -> CharacterRecord {
        let name = slots.get("name").cloned().unwrap_or_default();
        let mut record = CharacterRecord::new(&name);
        for field in NarrativeField::ALL {
            if let Some(spec) = self.questionnaire.fields.get(field) {
                record.set_field(field, FieldComposer::compose(spec, slots));
            }
        }
        record
    }
}

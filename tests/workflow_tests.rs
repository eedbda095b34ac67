/// Workflow integration tests: roster setup, wizard submission against a
/// book store, partial batch failure, export, preferences and drafts.

use assert_matches::assert_matches;
use chrono::NaiveDate;

use novel_workshop::core::book_setup;
use novel_workshop::core::export::{export_file_name, export_markdown};
use novel_workshop::core::settings::{DraftStore, MemoryKeyValueStore, Preferences};
use novel_workshop::core::store::{BookStore, MemoryBookStore, StoreError};
use novel_workshop::core::validation::ValidationError;
use novel_workshop::core::wizard::{Scope, Wizard, WizardDraft, WizardError, WizardStep};
use novel_workshop::core::workshop::Workshop;
use novel_workshop::schema::answer::Answer;
use novel_workshop::schema::character::{CharacterRecord, FamilyRole, PersonDraft};
use novel_workshop::schema::project::{BookSetupAnswers, Project, Prologue};

/// Delegates to a memory store but rejects one character name.
struct FlakyStore {
    inner: MemoryBookStore,
    reject: String,
}

impl BookStore for FlakyStore {
    fn create_project(&mut self, id: &str, name: &str) -> Result<(), StoreError> {
        self.inner.create_project(id, name)
    }
    fn rename_project(&mut self, id: &str, new_name: &str) -> Result<(), StoreError> {
        self.inner.rename_project(id, new_name)
    }
    fn delete_project(&mut self, id: &str) -> Result<(), StoreError> {
        self.inner.delete_project(id)
    }
    fn get_project(&self, id: &str) -> Result<Project, StoreError> {
        self.inner.get_project(id)
    }
    fn get_all_projects(&self) -> Result<Vec<Project>, StoreError> {
        self.inner.get_all_projects()
    }
    fn add_character(&mut self, project_id: &str, record: &CharacterRecord) -> Result<(), StoreError> {
        if record.name == self.reject {
            return Err(StoreError::Rejected("backend unavailable".to_string()));
        }
        self.inner.add_character(project_id, record)
    }
    fn update_character(&mut self, project_id: &str, record: &CharacterRecord) -> Result<(), StoreError> {
        self.inner.update_character(project_id, record)
    }
    fn add_worldbuilding_note(&mut self, project_id: &str, category: &str, note: &str) -> Result<(), StoreError> {
        self.inner.add_worldbuilding_note(project_id, category, note)
    }
    fn update_worldbuilding_category(
        &mut self,
        project_id: &str,
        category: &str,
        description: &str,
    ) -> Result<(), StoreError> {
        self.inner
            .update_worldbuilding_category(project_id, category, description)
    }
    fn save_prologue(&mut self, project_id: &str, prologue: &Prologue) -> Result<(), StoreError> {
        self.inner.save_prologue(project_id, prologue)
    }
    fn save_book_setup_answers(&mut self, project_id: &str, answers: &BookSetupAnswers) -> Result<(), StoreError> {
        self.inner.save_book_setup_answers(project_id, answers)
    }
    fn get_book_setup_answers(&self, project_id: &str) -> Result<Option<BookSetupAnswers>, StoreError> {
        self.inner.get_book_setup_answers(project_id)
    }
}

fn finish(wizard: &mut Wizard<'_>) {
    while wizard.step() != WizardStep::Preview {
        wizard.next().unwrap();
    }
}

#[test]
fn band_wizard_end_to_end() {
    let workshop = Workshop::builder().build().unwrap();
    let mut store = MemoryBookStore::new();
    store.create_project("p1", "Encore").unwrap();

    let mut wizard = workshop.wizard("band").unwrap();
    wizard.add_person(PersonDraft::with_id("a", "Kai")).unwrap();
    assert_matches!(
        wizard.start(&[]),
        Err(WizardError::Setup(ValidationError::TooFewPeople { min: 2, found: 1 }))
    );
    wizard.add_person(PersonDraft::with_id("b", "Mira")).unwrap();
    wizard.start(&[]).unwrap();

    // group-name, group-genre, group-vibe come first
    assert_eq!(wizard.current().map(|(s, q)| (s, q.id.as_str())), Some((Scope::Group, "group-name")));
    wizard.answer(Answer::text("Eclipse")).unwrap();
    wizard.next().unwrap();
    wizard.select("rock").unwrap();
    wizard.next().unwrap();
    wizard.next().unwrap();
    assert_eq!(
        wizard.current().map(|(s, q)| (s, q.id.as_str())),
        Some((Scope::Person(0), "member-age"))
    );
    assert!(wizard.progress() > 0.0 && wizard.progress() < 1.0);

    finish(&mut wizard);
    let preview = wizard.preview();
    assert_eq!(preview.len(), 2);
    assert!(preview[1].relationships.starts_with("Within Eclipse, Mira is"));

    assert_eq!(wizard.submit(&mut store, "p1").unwrap(), 2);
    let names: Vec<String> = store
        .get_project("p1")
        .unwrap()
        .characters
        .into_iter()
        .map(|c| c.name)
        .collect();
    assert_eq!(names, vec!["Kai", "Mira"]);
}

#[test]
fn duplicate_names_are_rejected_before_submission() {
    let workshop = Workshop::builder().build().unwrap();
    let mut wizard = workshop.wizard("band").unwrap();
    wizard.add_person(PersonDraft::with_id("a", "Kai")).unwrap();
    wizard.add_person(PersonDraft::with_id("b", "KAI ")).unwrap();
    assert_matches!(
        wizard.start(&[]),
        Err(WizardError::Setup(ValidationError::DuplicateName(_)))
    );

    let existing = vec![CharacterRecord::new("mira")];
    let mut wizard = workshop.wizard("band").unwrap();
    wizard.add_person(PersonDraft::with_id("a", "Kai")).unwrap();
    wizard.add_person(PersonDraft::with_id("b", "Mira")).unwrap();
    assert_matches!(
        wizard.start(&existing),
        Err(WizardError::Setup(ValidationError::NameTaken(name))) if name == "Mira"
    );
}

#[test]
fn partial_batch_failure_keeps_earlier_records() {
    let workshop = Workshop::builder().build().unwrap();
    let mut store = FlakyStore {
        inner: MemoryBookStore::new(),
        reject: "Mira".to_string(),
    };
    store.create_project("p1", "Encore").unwrap();

    let mut wizard = workshop.wizard("band").unwrap();
    for (id, name) in [("a", "Kai"), ("b", "Mira"), ("c", "Jun")] {
        wizard.add_person(PersonDraft::with_id(id, name)).unwrap();
    }
    wizard.start(&[]).unwrap();
    finish(&mut wizard);

    let batch = match wizard.submit(&mut store, "p1") {
        Err(WizardError::Batch(batch)) => batch,
        other => panic!("expected a batch error, got {other:?}"),
    };
    assert_eq!(batch.created, 1);
    assert_eq!(batch.total, 3);
    assert_eq!(batch.failed_name, "Mira");
    assert_matches!(batch.source, StoreError::Rejected(_));
    assert_eq!(wizard.step(), WizardStep::Preview);

    let project = store.get_project("p1").unwrap();
    assert_eq!(project.characters.len(), 1);
    assert_eq!(project.characters[0].name, "Kai");
}

#[test]
fn family_wizard_requires_linked_parent() {
    let workshop = Workshop::builder().build().unwrap();
    let mut wizard = workshop.wizard("family").unwrap();
    wizard
        .add_person(PersonDraft::with_id("m", "Rhea").role(FamilyRole::Mother))
        .unwrap();
    wizard
        .add_person(PersonDraft::with_id("d", "Ione").role(FamilyRole::Daughter))
        .unwrap();
    assert_matches!(
        wizard.start(&[]),
        Err(WizardError::Setup(ValidationError::MissingMainCharacter))
    );

    {
        let daughter = wizard.person_mut("d").unwrap();
        daughter.is_main_character = true;
    }
    assert_matches!(
        wizard.start(&[]),
        Err(WizardError::Setup(ValidationError::MissingParent))
    );

    wizard.person_mut("d").unwrap().parent_ids = vec!["m".to_string()];
    wizard.start(&[]).unwrap();
    finish(&mut wizard);

    let preview = wizard.preview();
    assert_eq!(
        preview[1].story_role,
        "As the main character and daughter of Rhea, their journey is central to the narrative."
    );
}

#[test]
fn profile_wizard_names_from_answer() {
    let workshop = Workshop::builder().build().unwrap();
    let mut wizard = workshop.wizard("profile").unwrap();
    wizard.add_person(PersonDraft::with_id("solo", "")).unwrap();
    wizard.start(&[]).unwrap();
    assert_eq!(wizard.current().map(|(_, q)| q.id.as_str()), Some("core_name"));
    wizard.answer(Answer::text("Astrid Vale")).unwrap();
    finish(&mut wizard);
    assert_eq!(wizard.preview()[0].name, "Astrid Vale");
}

#[test]
fn wizard_draft_survives_key_value_storage() {
    let workshop = Workshop::builder().build().unwrap();
    let mut wizard = workshop.wizard("profile").unwrap();
    wizard.add_person(PersonDraft::with_id("solo", "")).unwrap();
    wizard.start(&[]).unwrap();
    wizard.answer(Answer::text("Astrid Vale")).unwrap();
    wizard.next().unwrap();

    let mut drafts = DraftStore::new(MemoryKeyValueStore::new());
    drafts.save("p1", 2, &wizard.draft()).unwrap();

    let draft: WizardDraft = drafts.load("p1", 2).unwrap().unwrap();
    let resumed = Wizard::restore(workshop.questionnaire("profile").unwrap(), draft).unwrap();
    assert_eq!(resumed.step(), WizardStep::Answering(1));
    assert_eq!(
        resumed.answers(Scope::Person(0)).and_then(|a| a.get("core_name")),
        Some(&Answer::text("Astrid Vale"))
    );

    drafts.clear("p1", 2).unwrap();
    assert!(drafts.load::<WizardDraft>("p1", 2).unwrap().is_none());
}

#[test]
fn book_setup_saves_and_renames() {
    let workshop = Workshop::builder().build().unwrap();
    let setup = workshop.questionnaire("book_setup").unwrap();
    let mut store = MemoryBookStore::new();
    store.create_project("p1", "Untitled").unwrap();

    let mut wizard = workshop.wizard("book_setup").unwrap();
    wizard.start(&[]).unwrap();
    wizard.select("custom").unwrap();
    wizard.set_custom("Crown of Thorns").unwrap();
    wizard.next().unwrap();
    wizard.select("other").unwrap();
    wizard.set_custom("Exiled astronomer").unwrap();

    let outcome = book_setup::collect(setup, wizard.group_answers());
    book_setup::save(&mut store, "p1", "Untitled", &outcome).unwrap();

    assert_eq!(store.get_project("p1").unwrap().name, "Crown of Thorns");
    let saved = store.get_book_setup_answers("p1").unwrap().unwrap();
    assert_eq!(saved.characters[0].role, "Exiled astronomer");
    assert!(!saved.has_prologue);
}

#[test]
fn export_of_submitted_project() {
    let mut store = MemoryBookStore::new();
    store.create_project("p1", "Midnight Vows").unwrap();
    let empty = export_markdown(
        &store.get_project("p1").unwrap(),
        NaiveDate::from_ymd_opt(2024, 2, 14).unwrap(),
    );
    assert!(empty.contains("## Book Boyfriends & Husbands\n\n_No book boyfriends yet_"));
    assert!(empty.contains("### Setting\n"));

    let mut kai = CharacterRecord::new("Kai");
    kai.voice = "Soft-spoken.".to_string();
    store.add_character("p1", &kai).unwrap();
    store
        .add_worldbuilding_note("p1", "Setting", "A coastal city.")
        .unwrap();

    let md = export_markdown(
        &store.get_project("p1").unwrap(),
        NaiveDate::from_ymd_opt(2024, 2, 14).unwrap(),
    );
    assert!(md.contains("### Kai\n\n**Voice & Dialogue:**\nSoft-spoken.\n"));
    assert!(md.contains("**Notes:**\n- A coastal city.\n"));
    assert!(!md.contains("_No book boyfriends yet_"));
    assert_eq!(export_file_name("Midnight Vows"), "midnight_vows_export.md");
}

#[test]
fn preferences_follow_project_list() {
    let mut store = MemoryBookStore::new();
    store.create_project("p1", "One").unwrap();
    store.create_project("p2", "Two").unwrap();

    let mut prefs = Preferences::new(MemoryKeyValueStore::new());
    prefs.set_selected_project(Some("p2")).unwrap();
    store.delete_project("p2").unwrap();

    let projects = store.get_all_projects().unwrap();
    assert_eq!(prefs.reconcile_selection(&projects).unwrap().as_deref(), Some("p1"));
}

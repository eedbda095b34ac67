/// Questionnaires compiled into the crate.

use crate::core::questionnaire::{Questionnaire, QuestionnaireError};

pub const BUILTIN_IDS: [&str; 4] = ["band", "family", "profile", "book_setup"];

mod data {
    pub const BAND: &str = include_str!("../../questionnaire_data/band/questionnaire.ron");
    pub const BAND_FIELDS: &str = include_str!("../../questionnaire_data/band/fields.ron");

    pub const FAMILY: &str = include_str!("../../questionnaire_data/family/questionnaire.ron");
    pub const FAMILY_FIELDS: &str = include_str!("../../questionnaire_data/family/fields.ron");

    pub const PROFILE: &str = include_str!("../../questionnaire_data/profile/questionnaire.ron");
    pub const PROFILE_FIELDS: &str = include_str!("../../questionnaire_data/profile/fields.ron");

    pub const BOOK_SETUP: &str =
        include_str!("../../questionnaire_data/book_setup/questionnaire.ron");
}

fn sources(id: &str) -> Option<(&'static str, Option<&'static str>)> {
    match id {
        "band" => Some((data::BAND, Some(data::BAND_FIELDS))),
        "family" => Some((data::FAMILY, Some(data::FAMILY_FIELDS))),
        "profile" => Some((data::PROFILE, Some(data::PROFILE_FIELDS))),
        "book_setup" => Some((data::BOOK_SETUP, None)),
        _ => None,
    }
}

/// Parse one built-in questionnaire.
pub fn load(id: &str) -> Result<Questionnaire, QuestionnaireError> {
    let (questionnaire, fields) =
        sources(id).ok_or_else(|| QuestionnaireError::UnknownBuiltin(id.to_string()))?;
    Questionnaire::parse_ron(questionnaire, fields)
}

pub fn load_all() -> Result<Vec<Questionnaire>, QuestionnaireError> {
    BUILTIN_IDS.iter().map(|id| load(id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn every_builtin_parses() {
        let all = load_all().unwrap();
        assert_eq!(all.len(), BUILTIN_IDS.len());
        for (q, id) in all.iter().zip(BUILTIN_IDS) {
            assert_eq!(q.id, id);
        }
    }

    #[test]
    fn unknown_builtin() {
        assert_matches!(load("opera"), Err(QuestionnaireError::UnknownBuiltin(id)) if id == "opera");
    }

    #[test]
    fn band_rules() {
        let band = load("band").unwrap();
        assert_eq!(band.rules.min_people, 2);
        assert_eq!(band.rules.max_people, Some(20));
        assert_eq!(band.group_questions.len(), 3);
        assert_eq!(band.person_questions.len(), 15);
    }

    #[test]
    fn family_requires_main_character() {
        let family = load("family").unwrap();
        let rule = family.rules.main_character.as_ref().unwrap();
        assert!(rule.require_parent);
        assert!(family.person_questions.len() >= 40);
    }

    #[test]
    fn profile_names_from_question() {
        let profile = load("profile").unwrap();
        assert_eq!(profile.naming.question.as_deref(), Some("core_name"));
        assert_eq!(profile.naming.default_name, "Unnamed Character");
        assert_eq!(profile.derived.len(), 2);
    }

    #[test]
    fn book_setup_has_no_templates() {
        let setup = load("book_setup").unwrap();
        assert!(setup.fields.is_empty());
        assert!(setup.person_questions.is_empty());
        assert_eq!(setup.group_questions.len(), 8);
    }
}

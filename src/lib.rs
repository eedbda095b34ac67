//! Novel Workshop: questionnaire-driven tooling for novelists.
//!
//! Turns answers to guided questionnaires into character profiles using
//! data-defined field templates, and keeps projects, worldbuilding notes
//! and prologue drafts behind a pluggable book store.

pub mod core;
pub mod schema;

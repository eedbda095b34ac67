pub mod assembler;
pub mod book_setup;
pub mod builtin;
pub mod composer;
pub mod export;
pub mod questionnaire;
pub mod resolver;
pub mod settings;
pub mod store;
pub mod template;
pub mod validation;
pub mod wizard;
pub mod workshop;

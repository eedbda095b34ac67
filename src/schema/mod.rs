pub mod answer;
pub mod character;
pub mod project;
pub mod question;

/// Markdown export of a whole project.

use chrono::{Local, NaiveDate};

use crate::schema::character::NarrativeField;
use crate::schema::project::{Project, WORLDBUILDING_CATEGORIES};

/// Push `**label:**`, the text and a blank line when `text` is non-empty.
fn labelled(lines: &mut Vec<String>, label: &str, text: &str) {
    if text.is_empty() {
        return;
    }
    lines.push(format!("**{}:**", label));
    lines.push(text.to_string());
    lines.push(String::new());
}

/// Render a project as a markdown document dated `exported`.
pub fn export_markdown(project: &Project, exported: NaiveDate) -> String {
    let mut lines: Vec<String> = vec![
        format!("# {}", project.name),
        String::new(),
        format!("Exported: {}", exported.format("%Y-%m-%d")),
        String::new(),
        "---".to_string(),
        String::new(),
    ];

    lines.push("## Book Boyfriends & Husbands".to_string());
    lines.push(String::new());
    if project.characters.is_empty() {
        lines.push("_No book boyfriends yet_".to_string());
        lines.push(String::new());
    }
    for character in &project.characters {
        lines.push(format!("### {}", character.name));
        lines.push(String::new());
        for field in NarrativeField::ALL {
            labelled(&mut lines, field.heading(), character.field(field));
        }
        lines.push("---".to_string());
        lines.push(String::new());
    }

    lines.push("## Their World".to_string());
    lines.push(String::new());
    if project.worldbuilding.is_empty() {
        lines.push("_No worldbuilding notes yet_".to_string());
        lines.push(String::new());
    }
    for (index, category) in project.worldbuilding.iter().enumerate() {
        let name = WORLDBUILDING_CATEGORIES
            .get(index)
            .map(|n| n.to_string())
            .unwrap_or_else(|| format!("Category {}", index + 1));
        lines.push(format!("### {}", name));
        lines.push(String::new());
        if !category.description.is_empty() {
            lines.push(category.description.clone());
            lines.push(String::new());
        }
        if !category.freeform_notes.is_empty() {
            lines.push("**Notes:**".to_string());
            lines.extend(category.freeform_notes.iter().map(|note| format!("- {}", note)));
            lines.push(String::new());
        }
    }

    lines.push("## First Encounter".to_string());
    lines.push(String::new());
    match &project.prologue {
        None => {
            lines.push("_No first encounter yet_".to_string());
            lines.push(String::new());
        }
        Some(prologue) => {
            labelled(&mut lines, "Hook", &prologue.hook);
            labelled(&mut lines, "POV & Voice", &prologue.pov_voice);
            labelled(&mut lines, "Stakes", &prologue.stakes);
            labelled(&mut lines, "Key Information & Reveals", &prologue.key_reveals);
            labelled(
                &mut lines,
                "Connection to Chapter One",
                &prologue.connection_to_chapter_one,
            );
            if !prologue.draft.is_empty() {
                lines.push("### Draft".to_string());
                lines.push(String::new());
                lines.push(prologue.draft.clone());
                lines.push(String::new());
            }
        }
    }

    lines.join("\n")
}

pub fn export_markdown_today(project: &Project) -> String {
    export_markdown(project, Local::now().date_naive())
}

/// `<name>_export.md`, with every non-alphanumeric character replaced by
/// `_` and the rest lower-cased.
pub fn export_file_name(project_name: &str) -> String {
    let stem: String = project_name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{}_export.md", stem)
}

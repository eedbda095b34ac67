/// Preview: generate character records from a saved answers file.
///
/// Usage: preview <answers.ron> [--data-dir <path>] [--markdown] [--json]
///
/// The answers file names a questionnaire and carries the group answers and
/// the roster, e.g. `demos/band_answers.ron`. Records are printed field by
/// field, as a markdown export, or as JSON.

use novel_workshop::core::export::export_markdown_today;
use novel_workshop::core::validation::validate_setup;
use novel_workshop::core::workshop::Workshop;
use novel_workshop::schema::answer::AnswerStore;
use novel_workshop::schema::character::{CharacterRecord, NarrativeField, PersonDraft};
use novel_workshop::schema::project::Project;
use serde::Deserialize;
use std::path::Path;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Deserialize)]
struct PreviewInput {
    questionnaire: String,
    #[serde(default)]
    project: Option<String>,
    #[serde(default)]
    group: AnswerStore,
    people: Vec<PersonDraft>,
}

enum Output {
    Fields,
    Markdown,
    Json,
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "novel_workshop=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 || args[1] == "--help" || args[1] == "-h" {
        print_usage();
        return;
    }

    let input_path = &args[1];
    let mut data_dir = None;
    let mut output = Output::Fields;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--data-dir" if i + 1 < args.len() => {
                i += 1;
                data_dir = Some(args[i].clone());
            }
            "--markdown" => output = Output::Markdown,
            "--json" => output = Output::Json,
            _ => {
                eprintln!("Unknown argument: {}", args[i]);
                print_usage();
                process::exit(1);
            }
        }
        i += 1;
    }

    let input = match load_input(Path::new(input_path)) {
        Ok(input) => input,
        Err(e) => {
            eprintln!("ERROR: Failed to read {}: {}", input_path, e);
            process::exit(1);
        }
    };

    let mut builder = Workshop::builder();
    if let Some(ref dir) = data_dir {
        builder = builder.data_dir(dir);
    }
    let workshop = match builder.build() {
        Ok(workshop) => workshop,
        Err(e) => {
            eprintln!("ERROR: Failed to load questionnaires: {}", e);
            process::exit(1);
        }
    };

    let questionnaire = match workshop.questionnaire(&input.questionnaire) {
        Ok(questionnaire) => questionnaire,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };
    if let Err(e) = validate_setup(&questionnaire.rules, &input.people, &[]) {
        eprintln!("WARNING: {}", e);
    }

    let records = match workshop.generate_all(&input.questionnaire, &input.group, &input.people) {
        Ok(records) => records,
        Err(e) => {
            eprintln!("ERROR: {}", e);
            process::exit(1);
        }
    };

    match output {
        Output::Fields => print_records(&questionnaire.title, &records),
        Output::Markdown => {
            let name = input.project.as_deref().unwrap_or(&questionnaire.title);
            let mut project = Project::new("preview", name);
            project.characters = records;
            print!("{}", export_markdown_today(&project));
        }
        Output::Json => match serde_json::to_string_pretty(&records) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("ERROR: {}", e);
                process::exit(1);
            }
        },
    }
}

fn load_input(path: &Path) -> Result<PreviewInput, String> {
    let contents = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
    ron::from_str(&contents).map_err(|e| e.to_string())
}

fn print_records(title: &str, records: &[CharacterRecord]) {
    println!("=== {} ({} characters) ===", title, records.len());
    for record in records {
        println!("\n--- {} ---", record.name);
        for field in NarrativeField::ALL {
            let text = record.field(field);
            if !text.is_empty() {
                println!("{}: {}", field.heading(), text);
            }
        }
    }
}

fn print_usage() {
    println!("Usage: preview <answers.ron> [--data-dir <path>] [--markdown] [--json]");
    println!();
    println!("  --data-dir <path>  questionnaire overrides, one subdirectory each");
    println!("  --markdown         print the records as a markdown export");
    println!("  --json             print the records as JSON");
}

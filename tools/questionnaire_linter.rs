/// Questionnaire Linter: checks questionnaire definitions and field templates.
///
/// Usage: questionnaire_linter [data_dir] [--config <workshop.ron>] [--no-builtins]

use novel_workshop::core::workshop::{Workshop, WorkshopConfig};
use std::path::Path;
use std::process;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "novel_workshop=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("Usage: questionnaire_linter [data_dir] [--config <workshop.ron>] [--no-builtins]");
        process::exit(0);
    }

    let mut config = WorkshopConfig::default();
    let mut data_dir = None;
    let mut no_builtins = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" if i + 1 < args.len() => {
                i += 1;
                config = match WorkshopConfig::load_from_ron(Path::new(&args[i])) {
                    Ok(config) => config,
                    Err(e) => {
                        eprintln!("ERROR: Failed to load config: {}", e);
                        process::exit(1);
                    }
                };
            }
            "--no-builtins" => no_builtins = true,
            other if !other.starts_with("--") && data_dir.is_none() => {
                data_dir = Some(other.to_string());
            }
            other => {
                eprintln!("Unknown argument: {}", other);
                process::exit(1);
            }
        }
        i += 1;
    }

    if no_builtins {
        config.builtins.clear();
    }

    let mut builder = Workshop::builder().config(config);
    if let Some(ref dir) = data_dir {
        if !Path::new(dir).is_dir() {
            eprintln!("ERROR: Path '{}' is not a directory", dir);
            process::exit(1);
        }
        builder = builder.data_dir(dir);
    }

    let workshop = match builder.build() {
        Ok(workshop) => workshop,
        Err(e) => {
            eprintln!("ERROR: Failed to load questionnaires: {}", e);
            process::exit(1);
        }
    };

    println!("Loaded {} questionnaires", workshop.ids().len());

    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    for questionnaire in workshop.questionnaires() {
        let report = questionnaire.lint();
        println!(
            "  {}: {} questions, {} field templates",
            questionnaire.id,
            questionnaire.group_questions.len() + questionnaire.person_questions.len(),
            questionnaire.fields.fields.len()
        );
        errors.extend(report.errors);
        warnings.extend(report.warnings);
    }

    println!("\n=== Questionnaire Lint Report ===\n");

    if errors.is_empty() && warnings.is_empty() {
        println!("All checks passed!");
    }

    for warning in &warnings {
        println!("WARNING: {}", warning);
    }

    for error in &errors {
        println!("ERROR: {}", error);
    }

    println!(
        "\nSummary: {} errors, {} warnings",
        errors.len(),
        warnings.len()
    );

    if errors.is_empty() {
        process::exit(0);
    } else {
        process::exit(1);
    }
}

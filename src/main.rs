use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use log::info;
use tastesurvey_lib::survey::{render_document, FieldKind, FieldSpec};
use tastesurvey_lib::{
    AppConfig, Answers, FormSchema, Session, StepOutcome, StoreBackend, WizardEngine, WizardError,
};

enum Command {
    Back,
    Reset,
    Quit,
}

#[tokio::main]
async fn main() -> Result<()> {
    tastesurvey_lib::init_logging();

    let config = AppConfig::load()?;
    let store = StoreBackend::from_config(&config)
        .await
        .context("Failed to open the response store")?;

    let engine = WizardEngine::new(FormSchema::taste_preference(), store);
    let mut session = Session::new();
    info!("Starting survey session {}", session.id);

    println!("\n=== Taste Preference Survey ===");
    println!("Type :back, :reset or :quit at any prompt.");

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let index = session.current_step();
        let step = engine.current_step(&session);

        if step.is_terminal() {
            println!("\n=== {} ===", step.title);
            if !session.submitted() {
                println!("⚠️  Your answers could not be saved. Please keep the copy below.");
            }
            if let Some(record) = session.snapshot() {
                println!("\n{}", render_document(record)?);
            }
            return Ok(());
        }

        println!("\n[{}/{}] {}", index + 1, engine.schema().terminal_index(), step.title);

        let mut values = Answers::new();
        let mut command = None;

        for field in &step.fields {
            print!("{}: ", prompt(field));
            io::stdout().flush()?;

            let Some(line) = lines.next() else {
                return Ok(());
            };
            let line = line?;

            match line.trim() {
                ":back" => command = Some(Command::Back),
                ":reset" => command = Some(Command::Reset),
                ":quit" => command = Some(Command::Quit),
                // Blank input is kept so a revisited optional field can be cleared.
                input => {
                    values.insert(field.key.clone(), field.parse_input(input));
                }
            }
            if command.is_some() {
                break;
            }
        }

        match command {
            Some(Command::Back) => {
                engine.go_back(&mut session, index);
                continue;
            }
            Some(Command::Reset) => {
                engine.reset(&mut session);
                continue;
            }
            Some(Command::Quit) => return Ok(()),
            None => {}
        }

        match engine.submit_step(&mut session, index, values).await {
            Ok(StepOutcome::Advanced(_)) | Ok(StepOutcome::Completed { .. }) => {}
            Err(WizardError::ValidationFailed(report)) => {
                for key in &report.missing {
                    println!("  ✗ {} is required", label_of(step.fields.as_slice(), key));
                }
                for issue in &report.invalid {
                    println!("  ✗ {}: {}", label_of(step.fields.as_slice(), &issue.key), issue.reason);
                }
            }
            // The session has reached the completion page; the warning is shown there.
            Err(WizardError::PersistenceFailed(_)) => {}
            Err(e) => return Err(e.into()),
        }
    }
}

fn prompt(field: &FieldSpec) -> String {
    let hint = match &field.kind {
        FieldKind::SingleChoice { options } => format!(" [{}]", options.join("/")),
        FieldKind::Integer { min, max } => format!(" ({}-{})", min, max),
        FieldKind::FreeText | FieldKind::Email => String::new(),
    };
    let optional = if field.required { "" } else { " (optional)" };
    format!("{}{}{}", field.label, hint, optional)
}

fn label_of<'a>(fields: &'a [FieldSpec], key: &'a str) -> &'a str {
    fields
        .iter()
        .find(|f| f.key == key)
        .map(|f| f.label.as_str())
        .unwrap_or(key)
}

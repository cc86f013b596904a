use std::env;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use tastesurvey_lib::admin::{summarize, AdminGate, AdminViewer};
use tastesurvey_lib::{AppConfig, StoreBackend};

#[tokio::main]
async fn main() -> Result<()> {
    tastesurvey_lib::init_logging();

    let config = AppConfig::load()?;

    let password = match env::args().nth(1) {
        Some(password) => password,
        None => {
            print!("Admin password: ");
            io::stdout().flush()?;
            io::stdin().lock().lines().next().transpose()?.unwrap_or_default()
        }
    };

    let store = StoreBackend::from_config(&config)
        .await
        .context("Failed to open the response store")?;
    let viewer = AdminViewer::new(&store, AdminGate::new(config.admin_password.clone()));

    let records = viewer.responses(password.trim()).await?;

    println!("\n📋 Found {} responses:", records.len());
    println!("{:-<110}", "");
    println!(
        "{:<26} {:<28} {:<12} {:<6} {:<5} {:<8} {:<8}",
        "Submitted", "Email", "Name", "Gender", "Age", "Sweet", "Salty"
    );
    println!("{:-<110}", "");

    for record in &records {
        let text = |key: &str| {
            record
                .answers
                .get(key)
                .map(|v| v.to_string())
                .unwrap_or_else(|| "-".to_string())
        };

        println!(
            "{:<26} {:<28} {:<12} {:<6} {:<5} {:<8} {:<8}",
            record.submitted_at.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            text("email").chars().take(27).collect::<String>(),
            text("name").chars().take(11).collect::<String>(),
            text("gender"),
            text("age"),
            text("preference_1"),
            text("preference_2"),
        );
    }
    println!("{:-<110}", "");

    let summary = summarize(&records);
    for (key, counts) in &summary.preferences {
        if counts.is_empty() {
            println!("\n{}: no answers yet", key);
            continue;
        }
        let answered: usize = counts.values().sum();
        println!("\n{} ({} of {} responses)", key, answered, summary.total);
        for (sample, count) in counts {
            let share = *count as f64 * 100.0 / answered as f64;
            println!("  {:<8} {:>4}  {:>5.1}%", sample, count, share);
        }
    }

    Ok(())
}

//! Photo-library backup tool
//!
//! Coordinates a crash-consistent backup of a containerized photo service:
//! pause the application, dump the database, snapshot the library into a
//! deduplicating borg repository, prune and compact, report the outcome.

// photobackup/src/main.rs
mod backup;
mod config;
mod errors;
mod maintenance;
mod notify;
mod runner;
mod utils;
mod versions;

use std::env;
use std::process::ExitCode;

use dotenv::dotenv;
use log::{LevelFilter, error, info};
use simplelog::{ColorChoice, TermLogger, TerminalMode};

use config::{BackupVariant, Config};
use errors::{AppError, Result};

/// Main entry point for the backup tool.
#[tokio::main]
async fn main() -> ExitCode {
    dotenv().ok();
    let _ = TermLogger::init(
        LevelFilter::Info,
        simplelog::Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    );

    match run_app().await {
        Ok(_) => {
            info!("✅ Backup completed successfully.");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("❌ Backup failed: {}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run_app() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let choice = if args.len() > 1 {
        args[1].trim().to_string()
    } else {
        prompt_choice()?
    };

    let variant = match choice.as_str() {
        "1" | "backup" => BackupVariant::Library,
        "2" | "full" => BackupVariant::Full,
        other => {
            return Err(AppError::Config(format!(
                "Invalid choice '{}'. Use '1' (backup) or '2' (full).",
                other
            )));
        }
    };

    let config = Config::from_env(variant)?;
    let label = match variant {
        BackupVariant::Library => "library",
        BackupVariant::Full => "full",
    };
    info!("🚀 Starting {} backup...", label);

    backup::run_backup_flow(&config).await
}

/// Prompts for the backup variant when none was given on the command line.
fn prompt_choice() -> Result<String> {
    use std::io::{Write, stdin, stdout};

    println!("Select an operation:");
    println!("1. Library backup (or type 'backup')");
    println!("2. Full backup including the database data directory (or type 'full')");
    print!("Enter your choice: ");
    stdout().flush()?;

    let mut input = String::new();
    stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

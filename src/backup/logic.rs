// photobackup/src/backup/logic.rs
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use log::{error, info, warn};

use crate::config::Config;
use crate::errors::{AppError, Result};
use crate::maintenance::MaintenanceController;
use crate::notify::Notifier;
use crate::runner::{CommandRunner, SystemRunner};
use crate::utils::constants::LOCK_FILE_NAME;
use crate::versions;

use super::archive::{self, RetentionPolicy};
use super::db_dump;

/// One execution instance: everything the cleanup path needs to know about
/// what the run has touched so far.
struct BackupRun {
    started_at: DateTime<Local>,
    maintenance: MaintenanceController,
    dump_path: Option<PathBuf>,
}

impl BackupRun {
    fn new(config: &Config) -> Self {
        Self {
            started_at: Local::now(),
            maintenance: MaintenanceController::new(&config.app_container),
            dump_path: None,
        }
    }
}

/// Entry point wired to the production runner and notifier.
pub async fn perform_backup_orchestration(config: &Config) -> Result<()> {
    let notifier = Notifier::from_config(config);
    run_with(config, &SystemRunner, &notifier).await
}

/// Drives the run and reports the outcome. The first failure's exit code
/// is authoritative; recovery and notification failures never replace it.
pub(crate) async fn run_with(
    config: &Config,
    runner: &dyn CommandRunner,
    notifier: &Notifier,
) -> Result<()> {
    match run_inner(config, runner, notifier).await {
        Ok(()) => {
            info!("🎉 Backup run completed successfully");
            notifier.ping_success().await;
            Ok(())
        }
        Err(err) => {
            error!("Backup run failed: {}", err);
            notifier.ping_failure(err.exit_code() as i32, &err.to_string()).await;
            Err(err)
        }
    }
}

async fn run_inner(
    config: &Config,
    runner: &dyn CommandRunner,
    notifier: &Notifier,
) -> Result<()> {
    preflight(config, runner)?;
    let _lock = RunLock::acquire(&config.backup_path)?;
    notifier.ping_start().await;

    let mut run = BackupRun::new(config);
    let outcome = execute_steps(&mut run, config, runner);
    cleanup(&mut run, runner);
    outcome
}

/// Fail-fast checks that run before any side effect. Failures here exit 1.
fn preflight(config: &Config, runner: &dyn CommandRunner) -> Result<()> {
    if !config.backup_path.is_dir() {
        return Err(AppError::Preflight(format!(
            "backup path {} does not exist or is not a directory",
            config.backup_path.display()
        )));
    }
    runner.check_tool("docker")?;
    runner.check_tool("borg")?;
    Ok(())
}

/// The ordered primary steps. The first failure short-circuits the chain
/// (steps after it never run); the caller runs the cleanup path regardless.
fn execute_steps(run: &mut BackupRun, config: &Config, runner: &dyn CommandRunner) -> Result<()> {
    // Version queries exec into the app container, so they must happen
    // before it is paused.
    let versions = versions::resolve_versions(runner, &config.app_container, &config.db_container);

    // The artifact path is recorded before the dump starts so the cleanup
    // path can remove a partial file.
    let dump_path = db_dump::prepare_dump_path(config, &versions)?;
    run.dump_path = Some(dump_path.clone());

    run.maintenance.enable(runner)?;
    db_dump::dump_database(config, runner, &dump_path)?;

    let name = archive::archive_name(&run.started_at);
    archive::create_archive(config, runner, &name)?;
    archive::prune_repository(config, runner, &RetentionPolicy::default())?;
    archive::compact_repository(config, runner)?;
    Ok(())
}

/// Unconditional exit path, shared by success and failure: undo
/// maintenance mode and discard the dump artifact. Both are best-effort;
/// failures here are logged and never mask the run's outcome.
fn cleanup(run: &mut BackupRun, runner: &dyn CommandRunner) {
    if run.maintenance.is_on() {
        if let Err(err) = run.maintenance.disable(runner) {
            warn!("Leaving maintenance mode {:?}: {}", run.maintenance.mode(), err);
        }
    }

    if let Some(dump_path) = run.dump_path.take() {
        if dump_path.exists() {
            match fs::remove_file(&dump_path) {
                Ok(()) => info!("🧽 Removed dump artifact {}", dump_path.display()),
                Err(err) => warn!(
                    "Failed to remove dump artifact {}: {}",
                    dump_path.display(),
                    err
                ),
            }
        }
    }
}

/// Guards the repository against concurrent runs: the lock file is created
/// exclusively and removed when the guard drops. A second simultaneous run
/// fails pre-flight before touching any external system.
struct RunLock {
    path: PathBuf,
}

impl RunLock {
    fn acquire(backup_path: &Path) -> Result<Self> {
        let path = backup_path.join(LOCK_FILE_NAME);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                let _ = writeln!(file, "{}", std::process::id());
                Ok(Self { path })
            }
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                Err(AppError::Preflight(format!(
                    "another backup run appears to be active (lock file {} exists; remove it if the previous run crashed)",
                    path.display()
                )))
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl Drop for RunLock {
    fn drop(&mut self) {
        if let Err(err) = fs::remove_file(&self.path) {
            warn!("Failed to remove lock file {}: {}", self.path.display(), err);
        }
    }
}

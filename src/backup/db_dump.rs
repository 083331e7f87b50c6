// photobackup/src/backup/db_dump.rs
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::info;

use crate::config::{BackupVariant, Config};
use crate::errors::Result;
use crate::runner::CommandRunner;
use crate::utils::constants::{DUMP_DIR_NAME, VERSION_PLACEHOLDER};
use crate::versions::ResolvedVersions;

/// Directory receiving the dump file for this run's variant. The library
/// variant writes into the application's own layout; the full variant owns
/// a dump directory under the backup root.
pub fn dump_dir(config: &Config) -> PathBuf {
    match config.variant {
        BackupVariant::Library => config.library_path.join(DUMP_DIR_NAME),
        BackupVariant::Full => config.backup_path.join(DUMP_DIR_NAME),
    }
}

/// Deterministic dump-file name derived from the resolved versions.
/// A missing version degrades to the placeholder, never an error.
pub fn dump_file_name(versions: &ResolvedVersions) -> String {
    format!(
        "photos-db-{}-pg{}.sql",
        versions.app.as_deref().unwrap_or(VERSION_PLACEHOLDER),
        versions.db.as_deref().unwrap_or(VERSION_PLACEHOLDER),
    )
}

/// Computes the dump path for this run, creating the dump directory on
/// demand in the full variant. The caller records the returned path in the
/// run context before the dump starts, so the cleanup path can always find
/// a partial file.
pub fn prepare_dump_path(config: &Config, versions: &ResolvedVersions) -> Result<PathBuf> {
    let dir = dump_dir(config);
    if config.variant == BackupVariant::Full && !dir.exists() {
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create dump directory {}", dir.display()))?;
    }
    Ok(dir.join(dump_file_name(versions)))
}

/// Invokes the dump command against the database container, redirecting
/// its stdout into `dump_path`. Maintenance mode is already enabled by the
/// time this runs; a non-zero exit or an unreachable runtime is fatal.
pub fn dump_database(config: &Config, runner: &dyn CommandRunner, dump_path: &Path) -> Result<()> {
    info!(
        "🗄 Dumping database from container {} to {}",
        config.db_container,
        dump_path.display()
    );

    let username = format!("--username={}", config.db_user);
    let args = [
        "exec",
        config.db_container.as_str(),
        "pg_dumpall",
        "--clean",
        "--if-exists",
        username.as_str(),
    ];
    runner
        .run_to_file("docker", &args, dump_path)?
        .require_success(&format!("docker exec {} pg_dumpall", config.db_container))?;

    info!("✓ Database dump written to {}", dump_path.display());
    Ok(())
}

// photobackup/src/backup/archive.rs
use std::path::PathBuf;

use chrono::{DateTime, Local};
use log::info;

use crate::config::{BackupVariant, Config};
use crate::errors::Result;
use crate::runner::CommandRunner;
use crate::utils::constants::{ARCHIVE_PREFIX, EXCLUDED_LIBRARY_DIRS};

use super::db_dump;

/// Repository-wide retention applied by the prune pass: bounded counts of
/// the most recent daily/weekly/monthly archives survive.
#[derive(Debug, Clone, Copy)]
pub struct RetentionPolicy {
    pub keep_daily: u32,
    pub keep_weekly: u32,
    pub keep_monthly: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            keep_daily: 7,
            keep_weekly: 4,
            keep_monthly: 3,
        }
    }
}

impl RetentionPolicy {
    fn args(&self) -> Vec<String> {
        vec![
            format!("--keep-daily={}", self.keep_daily),
            format!("--keep-weekly={}", self.keep_weekly),
            format!("--keep-monthly={}", self.keep_monthly),
        ]
    }
}

/// Archive name for a run started at `started_at`.
pub fn archive_name(started_at: &DateTime<Local>) -> String {
    format!("{}-{}", ARCHIVE_PREFIX, started_at.format("%Y-%m-%d_%H-%M-%S"))
}

/// Source trees snapshotted into the archive. The library variant's dump
/// directory lives inside the library, so the library path covers it; the
/// full variant adds the database data directory and its own dump
/// directory under the backup root.
pub fn archive_sources(config: &Config) -> Vec<PathBuf> {
    match config.variant {
        BackupVariant::Library => vec![config.library_path.clone()],
        BackupVariant::Full => {
            let mut sources = vec![config.library_path.clone()];
            if let Some(data_dir) = &config.db_data_dir {
                sources.push(data_dir.clone());
            }
            sources.push(db_dump::dump_dir(config));
            sources
        }
    }
}

fn exclude_args(config: &Config) -> Vec<String> {
    EXCLUDED_LIBRARY_DIRS
        .iter()
        .flat_map(|dir| {
            [
                "--exclude".to_string(),
                config.library_path.join(dir).display().to_string(),
            ]
        })
        .collect()
}

/// Snapshots the source trees into a new named archive in the repository.
pub fn create_archive(config: &Config, runner: &dyn CommandRunner, name: &str) -> Result<()> {
    let target = format!("{}::{}", config.backup_path.display(), name);
    info!("📦 Creating archive {}", target);

    let mut args: Vec<String> = vec!["create".to_string(), "--stats".to_string(), target.clone()];
    for source in archive_sources(config) {
        args.push(source.display().to_string());
    }
    args.extend(exclude_args(config));

    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    runner
        .run("borg", &arg_refs)?
        .require_success(&format!("borg create {}", target))?;

    info!("✓ Archive {} created", name);
    Ok(())
}

/// Applies the retention policy over the whole repository, not just this
/// run's archive. Only reachable after `create_archive` succeeded: the
/// create-before-prune ordering keeps the fresh archive in consideration.
pub fn prune_repository(
    config: &Config,
    runner: &dyn CommandRunner,
    policy: &RetentionPolicy,
) -> Result<()> {
    let repo = config.backup_path.display().to_string();
    info!(
        "🧹 Pruning repository {} (keep daily {}, weekly {}, monthly {})",
        repo, policy.keep_daily, policy.keep_weekly, policy.keep_monthly
    );

    let mut args: Vec<String> = vec!["prune".to_string()];
    args.extend(policy.args());
    args.push(repo.clone());

    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    runner
        .run("borg", &arg_refs)?
        .require_success(&format!("borg prune {}", repo))?;
    Ok(())
}

/// Physically reclaims space freed by pruning. Runs last: compaction only
/// helps once prune has marked archives deleted.
pub fn compact_repository(config: &Config, runner: &dyn CommandRunner) -> Result<()> {
    let repo = config.backup_path.display().to_string();
    info!("♻ Compacting repository {}", repo);

    runner
        .run("borg", &["compact", &repo])?
        .require_success(&format!("borg compact {}", repo))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::test_support::ScriptedRunner;
    use chrono::TimeZone;

    fn test_config(variant: BackupVariant, db_data_dir: Option<&str>) -> Config {
        Config {
            variant,
            library_path: PathBuf::from("/srv/library"),
            backup_path: PathBuf::from("/srv/backups"),
            db_container: "photos-db".to_string(),
            db_user: "postgres".to_string(),
            db_data_dir: db_data_dir.map(PathBuf::from),
            app_container: "photos-app".to_string(),
            healthcheck_url: None,
        }
    }

    #[test]
    fn archive_names_are_timestamped() {
        let started_at = Local.with_ymd_and_hms(2024, 5, 1, 2, 30, 0).unwrap();
        assert_eq!(archive_name(&started_at), "photos-2024-05-01_02-30-00");
    }

    #[test]
    fn the_library_variant_archives_the_library_tree() {
        let sources = archive_sources(&test_config(BackupVariant::Library, None));
        assert_eq!(sources, vec![PathBuf::from("/srv/library")]);
    }

    #[test]
    fn the_full_variant_adds_data_dir_and_dump_dir() {
        let sources = archive_sources(&test_config(BackupVariant::Full, Some("/srv/pgdata")));
        assert_eq!(
            sources,
            vec![
                PathBuf::from("/srv/library"),
                PathBuf::from("/srv/pgdata"),
                PathBuf::from("/srv/backups/database-backup"),
            ]
        );
    }

    #[test]
    fn create_excludes_the_regenerable_caches() -> anyhow::Result<()> {
        let runner = ScriptedRunner::new();
        create_archive(&test_config(BackupVariant::Library, None), &runner, "photos-now")?;

        let calls = runner.calls();
        assert_eq!(calls.len(), 1);
        let line = &calls[0];
        assert!(line.starts_with("borg create --stats /srv/backups::photos-now /srv/library"));
        assert!(line.contains("--exclude /srv/library/thumbs"));
        assert!(line.contains("--exclude /srv/library/encoded-video"));
        Ok(())
    }

    #[test]
    fn prune_renders_the_retention_policy() -> anyhow::Result<()> {
        let runner = ScriptedRunner::new();
        prune_repository(
            &test_config(BackupVariant::Library, None),
            &runner,
            &RetentionPolicy::default(),
        )?;

        assert_eq!(
            runner.calls(),
            vec!["borg prune --keep-daily=7 --keep-weekly=4 --keep-monthly=3 /srv/backups"]
        );
        Ok(())
    }

    #[test]
    fn archive_failures_carry_the_borg_exit_code() {
        let runner = ScriptedRunner::new().fail_on("borg compact", 2);
        let err = compact_repository(&test_config(BackupVariant::Library, None), &runner).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}

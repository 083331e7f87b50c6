// photobackup/src/config/mod.rs
use std::env;
use std::path::PathBuf;

use url::Url;

use crate::errors::{AppError, Result};
use crate::utils::constants::DEFAULT_APP_CONTAINER;

/// Which of the two backup layouts this run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackupVariant {
    /// Dump into a pre-existing directory inside the library and archive
    /// the library tree.
    Library,
    /// Dump under the backup root (created if absent) and additionally
    /// archive the database data directory.
    Full,
}

/// Immutable run configuration, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub variant: BackupVariant,
    /// Media library of the application (`UPLOAD_LOCATION`).
    pub library_path: PathBuf,
    /// Root of the borg repository (`BACKUP_PATH`).
    pub backup_path: PathBuf,
    /// Running database container the dump command is exec'd in.
    pub db_container: String,
    /// Database user passed to the dump command.
    pub db_user: String,
    /// Reference copy of the database data directory, full variant only.
    pub db_data_dir: Option<PathBuf>,
    /// Application container paused for maintenance mode.
    pub app_container: String,
    /// Monitoring endpoint for lifecycle pings, if any.
    pub healthcheck_url: Option<Url>,
}

impl Config {
    /// Loads the configuration from the process environment. A `.env` file,
    /// if present, has already been applied by the caller.
    pub fn from_env(variant: BackupVariant) -> Result<Self> {
        Self::from_lookup(variant, |key| env::var(key).ok())
    }

    /// Environment-independent loader; tests feed an in-memory map.
    pub(crate) fn from_lookup<F>(variant: BackupVariant, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let library_path = PathBuf::from(require(&lookup, "UPLOAD_LOCATION")?);
        let backup_path = PathBuf::from(require(&lookup, "BACKUP_PATH")?);
        let db_container = require(&lookup, "DB_CONTAINER")?;
        let db_user = require(&lookup, "DB_USER")?;

        let db_data_dir = match variant {
            BackupVariant::Full => Some(PathBuf::from(require(&lookup, "DB_DATA_DIR")?)),
            BackupVariant::Library => None,
        };

        let app_container =
            optional(&lookup, "APP_CONTAINER").unwrap_or_else(|| DEFAULT_APP_CONTAINER.to_string());

        let healthcheck_url = match optional(&lookup, "HEALTHCHECK_URL") {
            Some(raw) => Some(Url::parse(&raw).map_err(|err| {
                AppError::Config(format!("HEALTHCHECK_URL is not a valid URL ({}): {}", raw, err))
            })?),
            None => None,
        };

        Ok(Config {
            variant,
            library_path,
            backup_path,
            db_container,
            db_user,
            db_data_dir,
            app_container,
            healthcheck_url,
        })
    }
}

/// Required keys must be present and non-empty; the error names the key so
/// the operator knows what to fix.
fn require<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(AppError::Config(format!("{} must be set and non-empty", key))),
    }
}

fn optional<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key).filter(|value| !value.trim().is_empty())
}

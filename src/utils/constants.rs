// photobackup/src/utils/constants.rs
//
// Deployment constants shared across the backup flow.

/// Application container paused while the database dump runs, unless
/// `APP_CONTAINER` overrides it.
pub const DEFAULT_APP_CONTAINER: &str = "immich_server";

/// In-container version query for the application, tier one of the resolver.
pub const APP_VERSION_ARGS: &[&str] = &["immich-admin", "--version"];

/// In-container version query for the database engine.
pub const DB_VERSION_ARGS: &[&str] = &["postgres", "--version"];

/// Substituted into artifact names when a version cannot be resolved.
pub const VERSION_PLACEHOLDER: &str = "unknown";

/// Library subdirectories excluded from the archive. Both hold regenerable
/// caches (thumbnails, transcoded video).
pub const EXCLUDED_LIBRARY_DIRS: &[&str] = &["thumbs", "encoded-video"];

/// Directory receiving the dump file, relative to the library (library
/// variant) or the backup root (full variant).
pub const DUMP_DIR_NAME: &str = "database-backup";

/// Prefix of the timestamped archive names inside the repository.
pub const ARCHIVE_PREFIX: &str = "photos";

/// Lock file guarding the repository against concurrent runs.
pub const LOCK_FILE_NAME: &str = ".photobackup.lock";

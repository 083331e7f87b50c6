// photobackup/src/versions.rs
use log::debug;
use regex::Regex;

use crate::runner::CommandRunner;
use crate::utils::constants::{APP_VERSION_ARGS, DB_VERSION_ARGS};

/// Version strings of the application and the database engine, used only
/// for dump-file naming. Either side may be absent; downstream naming
/// substitutes a placeholder.
#[derive(Debug, Clone, Default)]
pub struct ResolvedVersions {
    pub app: Option<String>,
    pub db: Option<String>,
}

/// Best-effort resolution for both containers. Never fails: a resolver
/// miss only degrades the dump-file name. Must run before maintenance mode
/// is enabled, since an exec into a paused container cannot succeed.
pub fn resolve_versions(
    runner: &dyn CommandRunner,
    app_container: &str,
    db_container: &str,
) -> ResolvedVersions {
    let app = container_version(runner, app_container, APP_VERSION_ARGS);
    let db = container_version(runner, db_container, DB_VERSION_ARGS);
    debug!("Resolved versions: app={:?} db={:?}", app, db);
    ResolvedVersions { app, db }
}

/// Two-tier lookup: the in-container version command first, the declared
/// image tag second.
fn container_version(
    runner: &dyn CommandRunner,
    container: &str,
    version_args: &[&str],
) -> Option<String> {
    exec_version(runner, container, version_args).or_else(|| image_tag_version(runner, container))
}

fn exec_version(
    runner: &dyn CommandRunner,
    container: &str,
    version_args: &[&str],
) -> Option<String> {
    let mut args = vec!["exec", container];
    args.extend_from_slice(version_args);
    let output = runner.run("docker", &args).ok()?;
    if !output.success() {
        return None;
    }
    extract_version(&output.stdout)
}

fn image_tag_version(runner: &dyn CommandRunner, container: &str) -> Option<String> {
    let output = runner
        .run("docker", &["inspect", "--format", "{{.Config.Image}}", container])
        .ok()?;
    if !output.success() {
        return None;
    }
    let image = output.stdout.trim();
    let tag = image.rsplit(':').next()?;
    extract_version(tag)
}

/// Pulls the first version-looking substring (`1.2` or `1.2.3`) out of
/// arbitrary tool output or an image tag. Isolated so a parsing miss stays
/// a `None`, never an error.
fn extract_version(text: &str) -> Option<String> {
    let re = Regex::new(r"\d+\.\d+(?:\.\d+)*").ok()?;
    re.find(text).map(|m| m.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::test_support::ScriptedRunner;

    #[test]
    fn extracts_versions_from_tool_banners() {
        assert_eq!(
            extract_version("postgres (PostgreSQL) 14.10 (Debian 14.10-1.pgdg120+1)"),
            Some("14.10".to_string())
        );
        assert_eq!(extract_version("v1.94.1"), Some("1.94.1".to_string()));
        assert_eq!(extract_version("latest"), None);
        assert_eq!(extract_version(""), None);
    }

    #[test]
    fn prefers_the_in_container_query() {
        let runner = ScriptedRunner::new()
            .stdout_for("docker exec app", "v1.94.1\n")
            .stdout_for("docker exec db postgres --version", "postgres (PostgreSQL) 14.10\n");

        let versions = resolve_versions(&runner, "app", "db");
        assert_eq!(versions.app.as_deref(), Some("1.94.1"));
        assert_eq!(versions.db.as_deref(), Some("14.10"));
    }

    #[test]
    fn falls_back_to_the_image_tag() {
        let runner = ScriptedRunner::new()
            .fail_on("docker exec app", 126)
            .stdout_for(
                "docker inspect --format {{.Config.Image}} app",
                "ghcr.io/photos/server:v1.94.1\n",
            );

        let versions = resolve_versions(&runner, "app", "db");
        assert_eq!(versions.app.as_deref(), Some("1.94.1"));
        // db had neither tier scripted: the exec returns empty stdout and
        // the inspect output carries no version-looking tag.
        assert_eq!(versions.db, None);
    }

    #[test]
    fn resolver_misses_are_not_errors() {
        let runner = ScriptedRunner::new()
            .fail_on("docker exec", 1)
            .fail_on("docker inspect", 1);

        let versions = resolve_versions(&runner, "app", "db");
        assert_eq!(versions.app, None);
        assert_eq!(versions.db, None);
    }
}

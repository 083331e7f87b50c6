pub(crate) mod archive;
pub(crate) mod db_dump;
mod logic;

use crate::config::Config;
use crate::errors::Result;

/// Public entry point for the backup process.
/// Orchestrates maintenance mode, the database dump and the archive steps
/// for the variant carried by the configuration.
pub async fn run_backup_flow(config: &Config) -> Result<()> {
    logic::perform_backup_orchestration(config).await
}

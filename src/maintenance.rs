// photobackup/src/maintenance.rs
use log::{error, info, warn};

use crate::errors::Result;
use crate::runner::CommandRunner;

/// Run-scoped mirror of the remote maintenance state. Held in the run
/// context so the failure path can decide whether an undo is needed;
/// the local mode and the remote paused state must never diverge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceMode {
    Off,
    Enabling,
    On,
    Disabling,
}

/// Pauses and unpauses the application container around the database dump,
/// so no writes land while the snapshot is taken.
pub struct MaintenanceController {
    container: String,
    mode: MaintenanceMode,
}

impl MaintenanceController {
    pub fn new(container: &str) -> Self {
        Self {
            container: container.to_string(),
            mode: MaintenanceMode::Off,
        }
    }

    pub fn mode(&self) -> MaintenanceMode {
        self.mode
    }

    pub fn is_on(&self) -> bool {
        self.mode == MaintenanceMode::On
    }

    /// Stops the application from accepting writes. Must complete before
    /// the dump begins; a failure here is fatal to the run and leaves the
    /// mode at `Off` (nothing to undo).
    pub fn enable(&mut self, runner: &dyn CommandRunner) -> Result<()> {
        self.mode = MaintenanceMode::Enabling;
        let command = format!("docker pause {}", self.container);
        let result = runner
            .run("docker", &["pause", &self.container])
            .and_then(|output| output.require_success(&command));

        match result {
            Ok(_) => {
                self.mode = MaintenanceMode::On;
                info!("🔒 Maintenance mode enabled (paused container {})", self.container);
                Ok(())
            }
            Err(err) => {
                self.mode = MaintenanceMode::Off;
                error!("Failed to enable maintenance mode on {}: {}", self.container, err);
                Err(err)
            }
        }
    }

    /// Best-effort inverse of `enable`: a no-op success when maintenance
    /// was never entered. The mode is cleared only once the runtime
    /// confirms the unpause; on failure it stays `On` and the error is
    /// returned for the recovery path to log and discard.
    pub fn disable(&mut self, runner: &dyn CommandRunner) -> Result<()> {
        if self.mode != MaintenanceMode::On {
            return Ok(());
        }

        self.mode = MaintenanceMode::Disabling;
        let command = format!("docker unpause {}", self.container);
        let result = runner
            .run("docker", &["unpause", &self.container])
            .and_then(|output| output.require_success(&command));

        match result {
            Ok(_) => {
                self.mode = MaintenanceMode::Off;
                info!("🔓 Maintenance mode disabled (unpaused container {})", self.container);
                Ok(())
            }
            Err(err) => {
                self.mode = MaintenanceMode::On;
                warn!("Failed to disable maintenance mode on {}: {}", self.container, err);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::test_support::ScriptedRunner;

    #[test]
    fn enable_sets_the_mode_on_success() -> anyhow::Result<()> {
        let runner = ScriptedRunner::new();
        let mut controller = MaintenanceController::new("photos-app");

        controller.enable(&runner)?;
        assert!(controller.is_on());
        assert_eq!(runner.calls(), vec!["docker pause photos-app"]);
        Ok(())
    }

    #[test]
    fn enable_failure_leaves_the_mode_off() {
        let runner = ScriptedRunner::new().fail_on("docker pause", 125);
        let mut controller = MaintenanceController::new("photos-app");

        let err = controller.enable(&runner).unwrap_err();
        assert_eq!(err.exit_code(), 125);
        assert_eq!(controller.mode(), MaintenanceMode::Off);
    }

    #[test]
    fn disable_is_a_noop_when_maintenance_was_never_entered() -> anyhow::Result<()> {
        let runner = ScriptedRunner::new();
        let mut controller = MaintenanceController::new("photos-app");

        controller.disable(&runner)?;
        assert!(runner.calls().is_empty());
        Ok(())
    }

    #[test]
    fn disable_clears_the_mode_only_on_confirmed_success() -> anyhow::Result<()> {
        let failing = ScriptedRunner::new().fail_on("docker unpause", 1);
        let mut controller = MaintenanceController::new("photos-app");
        controller.enable(&failing)?;

        assert!(controller.disable(&failing).is_err());
        assert_eq!(controller.mode(), MaintenanceMode::On);

        let working = ScriptedRunner::new();
        controller.disable(&working)?;
        assert_eq!(controller.mode(), MaintenanceMode::Off);

        // A second disable is a no-op and issues no further commands.
        controller.disable(&working)?;
        assert_eq!(working.calls(), vec!["docker unpause photos-app"]);
        Ok(())
    }
}

// photobackup/src/runner.rs
use std::fs::File;
use std::path::Path;
use std::process::{Command, Stdio};

use which::which;

use crate::errors::{AppError, Result};

/// Captured outcome of one external command invocation.
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Converts a non-zero exit into the error carried to the process
    /// boundary. `command` is the human-readable invocation for the log;
    /// a missing exit code (e.g. killed by a signal) normalizes to 1.
    pub fn require_success(self, command: &str) -> Result<ExecOutput> {
        if self.success() {
            Ok(self)
        } else {
            Err(AppError::Command {
                command: command.to_string(),
                code: self.code.unwrap_or(1),
                stderr: self.stderr.trim().to_string(),
            })
        }
    }
}

/// Seam between the orchestration and the external tools it drives, so the
/// step sequence can be exercised without a container runtime present.
pub trait CommandRunner {
    /// Runs the command to completion, capturing stdout and stderr.
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecOutput>;

    /// Runs the command with stdout redirected into `stdout_file`. This is
    /// the dump contract: the external tool writes its payload to stdout.
    fn run_to_file(&self, program: &str, args: &[&str], stdout_file: &Path) -> Result<ExecOutput>;

    /// Pre-flight existence check for an external tool.
    fn check_tool(&self, name: &str) -> Result<()>;
}

/// Production runner backed by `std::process::Command`.
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> Result<ExecOutput> {
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|err| spawn_error(program, args, err))?;

        Ok(ExecOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn run_to_file(&self, program: &str, args: &[&str], stdout_file: &Path) -> Result<ExecOutput> {
        let file = File::create(stdout_file)?;
        let output = Command::new(program)
            .args(args)
            .stdout(Stdio::from(file))
            .output()
            .map_err(|err| spawn_error(program, args, err))?;

        Ok(ExecOutput {
            code: output.status.code(),
            stdout: String::new(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn check_tool(&self, name: &str) -> Result<()> {
        which(name).map(|_| ()).map_err(|_| {
            AppError::Preflight(format!(
                "{} executable not found in PATH. Please ensure it is installed before running a backup.",
                name
            ))
        })
    }
}

/// An unspawnable command (runtime missing, permission denied) is treated
/// like a failed command so the orchestrator's error path handles both.
fn spawn_error(program: &str, args: &[&str], err: std::io::Error) -> AppError {
    AppError::Command {
        command: format!("{} {}", program, args.join(" ")),
        code: 1,
        stderr: format!("failed to spawn: {}", err),
    }
}

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Pre-flight check failed: {0}")]
    Preflight(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Command `{command}` failed with exit code {code}: {stderr}")]
    Command {
        command: String,
        code: i32,
        stderr: String,
    },

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error), // To ease transition from existing code
}

impl AppError {
    /// Exit code carried to the process boundary. Configuration, pre-flight
    /// and I/O failures exit 1; a failed external command re-raises the
    /// child's own exit code.
    pub fn exit_code(&self) -> u8 {
        match self {
            AppError::Command { code, .. } if (1..=255).contains(code) => *code as u8,
            _ => 1,
        }
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

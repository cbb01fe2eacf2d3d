//! Backend return shapes and the single table that folds them into an
//! [`ActionResult`].

use crate::command::{Command, CommandKind};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

pub const GUI_FAILURE_MESSAGE: &str = "Failed to perform GUI action";

/// Captured result of one shell invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ShellOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl ShellOutput {
    /// The process never ran (or never finished): exit code 1, reason on stderr.
    pub fn launch_failure(reason: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: reason.into(),
            exit_code: 1,
        }
    }

    pub fn succeeded(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FileOpError {
    #[error("Path not allowed for safety reasons: {}", .0.display())]
    Restricted(PathBuf),
    #[error("File not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("Permission denied when creating directory: {}", .0.display())]
    CreateDirDenied(PathBuf),
    #[error("Permission denied when writing to file: {}", .0.display())]
    WriteDenied(PathBuf),
    #[error("Permission denied when deleting: {}", .0.display())]
    DeleteDenied(PathBuf),
    #[error("No path given for file operation")]
    EmptyPath,
    #[error("Unknown file operation: {0}")]
    UnknownOperation(String),
    #[error("{}: {reason}", .path.display())]
    Io { path: PathBuf, reason: String },
}

/// What a backend handed back, tagged by the backend that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOutcome {
    Shell(ShellOutput),
    Gui(bool),
    File(Result<String, FileOpError>),
}

/// The normalized record produced for every executed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionResult {
    pub success: bool,
    pub description: String,
    #[serde(rename = "type")]
    pub kind: CommandKind,
    pub output: String,
    pub error: String,
}

impl ActionResult {
    /// Unsuccessful record carrying the command's description and kind.
    pub fn pending(command: &Command) -> Self {
        Self {
            success: false,
            description: command.description().to_string(),
            kind: command.kind(),
            output: String::new(),
            error: String::new(),
        }
    }

    pub fn failed(command: &Command, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            ..Self::pending(command)
        }
    }

    pub fn with_outcome(self, outcome: BackendOutcome) -> Self {
        match outcome {
            BackendOutcome::Shell(out) => Self {
                success: out.succeeded(),
                output: out.stdout,
                error: out.stderr,
                ..self
            },
            BackendOutcome::Gui(true) => Self {
                success: true,
                ..self
            },
            BackendOutcome::Gui(false) => Self {
                success: false,
                error: GUI_FAILURE_MESSAGE.to_string(),
                ..self
            },
            BackendOutcome::File(Ok(message)) => Self {
                success: true,
                output: message,
                ..self
            },
            BackendOutcome::File(Err(err)) => Self {
                success: false,
                error: err.to_string(),
                ..self
            },
        }
    }
}

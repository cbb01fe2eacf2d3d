//! Typed representation of one validated action.
//!
//! A [`Command`] can only be built from one of the three known action shapes,
//! so everything downstream of the parser works against a closed set of kinds.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Screen position in pixels, serialized as `[x, y]`. Negative values are kept
/// so that out-of-bounds requests reach the GUI bounds check.
pub type Point = (i64, i64);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    CommandLine,
    GuiAction,
    FileOperation,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::CommandLine => "command_line",
            CommandKind::GuiAction => "gui_action",
            CommandKind::FileOperation => "file_operation",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShellAction {
    pub command: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GuiAction {
    /// click, right_click, double_click, type, press, hotkey or scroll.
    pub action: String,
    pub target: String,
    /// `None` means "wherever the pointer currently is".
    pub coordinates: Option<Point>,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileAction {
    /// read, write, append or delete.
    pub action: String,
    pub path: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Action {
    CommandLine(ShellAction),
    GuiAction(GuiAction),
    FileOperation(FileAction),
}

impl Action {
    pub fn kind(&self) -> CommandKind {
        match self {
            Action::CommandLine(_) => CommandKind::CommandLine,
            Action::GuiAction(_) => CommandKind::GuiAction,
            Action::FileOperation(_) => CommandKind::FileOperation,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Command {
    #[serde(flatten)]
    action: Action,
    description: String,
}

impl Command {
    pub fn new(action: Action, description: impl Into<String>) -> Self {
        Self {
            action,
            description: description.into(),
        }
    }

    pub fn shell(command: impl Into<String>, description: impl Into<String>) -> Self {
        Self::new(
            Action::CommandLine(ShellAction {
                command: command.into(),
            }),
            description,
        )
    }

    pub fn gui(action: GuiAction, description: impl Into<String>) -> Self {
        Self::new(Action::GuiAction(action), description)
    }

    pub fn file(action: FileAction, description: impl Into<String>) -> Self {
        Self::new(Action::FileOperation(action), description)
    }

    pub fn action(&self) -> &Action {
        &self.action
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn kind(&self) -> CommandKind {
        self.action.kind()
    }
}

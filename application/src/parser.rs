//! Converts the model's loosely structured `actions` list into [`Command`]s.
//!
//! Each entry is validated on its own. A malformed entry or an unknown `type`
//! is logged and skipped; the rest of the batch still parses.

use domain::command::{Command, FileAction, GuiAction, Point};
use serde::Deserialize;
use serde_json::Value;

const DEFAULT_DESCRIPTION: &str = "No description provided";

fn default_coordinates() -> Option<Point> {
    Some((0, 0))
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum RawAction {
    CommandLine {
        command: Option<String>,
        description: Option<String>,
    },
    GuiAction {
        action: Option<String>,
        target: Option<String>,
        // Absent -> [0, 0]; explicit null -> current pointer position.
        #[serde(default = "default_coordinates")]
        coordinates: Option<Point>,
        text: Option<String>,
        description: Option<String>,
    },
    FileOperation {
        action: Option<String>,
        path: Option<String>,
        content: Option<String>,
        description: Option<String>,
    },
}

impl RawAction {
    fn into_command(self) -> Command {
        match self {
            RawAction::CommandLine {
                command,
                description,
            } => Command::shell(command.unwrap_or_default(), describe(description)),
            RawAction::GuiAction {
                action,
                target,
                coordinates,
                text,
                description,
            } => Command::gui(
                GuiAction {
                    action: action.unwrap_or_default(),
                    target: target.unwrap_or_default(),
                    coordinates,
                    text: text.unwrap_or_default(),
                },
                describe(description),
            ),
            RawAction::FileOperation {
                action,
                path,
                content,
                description,
            } => Command::file(
                FileAction {
                    action: action.unwrap_or_default(),
                    path: path.unwrap_or_default(),
                    content: content.unwrap_or_default(),
                },
                describe(description),
            ),
        }
    }
}

fn describe(description: Option<String>) -> String {
    description.unwrap_or_else(|| DEFAULT_DESCRIPTION.to_string())
}

#[derive(Debug, Default, Clone, Copy)]
pub struct CommandParser;

impl CommandParser {
    pub fn new() -> Self {
        Self
    }

    /// Commands in input order. Never fails; a missing `actions` key yields
    /// an empty list.
    pub fn parse(&self, raw: &Value) -> Vec<Command> {
        let actions = match raw.get("actions") {
            Some(Value::Array(actions)) => actions,
            Some(other) => {
                tracing::warn!(found = %other, "`actions` is not a list; nothing to execute");
                return Vec::new();
            }
            None => {
                tracing::debug!("response has no `actions` key");
                return Vec::new();
            }
        };

        let commands: Vec<Command> = actions
            .iter()
            .enumerate()
            .filter_map(|(index, entry)| match RawAction::deserialize(entry) {
                Ok(action) => Some(action.into_command()),
                Err(err) => {
                    tracing::warn!(index, %err, "skipping malformed action");
                    None
                }
            })
            .collect();

        tracing::info!(count = commands.len(), "parsed commands from LLM response");
        commands
    }
}

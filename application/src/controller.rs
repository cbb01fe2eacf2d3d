use domain::command::{Action, Command};
use domain::outcome::{ActionResult, BackendOutcome};
use futures::FutureExt;
use infrastructure::automation::SystemAutomation;
use infrastructure::gui::InputDriver;
use shared::telemetry::Telemetry;
use std::any::Any;
use std::panic::AssertUnwindSafe;

/// Routes a [`Command`] to its backend and folds the outcome into an
/// [`ActionResult`]. Always produces a result, even if a backend panics.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionController;

impl ActionController {
    pub fn new() -> Self {
        Self
    }

    pub async fn execute<D: InputDriver>(
        &self,
        command: &Command,
        automation: &SystemAutomation<D>,
    ) -> ActionResult {
        let result = ActionResult::pending(command);
        let telemetry = Telemetry::start(command.kind().as_str());

        let result = match AssertUnwindSafe(dispatch(command, automation))
            .catch_unwind()
            .await
        {
            Ok(outcome) => result.with_outcome(outcome),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                tracing::error!(description = command.description(), %message, "error executing action");
                ActionResult {
                    error: message,
                    ..result
                }
            }
        };

        telemetry.finish(result.success);
        result
    }
}

async fn dispatch<D: InputDriver>(
    command: &Command,
    automation: &SystemAutomation<D>,
) -> BackendOutcome {
    match command.action() {
        Action::CommandLine(shell) => BackendOutcome::Shell(automation.shell.run(&shell.command).await),
        Action::GuiAction(gui) => {
            let target = (!gui.target.is_empty()).then_some(gui.target.as_str());
            BackendOutcome::Gui(
                automation
                    .gui
                    .act(&gui.action, target, gui.coordinates, Some(&gui.text))
                    .await,
            )
        }
        Action::FileOperation(file) => {
            BackendOutcome::File(automation.files.op(&file.action, &file.path, Some(&file.content)))
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "action panicked".to_string()
    }
}

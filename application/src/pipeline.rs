use crate::controller::ActionController;
use crate::parser::CommandParser;
use domain::command::Command;
use domain::outcome::ActionResult;
use domain::planner::{reasoning, ActionPlanner};
use infrastructure::automation::SystemAutomation;
use infrastructure::gui::InputDriver;

pub const SKIPPED_MESSAGE: &str = "Skipped by operator";

/// Hooks the presentation layer uses to follow a run.
pub trait PipelineObserver {
    fn on_reasoning(&mut self, _reasoning: &str) {}

    /// Return `false` to skip the command.
    fn on_command(&mut self, _command: &Command) -> bool {
        true
    }

    fn on_result(&mut self, _result: &ActionResult) {}
}

impl PipelineObserver for () {}

/// Instruction -> model -> parser -> controller, one command at a time.
pub struct Pipeline<P, D> {
    planner: P,
    parser: CommandParser,
    controller: ActionController,
    automation: SystemAutomation<D>,
}

impl<P: ActionPlanner, D: InputDriver> Pipeline<P, D> {
    pub fn new(planner: P, automation: SystemAutomation<D>) -> Self {
        Self {
            planner,
            parser: CommandParser::new(),
            controller: ActionController::new(),
            automation,
        }
    }

    pub fn automation(&self) -> &SystemAutomation<D> {
        &self.automation
    }

    /// Results come back in command order. A command only starts once the
    /// previous one has finished.
    pub async fn run_instruction(
        &self,
        prompt: &str,
        observer: &mut impl PipelineObserver,
    ) -> Vec<ActionResult> {
        tracing::info!(prompt, "processing instruction");
        let raw = self.planner.get_actions(prompt).await;
        let reasoning = reasoning(&raw);
        if !reasoning.is_empty() {
            observer.on_reasoning(reasoning);
        }

        let commands = self.parser.parse(&raw);
        let mut results = Vec::with_capacity(commands.len());
        for command in &commands {
            let result = if observer.on_command(command) {
                self.controller.execute(command, &self.automation).await
            } else {
                tracing::info!(description = command.description(), "command skipped");
                ActionResult::failed(command, SKIPPED_MESSAGE)
            };
            observer.on_result(&result);
            results.push(result);
        }

        let succeeded = results.iter().filter(|r| r.success).count();
        tracing::info!(total = results.len(), succeeded, "instruction finished");
        results
    }
}

use colored::Colorize;
use dialoguer::theme::ColorfulTheme;
use dialoguer::Input;
use domain::outcome::ActionResult;
use std::collections::VecDeque;

const MAX_HISTORY: usize = 10;

/// Terminal feedback for the operator, plus a short history of results.
pub struct FeedbackDisplay {
    history: VecDeque<ActionResult>,
    max_history: usize,
}

impl Default for FeedbackDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl FeedbackDisplay {
    pub fn new() -> Self {
        Self {
            history: VecDeque::with_capacity(MAX_HISTORY),
            max_history: MAX_HISTORY,
        }
    }

    pub fn show_welcome(&self) {
        println!("{}", "=".repeat(60).blue());
        println!("{}", "MCP - natural language computer control".blue().bold());
        println!("{}", "=".repeat(60).blue());
        println!("Describe what you want done. Type 'exit' or 'quit' to leave,");
        println!("'history' to see the last {} results.", self.max_history);
        println!();
    }

    /// `None` when the terminal is gone (EOF or read failure).
    pub fn read_instruction(&self) -> Option<String> {
        let input = Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt("What would you like me to do?")
            .allow_empty(true)
            .interact_text();
        match input {
            Ok(line) => Some(line),
            Err(err) => {
                tracing::debug!(%err, "stopped reading instructions");
                None
            }
        }
    }

    pub fn show_reasoning(&self, reasoning: &str) {
        println!("\n{} {}", "Reasoning:".cyan().bold(), reasoning);
    }

    pub fn update_status(&self, description: &str) {
        println!("\n{} {}", "Executing:".yellow().bold(), description);
    }

    pub fn show_result(&mut self, result: &ActionResult) {
        println!("{}", render_result(result));
        self.remember(result.clone());
    }

    pub fn show_history(&self) {
        if self.history.is_empty() {
            println!("{}", "No actions executed yet.".yellow());
            return;
        }
        println!("\n{}", "Recent actions:".bold());
        for (i, result) in self.history.iter().enumerate() {
            let mark = if result.success { "✓".green() } else { "✗".red() };
            println!("  {} {} {} ({})", format!("[{}]", i + 1).blue(), mark, result.description, result.kind);
        }
    }

    pub fn show_error(&self, message: &str) {
        eprintln!("{} {}", "Error:".red().bold(), message);
    }

    pub fn show_exit_message(&self) {
        println!("\n{}", "Goodbye.".blue());
    }

    pub fn history(&self) -> impl Iterator<Item = &ActionResult> {
        self.history.iter()
    }

    fn remember(&mut self, result: ActionResult) {
        if self.history.len() == self.max_history {
            self.history.pop_front();
        }
        self.history.push_back(result);
    }
}

pub fn render_result(result: &ActionResult) -> String {
    let mut lines = Vec::new();
    if result.success {
        lines.push(format!("{} {}", "✓".green().bold(), result.description.green()));
    } else {
        lines.push(format!("{} {}", "✗".red().bold(), result.description.red()));
    }
    lines.push(format!("  Type: {}", result.kind));
    if !result.output.trim().is_empty() {
        lines.push(format!("  Output:\n{}", indent(result.output.trim_end())));
    }
    if !result.error.trim().is_empty() {
        lines.push(format!("  {}\n{}", "Error:".red(), indent(result.error.trim_end()).red()));
    }
    lines.join("\n")
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| format!("    {line}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::command::Command;
    use domain::outcome::{BackendOutcome, ShellOutput};

    fn result(success: bool, description: &str) -> ActionResult {
        let command = Command::shell("ls", description);
        ActionResult::pending(&command).with_outcome(BackendOutcome::Shell(ShellOutput {
            stdout: "a.txt\nb.txt\n".into(),
            stderr: if success { String::new() } else { "boom".into() },
            exit_code: if success { 0 } else { 2 },
        }))
    }

    #[test]
    fn renders_success_and_failure() {
        colored::control::set_override(false);

        let ok = render_result(&result(true, "list files"));
        assert_eq!(
            ok,
            "✓ list files\n  Type: command_line\n  Output:\n    a.txt\n    b.txt"
        );

        let failed = render_result(&result(false, "list files"));
        assert!(failed.starts_with("✗ list files"));
        assert!(failed.ends_with("  Error:\n    boom"));
    }

    #[test]
    fn history_keeps_the_last_ten() {
        let mut display = FeedbackDisplay::new();
        for i in 0..12 {
            display.remember(result(true, &format!("step {i}")));
        }
        let kept: Vec<&str> = display.history().map(|r| r.description.as_str()).collect();
        assert_eq!(kept.len(), 10);
        assert_eq!(kept.first(), Some(&"step 2"));
        assert_eq!(kept.last(), Some(&"step 11"));
    }
}

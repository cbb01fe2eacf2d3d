use crate::display::FeedbackDisplay;
use application::pipeline::{Pipeline, PipelineObserver};
use clap::Parser;
use domain::command::Command;
use domain::outcome::ActionResult;
use infrastructure::automation::SystemAutomation;
use infrastructure::config::AppConfig;
use infrastructure::llm_client::LlmClient;
use infrastructure::xdotool::XdotoolDriver;
use shared::confirmation::confirm_step;
use shared::logging::{init_logging, WorkerGuard};
use shared::types::Result;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "mcp")]
#[command(about = "Control this computer with natural language instructions")]
pub struct Cli {
    /// Path to the JSON configuration file
    #[arg(long, default_value = "config.json")]
    pub config: PathBuf,

    /// Ask before executing each command
    #[arg(long)]
    pub confirm: bool,

    /// Only log to the log file, not to stderr
    #[arg(short, long)]
    pub quiet: bool,

    /// Run a single instruction and exit
    #[arg(trailing_var_arg = true)]
    pub args: Vec<String>,
}

pub struct CliApp {
    pipeline: Pipeline<LlmClient, XdotoolDriver>,
    display: FeedbackDisplay,
    _log_guard: Option<WorkerGuard>,
}

impl CliApp {
    pub fn new(cli: &Cli) -> Result<Self> {
        let config = AppConfig::load(&cli.config)?;
        let log_guard = init_logging(config.log_file.as_deref(), !cli.quiet)?;

        let automation = SystemAutomation::for_host(&config);
        if let Err(err) = automation.init_output_directory() {
            tracing::warn!(error = %format!("{err:#}"), "could not prepare output directory");
        }
        let planner = LlmClient::new(config.llm.clone())?;
        tracing::info!(provider = %planner.provider(), "MCP initialized");

        Ok(Self {
            pipeline: Pipeline::new(planner, automation),
            display: FeedbackDisplay::new(),
            _log_guard: log_guard,
        })
    }

    pub async fn run(&mut self, cli: Cli) -> Result<()> {
        let instruction = cli.args.join(" ");
        if instruction.trim().is_empty() {
            self.interactive(cli.confirm).await
        } else {
            self.process(instruction.trim(), cli.confirm).await;
            Ok(())
        }
    }

    async fn interactive(&mut self, confirm: bool) -> Result<()> {
        self.display.show_welcome();
        while let Some(line) = self.display.read_instruction() {
            let instruction = line.trim();
            if instruction.is_empty() {
                continue;
            }
            if instruction.eq_ignore_ascii_case("exit") || instruction.eq_ignore_ascii_case("quit") {
                break;
            }
            if instruction.eq_ignore_ascii_case("history") {
                self.display.show_history();
                continue;
            }
            self.process(instruction, confirm).await;
        }
        self.display.show_exit_message();
        Ok(())
    }

    async fn process(&mut self, instruction: &str, confirm: bool) -> Vec<ActionResult> {
        let mut observer = ConsoleObserver {
            display: &mut self.display,
            confirm,
        };
        let results = self.pipeline.run_instruction(instruction, &mut observer).await;
        if results.is_empty() {
            self.display.show_error("No actions to execute.");
        }
        results
    }
}

struct ConsoleObserver<'a> {
    display: &'a mut FeedbackDisplay,
    confirm: bool,
}

impl PipelineObserver for ConsoleObserver<'_> {
    fn on_reasoning(&mut self, reasoning: &str) {
        self.display.show_reasoning(reasoning);
    }

    fn on_command(&mut self, command: &Command) -> bool {
        self.display.update_status(command.description());
        if !self.confirm {
            return true;
        }
        match confirm_step(command.description()) {
            Ok(approved) => approved,
            Err(err) => {
                tracing::warn!(%err, "confirmation prompt failed; skipping command");
                false
            }
        }
    }

    fn on_result(&mut self, result: &ActionResult) {
        self.display.show_result(result);
    }
}

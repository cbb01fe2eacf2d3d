use crate::config::AppConfig;
use crate::file_ops::FileBackend;
use crate::gui::{GuiBackend, GuiSettings, InputDriver};
use crate::shell::ShellBackend;
use crate::xdotool::XdotoolDriver;
use anyhow::Context;
use shared::types::Result;
use std::fs;
use std::path::PathBuf;

const OUTPUT_README: &str = "This directory contains files created by the MCP tool.\n\
It is used when the tool needs to write to example or placeholder paths.\n";

/// The three host backends a command can be dispatched to.
pub struct SystemAutomation<D> {
    pub shell: ShellBackend,
    pub gui: GuiBackend<D>,
    pub files: FileBackend,
}

impl<D: InputDriver> SystemAutomation<D> {
    pub fn new(shell: ShellBackend, gui: GuiBackend<D>, files: FileBackend) -> Self {
        Self { shell, gui, files }
    }

    /// Creates the placeholder-redirect directory and its README marker.
    pub fn init_output_directory(&self) -> Result<PathBuf> {
        let output_dir = self.files.output_dir().to_path_buf();
        if !output_dir.exists() {
            fs::create_dir_all(&output_dir).with_context(|| {
                format!("Failed to create output directory {}", output_dir.display())
            })?;
            tracing::info!(dir = %output_dir.display(), "created output directory");
        }

        let readme = output_dir.join("README.txt");
        if !readme.exists() {
            fs::write(&readme, OUTPUT_README)
                .with_context(|| format!("Failed to write {}", readme.display()))?;
        }
        Ok(output_dir)
    }
}

impl SystemAutomation<XdotoolDriver> {
    pub fn for_host(config: &AppConfig) -> Self {
        let automation = &config.automation;
        let shell = ShellBackend::new(automation.shell_timeout());
        let gui = GuiBackend::new(
            XdotoolDriver::new(automation.gui_timeout()),
            GuiSettings {
                pause: automation.gui_pause(),
                failsafe: automation.failsafe,
            },
        );
        let files = FileBackend::new(config.safety.policy(), &automation.output_dir);
        tracing::info!(
            restricted = files.policy().restricted_paths().len(),
            output_dir = %files.output_dir().display(),
            "system automation initialized"
        );
        Self::new(shell, gui, files)
    }
}

//! Fixtures shared by the end-to-end tests: a driver that records instead of
//! moving the real pointer, and a planner that replays a fixed response.

use domain::command::Point;
use domain::planner::ActionPlanner;
use domain::safety_policy::{SafetyPolicy, DEFAULT_RESTRICTED_PATHS};
use infrastructure::automation::SystemAutomation;
use infrastructure::file_ops::FileBackend;
use infrastructure::gui::{DriverError, GuiBackend, GuiSettings, InputDriver, MouseButton};
use infrastructure::shell::ShellBackend;
use serde_json::Value;
use std::path::Path;
use std::sync::Mutex;
use std::time::Duration;

pub struct RecordingDriver {
    screen: (i64, i64),
    pointer: Point,
    calls: Mutex<Vec<String>>,
}

impl Default for RecordingDriver {
    fn default() -> Self {
        Self::with_screen((1920, 1080))
    }
}

impl RecordingDriver {
    pub fn with_screen(screen: (i64, i64)) -> Self {
        Self {
            screen,
            pointer: (screen.0 / 2, screen.1 / 2),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    fn record(&self, call: String) -> Result<(), DriverError> {
        self.calls
            .lock()
            .map_err(|_| DriverError::Failed("recorder poisoned".into()))?
            .push(call);
        Ok(())
    }
}

impl InputDriver for RecordingDriver {
    async fn screen_size(&self) -> Result<(i64, i64), DriverError> {
        Ok(self.screen)
    }

    async fn pointer_position(&self) -> Result<Point, DriverError> {
        Ok(self.pointer)
    }

    async fn click(&self, at: Point, button: MouseButton, clicks: u8) -> Result<(), DriverError> {
        self.record(format!("click {button:?} x{clicks} at {},{}", at.0, at.1))
    }

    async fn type_text(&self, text: &str) -> Result<(), DriverError> {
        self.record(format!("type {text}"))
    }

    async fn press_key(&self, key: &str) -> Result<(), DriverError> {
        self.record(format!("press {key}"))
    }

    async fn hotkey(&self, keys: &[&str]) -> Result<(), DriverError> {
        self.record(format!("hotkey {}", keys.join("+")))
    }

    async fn scroll(&self, amount: i64) -> Result<(), DriverError> {
        self.record(format!("scroll {amount}"))
    }
}

/// Replays one canned model response for every prompt.
pub struct ScriptedPlanner(pub Value);

impl ActionPlanner for ScriptedPlanner {
    async fn get_actions(&self, _prompt: &str) -> Value {
        self.0.clone()
    }
}

/// Backends rooted at `dir`, with the built-in restricted set and no GUI pause.
pub fn automation_in(dir: &Path) -> SystemAutomation<RecordingDriver> {
    let policy = SafetyPolicy::with_base_dir(DEFAULT_RESTRICTED_PATHS, dir);
    SystemAutomation::new(
        ShellBackend::new(Some(Duration::from_secs(10))),
        GuiBackend::new(
            RecordingDriver::default(),
            GuiSettings {
                pause: Duration::ZERO,
                failsafe: true,
            },
        ),
        FileBackend::new(policy, "mcp_output"),
    )
}

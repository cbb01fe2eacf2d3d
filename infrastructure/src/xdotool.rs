//! [`InputDriver`] backed by the `xdotool` command-line tool (X11).

use crate::gui::{DriverError, InputDriver, MouseButton};
use domain::command::Point;
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;

const TYPE_DELAY_MS: &str = "12";

#[derive(Debug, Clone)]
pub struct XdotoolDriver {
    program: String,
    timeout: Duration,
}

impl XdotoolDriver {
    pub fn new(timeout: Duration) -> Self {
        Self {
            program: "xdotool".to_string(),
            timeout,
        }
    }

    async fn run(&self, args: &[&str]) -> Result<String, DriverError> {
        tracing::debug!(program = %self.program, ?args, "invoking input driver");

        let child = Command::new(&self.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::NotFound => {
                    DriverError::Unavailable(format!("{} not found in PATH", self.program))
                }
                _ => DriverError::Failed(err.to_string()),
            })?;

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| DriverError::TimedOut(self.timeout))?
            .map_err(|err| DriverError::Failed(err.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let reason = if stderr.is_empty() {
                format!("{} exited with {}", self.program, output.status)
            } else {
                stderr
            };
            return Err(DriverError::Failed(reason));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl InputDriver for XdotoolDriver {
    async fn screen_size(&self) -> Result<(i64, i64), DriverError> {
        let out = self.run(&["getdisplaygeometry"]).await?;
        parse_geometry(&out)
    }

    async fn pointer_position(&self) -> Result<Point, DriverError> {
        let out = self.run(&["getmouselocation", "--shell"]).await?;
        parse_mouse_location(&out)
    }

    async fn click(&self, at: Point, button: MouseButton, clicks: u8) -> Result<(), DriverError> {
        let x = at.0.to_string();
        let y = at.1.to_string();
        let repeat = clicks.to_string();
        let button = match button {
            MouseButton::Left => "1",
            MouseButton::Right => "3",
        };
        self.run(&["mousemove", &x, &y, "click", "--repeat", &repeat, button])
            .await
            .map(drop)
    }

    async fn type_text(&self, text: &str) -> Result<(), DriverError> {
        self.run(&["type", "--delay", TYPE_DELAY_MS, "--", text])
            .await
            .map(drop)
    }

    async fn press_key(&self, key: &str) -> Result<(), DriverError> {
        let key = keysym(key);
        self.run(&["key", "--", &key]).await.map(drop)
    }

    async fn hotkey(&self, keys: &[&str]) -> Result<(), DriverError> {
        let chord = keys.iter().map(|k| keysym(k)).collect::<Vec<_>>().join("+");
        self.run(&["key", "--", &chord]).await.map(drop)
    }

    async fn scroll(&self, amount: i64) -> Result<(), DriverError> {
        if amount == 0 {
            return Ok(());
        }
        // X11 wheel: button 4 scrolls up, 5 down.
        let button = if amount > 0 { "4" } else { "5" };
        let repeat = amount.unsigned_abs().to_string();
        self.run(&["click", "--repeat", &repeat, button])
            .await
            .map(drop)
    }
}

/// Maps common automation key names onto X keysym names.
fn keysym(name: &str) -> String {
    let lower = name.trim().to_ascii_lowercase();
    let mapped = match lower.as_str() {
        "enter" | "return" => "Return",
        "esc" | "escape" => "Escape",
        "tab" => "Tab",
        "space" => "space",
        "backspace" => "BackSpace",
        "delete" | "del" => "Delete",
        "insert" => "Insert",
        "home" => "Home",
        "end" => "End",
        "pageup" | "pgup" => "Prior",
        "pagedown" | "pgdn" => "Next",
        "up" => "Up",
        "down" => "Down",
        "left" => "Left",
        "right" => "Right",
        "ctrl" | "control" | "ctrlleft" => "ctrl",
        "alt" | "altleft" | "option" => "alt",
        "shift" | "shiftleft" => "shift",
        "win" | "winleft" | "super" | "command" | "cmd" => "super",
        "capslock" => "Caps_Lock",
        "printscreen" | "prtsc" => "Print",
        _ => {
            if let Some(n) = lower.strip_prefix('f').and_then(|n| n.parse::<u8>().ok()) {
                return format!("F{n}");
            }
            return name.trim().to_string();
        }
    };
    mapped.to_string()
}

fn parse_geometry(out: &str) -> Result<(i64, i64), DriverError> {
    let mut parts = out.split_whitespace().map(str::parse::<i64>);
    match (parts.next(), parts.next()) {
        (Some(Ok(w)), Some(Ok(h))) => Ok((w, h)),
        _ => Err(DriverError::BadOutput(out.trim().to_string())),
    }
}

fn parse_mouse_location(out: &str) -> Result<Point, DriverError> {
    let mut x = None;
    let mut y = None;
    for line in out.lines() {
        if let Some(v) = line.strip_prefix("X=") {
            x = v.trim().parse().ok();
        } else if let Some(v) = line.strip_prefix("Y=") {
            y = v.trim().parse().ok();
        }
    }
    match (x, y) {
        (Some(x), Some(y)) => Ok((x, y)),
        _ => Err(DriverError::BadOutput(out.trim().to_string())),
    }
}

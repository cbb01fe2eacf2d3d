//! Synthesized pointer and keyboard input.
//!
//! [`GuiBackend`] validates a requested action and forwards it to an
//! [`InputDriver`], which owns the actual host interaction.

use domain::command::Point;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_SCROLL_AMOUNT: i64 = 10;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("input driver unavailable: {0}")]
    Unavailable(String),
    #[error("input driver failed: {0}")]
    Failed(String),
    #[error("input driver timed out after {0:?}")]
    TimedOut(Duration),
    #[error("unexpected input driver output: {0}")]
    BadOutput(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
}

/// Host input device. Every call blocks the pipeline until the input has been
/// delivered or the driver gives up.
pub trait InputDriver {
    /// Width and height in pixels.
    fn screen_size(&self) -> impl Future<Output = Result<(i64, i64), DriverError>> + Send;
    fn pointer_position(&self) -> impl Future<Output = Result<Point, DriverError>> + Send;
    fn click(
        &self,
        at: Point,
        button: MouseButton,
        clicks: u8,
    ) -> impl Future<Output = Result<(), DriverError>> + Send;
    fn type_text(&self, text: &str) -> impl Future<Output = Result<(), DriverError>> + Send;
    fn press_key(&self, key: &str) -> impl Future<Output = Result<(), DriverError>> + Send;
    fn hotkey(&self, keys: &[&str]) -> impl Future<Output = Result<(), DriverError>> + Send;
    /// Positive amounts scroll up, negative down.
    fn scroll(&self, amount: i64) -> impl Future<Output = Result<(), DriverError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GuiVerb {
    Click,
    RightClick,
    DoubleClick,
    Type,
    Press,
    Hotkey,
    Scroll,
}

impl FromStr for GuiVerb {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "click" => Ok(GuiVerb::Click),
            "right_click" => Ok(GuiVerb::RightClick),
            "double_click" => Ok(GuiVerb::DoubleClick),
            "type" => Ok(GuiVerb::Type),
            "press" => Ok(GuiVerb::Press),
            "hotkey" => Ok(GuiVerb::Hotkey),
            "scroll" => Ok(GuiVerb::Scroll),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct GuiSettings {
    /// Pause after every delivered action.
    pub pause: Duration,
    /// Refuse to act while the pointer rests in a screen corner.
    pub failsafe: bool,
}

impl Default for GuiSettings {
    fn default() -> Self {
        Self {
            pause: Duration::from_millis(500),
            failsafe: true,
        }
    }
}

pub struct GuiBackend<D> {
    driver: D,
    settings: GuiSettings,
}

impl<D: InputDriver> GuiBackend<D> {
    pub fn new(driver: D, settings: GuiSettings) -> Self {
        Self { driver, settings }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Performs one GUI action. Invalid input and driver faults are logged
    /// and reported as `false`.
    pub async fn act(
        &self,
        action: &str,
        target: Option<&str>,
        coordinates: Option<Point>,
        text: Option<&str>,
    ) -> bool {
        tracing::info!(
            action,
            target = target.unwrap_or(""),
            ?coordinates,
            "performing GUI action"
        );

        let attempt = AssertUnwindSafe(self.try_act(action, coordinates, text.unwrap_or("")))
            .catch_unwind()
            .await;
        match attempt {
            Ok(Ok(true)) => {
                tokio::time::sleep(self.settings.pause).await;
                true
            }
            Ok(Ok(false)) => false,
            Ok(Err(err)) => {
                tracing::error!(action, %err, "error performing GUI action");
                false
            }
            Err(_) => {
                tracing::error!(action, "input driver panicked");
                false
            }
        }
    }

    async fn try_act(
        &self,
        action: &str,
        coordinates: Option<Point>,
        text: &str,
    ) -> Result<bool, DriverError> {
        let Ok(verb) = action.parse::<GuiVerb>() else {
            tracing::warn!(action, "unknown GUI action");
            return Ok(false);
        };

        if self.settings.failsafe && self.pointer_in_corner().await? {
            tracing::warn!(action, "fail-safe triggered: pointer is in a screen corner");
            return Ok(false);
        }

        match verb {
            GuiVerb::Click | GuiVerb::RightClick | GuiVerb::DoubleClick => {
                let at = match coordinates {
                    Some(point) => point,
                    None => self.driver.pointer_position().await?,
                };
                let screen = self.driver.screen_size().await?;
                if !within_screen(at, screen) {
                    tracing::warn!(x = at.0, y = at.1, "coordinates out of screen bounds");
                    return Ok(false);
                }
                let (button, clicks) = match verb {
                    GuiVerb::RightClick => (MouseButton::Right, 1),
                    GuiVerb::DoubleClick => (MouseButton::Left, 2),
                    _ => (MouseButton::Left, 1),
                };
                self.driver.click(at, button, clicks).await?;
            }
            GuiVerb::Type => {
                if text.is_empty() {
                    tracing::warn!("type action called with no text");
                    return Ok(false);
                }
                self.driver.type_text(text).await?;
            }
            GuiVerb::Press => {
                let key = text.trim();
                if key.is_empty() {
                    tracing::warn!("press action called with no key");
                    return Ok(false);
                }
                self.driver.press_key(key).await?;
            }
            GuiVerb::Hotkey => {
                let Some(keys) = parse_hotkey(text) else {
                    tracing::warn!(text, "hotkey action called with invalid format");
                    return Ok(false);
                };
                self.driver.hotkey(&keys).await?;
            }
            GuiVerb::Scroll => {
                let Some(amount) = parse_scroll(text) else {
                    tracing::warn!(text, "scroll amount is not an integer");
                    return Ok(false);
                };
                self.driver.scroll(amount).await?;
            }
        }
        Ok(true)
    }

    async fn pointer_in_corner(&self) -> Result<bool, DriverError> {
        let (x, y) = self.driver.pointer_position().await?;
        let (width, height) = self.driver.screen_size().await?;
        let on_x_edge = x <= 0 || x >= width - 1;
        let on_y_edge = y <= 0 || y >= height - 1;
        Ok(on_x_edge && on_y_edge)
    }
}

fn within_screen((x, y): Point, (width, height): (i64, i64)) -> bool {
    (0..width).contains(&x) && (0..height).contains(&y)
}

/// `"ctrl+shift+t"` -> `["ctrl", "shift", "t"]`; needs at least two keys.
fn parse_hotkey(text: &str) -> Option<Vec<&str>> {
    let keys: Vec<&str> = text.split('+').map(str::trim).collect();
    if keys.len() < 2 || keys.iter().any(|k| k.is_empty()) {
        return None;
    }
    Some(keys)
}

/// Empty text scrolls by the default amount; anything else must be an integer.
fn parse_scroll(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return Some(DEFAULT_SCROLL_AMOUNT);
    }
    text.parse().ok()
}

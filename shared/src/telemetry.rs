use std::time::{Duration, Instant};

/// Wall-clock timer for one pipeline step, reported through `tracing`.
pub struct Telemetry {
    label: String,
    start: Instant,
}

impl Telemetry {
    pub fn start(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn finish(self, success: bool) -> Duration {
        let elapsed = self.elapsed();
        tracing::debug!(
            step = %self.label,
            elapsed_ms = elapsed.as_millis() as u64,
            success,
            "step finished"
        );
        elapsed
    }
}

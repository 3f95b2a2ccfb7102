use serde::Deserialize;
use std::time::Duration;

/// How the reader task behaves after a failed connect.
///
/// The defaults retry forever with a fixed 2 s pause. Backoff growth and an
/// attempt cap are opt-in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ReconnectPolicy {
    /// Pause after the first failed attempt.
    pub delay_ms: u64,
    /// Upper bound for the pause once backoff is in effect.
    pub max_delay_ms: u64,
    /// Growth factor per failed attempt. `1.0` keeps the pause fixed.
    pub multiplier: f64,
    /// Give up after this many consecutive failures. `None` never gives up.
    pub max_attempts: Option<u32>,
}

pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            delay_ms: DEFAULT_RECONNECT_DELAY.as_millis() as u64,
            max_delay_ms: DEFAULT_MAX_RECONNECT_DELAY.as_millis() as u64,
            multiplier: 1.0,
            max_attempts: None,
        }
    }
}

impl ReconnectPolicy {
    /// Retry forever with the same pause between attempts.
    pub fn fixed(delay: Duration) -> Self {
        Self {
            delay_ms: delay.as_millis() as u64,
            ..Self::default()
        }
    }

    pub fn with_backoff(mut self, multiplier: f64, max_delay: Duration) -> Self {
        self.multiplier = multiplier;
        self.max_delay_ms = max_delay.as_millis() as u64;
        self
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = Some(attempts);
        self
    }

    /// Pause to take after `failures` consecutive failed attempts (1-based).
    pub fn delay_for(&self, failures: u32) -> Duration {
        let base = self.delay_ms as f64;
        if self.multiplier <= 1.0 || !self.multiplier.is_finite() {
            return Duration::from_millis(self.delay_ms);
        }

        let exponent = failures.saturating_sub(1).min(64) as i32;
        let grown = base * self.multiplier.powi(exponent);
        let capped = grown.min(self.max_delay_ms.max(self.delay_ms) as f64);
        Duration::from_millis(capped as u64)
    }

    /// True once `failures` has reached the configured cap.
    pub fn gives_up_after(&self, failures: u32) -> bool {
        matches!(self.max_attempts, Some(max) if failures >= max)
    }
}

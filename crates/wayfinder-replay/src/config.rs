//! Replay cadence configuration.

use std::time::Duration;

use tracing::warn;

/// Delay between two steps at normal speed.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_millis(80);

/// Configuration for an animation controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    /// Delay between steps at 1x speed
    pub base_delay: Duration,
    /// Speed multiplier applied when the controller is created
    pub initial_speed: f64,
}

impl Default for ReplayConfig {
    fn default() -> Self {
        Self {
            base_delay: DEFAULT_BASE_DELAY,
            initial_speed: 1.0,
        }
    }
}

impl ReplayConfig {
    /// Read `WAYFINDER_REPLAY_BASE_DELAY_MS` and `WAYFINDER_REPLAY_SPEED`,
    /// keeping defaults for anything missing or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("WAYFINDER_REPLAY_BASE_DELAY_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => config.base_delay = Duration::from_millis(ms),
                _ => warn!(value = %raw, "ignoring invalid WAYFINDER_REPLAY_BASE_DELAY_MS"),
            }
        }

        if let Ok(raw) = std::env::var("WAYFINDER_REPLAY_SPEED") {
            match raw.trim().parse::<f64>() {
                Ok(speed) if speed.is_finite() && speed > 0.0 => config.initial_speed = speed,
                _ => warn!(value = %raw, "ignoring invalid WAYFINDER_REPLAY_SPEED"),
            }
        }

        config
    }

    #[must_use]
    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }
}

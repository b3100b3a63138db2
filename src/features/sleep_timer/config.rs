//! Sleep timer tuning

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::state::default_quick_durations;

/// Timing knobs for the controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SleepTimerConfig {
    /// Interval between countdown ticks
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Trailing part of the countdown during which volume ramps down
    #[serde(default = "default_fade_window_ms")]
    pub fade_window_ms: u64,
    /// Presets offered on the timer screen
    #[serde(default = "default_quick_durations")]
    pub quick_durations_minutes: Vec<u32>,
}

fn default_tick_interval_ms() -> u64 {
    1000
}

fn default_fade_window_ms() -> u64 {
    30_000
}

impl SleepTimerConfig {
    /// Tick interval, never shorter than one millisecond
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms.max(1))
    }
}

impl Default for SleepTimerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
            fade_window_ms: default_fade_window_ms(),
            quick_durations_minutes: default_quick_durations(),
        }
    }
}

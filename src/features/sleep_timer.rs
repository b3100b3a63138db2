//! Sleep timer - countdown, fade-out and end actions
//!
//! - `state`: UI snapshot and input sanitizing
//! - `controller`: the countdown state machine
//! - `fade`: volume ramp near the deadline
//! - `port`: player and clock capabilities the controller consumes
//! - `config`: tick interval, fade window and presets
//! - `preferences`: persisted configuration and resume fields

mod config;
mod controller;
mod fade;
mod port;
mod preferences;
mod state;

pub use config::SleepTimerConfig;
pub use controller::{SleepTimerController, TIMER_FINISHED_MESSAGE};
pub use fade::{fade_volume, in_fade_window};
pub use port::{Clock, InstantClock, SleepTimerPort, SystemClock};
pub use preferences::{
    ActiveTimer, PendingActionKind, PendingResolution, PendingSleepAction, SleepTimerPreferences,
};
pub use state::{
    EndAction, MAX_CUSTOM_HOURS, MAX_CUSTOM_MINUTES, SleepTimerUiState, custom_duration_millis,
    default_quick_durations, sanitize_numeric_input,
};

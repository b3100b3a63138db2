//! Sleep timer UI state
//!
//! An immutable snapshot that the controller replaces on every transition.

use serde::{Deserialize, Serialize};

/// Upper bound for the custom minutes field
pub const MAX_CUSTOM_MINUTES: u32 = 59;

/// Upper bound for the custom hours field
pub const MAX_CUSTOM_HOURS: u32 = 23;

const MILLIS_PER_MINUTE: u64 = 60_000;
const MILLIS_PER_HOUR: u64 = 60 * MILLIS_PER_MINUTE;

/// What happens when the countdown reaches zero
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum EndAction {
    /// Pause the current track
    #[default]
    PausePlayback,
    /// Stop playback entirely
    StopPlayback,
    /// Let the current track finish, then stop
    StopAfterTrack,
    /// Let the rest of the queue finish, then stop
    StopAfterQueue,
}

impl EndAction {
    /// Get all end actions in display order
    pub fn all() -> &'static [EndAction] {
        &[
            EndAction::PausePlayback,
            EndAction::StopPlayback,
            EndAction::StopAfterTrack,
            EndAction::StopAfterQueue,
        ]
    }

    /// Whether the action keeps playing past the deadline
    pub fn is_deferred(&self) -> bool {
        matches!(self, EndAction::StopAfterTrack | EndAction::StopAfterQueue)
    }
}

impl std::fmt::Display for EndAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EndAction::PausePlayback => write!(f, "Pause playback"),
            EndAction::StopPlayback => write!(f, "Stop playback"),
            EndAction::StopAfterTrack => write!(f, "Stop after current track"),
            EndAction::StopAfterQueue => write!(f, "Stop after queue"),
        }
    }
}

/// Snapshot of everything the sleep timer screen shows
#[derive(Debug, Clone, PartialEq)]
pub struct SleepTimerUiState {
    /// Selectable preset durations, in minutes
    pub quick_durations_minutes: Vec<u32>,
    /// Selected preset, `None` when a custom duration is used
    pub selected_quick_duration_minutes: Option<u32>,
    /// Raw custom hours field
    pub custom_hours_input: String,
    /// Raw custom minutes field, always within 0..=59 once stored
    pub custom_minutes_input: String,
    /// Total countdown length
    pub configured_duration_millis: u64,
    /// Live countdown value
    pub remaining_millis: u64,
    pub is_running: bool,
    pub is_start_enabled: bool,
    pub fade_enabled: bool,
    pub end_action: EndAction,
    /// Volume captured when the timer started
    pub original_volume: f32,
    /// Absolute deadline in Unix milliseconds, set while running
    pub scheduled_end_timestamp_millis: Option<i64>,
    pub status_message: Option<String>,
}

impl SleepTimerUiState {
    /// Create an idle state with the given presets
    pub fn new(quick_durations_minutes: Vec<u32>) -> Self {
        Self {
            quick_durations_minutes,
            selected_quick_duration_minutes: None,
            custom_hours_input: String::new(),
            custom_minutes_input: String::new(),
            configured_duration_millis: 0,
            remaining_millis: 0,
            is_running: false,
            is_start_enabled: false,
            fade_enabled: false,
            end_action: EndAction::default(),
            original_volume: 1.0,
            scheduled_end_timestamp_millis: None,
            status_message: None,
        }
    }

    /// Duration implied by the preset or custom fields
    pub fn derived_duration_millis(&self) -> u64 {
        match self.selected_quick_duration_minutes {
            Some(minutes) => minutes as u64 * MILLIS_PER_MINUTE,
            None => custom_duration_millis(&self.custom_hours_input, &self.custom_minutes_input),
        }
    }

    /// Recompute the derived fields after an idle-state change.
    ///
    /// While running, `configured_duration_millis` belongs to the active
    /// countdown and is left alone.
    pub(crate) fn recompute(&mut self) {
        if !self.is_running {
            self.configured_duration_millis = self.derived_duration_millis();
            self.remaining_millis = self.configured_duration_millis;
        }
        self.is_start_enabled = !self.is_running && self.configured_duration_millis > 0;
    }
}

impl Default for SleepTimerUiState {
    fn default() -> Self {
        Self::new(default_quick_durations())
    }
}

/// Presets offered when nothing else is configured
pub fn default_quick_durations() -> Vec<u32> {
    vec![5, 10, 15, 30, 45, 60, 90]
}

/// Total milliseconds for a pair of custom fields; empty fields count as zero
pub fn custom_duration_millis(hours_input: &str, minutes_input: &str) -> u64 {
    let hours = hours_input.trim().parse::<u64>().unwrap_or(0);
    let minutes = minutes_input.trim().parse::<u64>().unwrap_or(0);
    hours * MILLIS_PER_HOUR + minutes * MILLIS_PER_MINUTE
}

/// Sanitize a raw numeric field.
///
/// Digits are clamped to `max`; an empty field stays empty; anything
/// non-numeric yields `None` so the caller keeps its previous value.
pub fn sanitize_numeric_input(raw: &str, max: u32) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Some(String::new());
    }
    if !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    // Overlong digit strings overflow u32; they are out of range either way.
    let value = trimmed.parse::<u32>().unwrap_or(u32::MAX).min(max);
    Some(value.to_string())
}

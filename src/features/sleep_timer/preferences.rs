//! Persisted sleep timer preferences
//!
//! Idle configuration plus the fields needed to repair an in-flight timer
//! after the process was killed: the active deadline and a pending
//! deferred end action with the queue it applied to.

use serde::{Deserialize, Serialize};

use super::state::{EndAction, SleepTimerUiState};

/// Persisted form of the sleep timer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SleepTimerPreferences {
    pub selected_duration_minutes: Option<u32>,
    pub custom_hours_input: String,
    pub custom_minutes_input: String,
    pub fade_enabled: bool,
    pub end_action: EndAction,
    pub active_end_timestamp_millis: Option<i64>,
    pub active_fade_enabled: Option<bool>,
    pub active_end_action: Option<EndAction>,
    pub active_original_volume: Option<f32>,
    pub pending_action: Option<PendingSleepAction>,
    pub status_message: Option<String>,
}

/// Resume fields of a timer that was running when state was persisted
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveTimer {
    pub end_timestamp_millis: i64,
    pub fade_enabled: bool,
    pub end_action: EndAction,
    pub original_volume: f32,
}

impl SleepTimerPreferences {
    /// Build preferences from a state snapshot
    pub fn capture(state: &SleepTimerUiState) -> Self {
        let mut prefs = Self::default();
        prefs.update_from(state);
        prefs
    }

    /// Overwrite everything except the pending action with `state`
    pub fn update_from(&mut self, state: &SleepTimerUiState) {
        self.selected_duration_minutes = state.selected_quick_duration_minutes;
        self.custom_hours_input = state.custom_hours_input.clone();
        self.custom_minutes_input = state.custom_minutes_input.clone();
        self.fade_enabled = state.fade_enabled;
        self.end_action = state.end_action;
        self.status_message = state.status_message.clone();

        match (state.is_running, state.scheduled_end_timestamp_millis) {
            (true, Some(end)) => {
                self.active_end_timestamp_millis = Some(end);
                self.active_fade_enabled = Some(state.fade_enabled);
                self.active_end_action = Some(state.end_action);
                self.active_original_volume = Some(state.original_volume);
            }
            _ => self.clear_active(),
        }
    }

    /// Forget the in-flight timer
    pub fn clear_active(&mut self) {
        self.active_end_timestamp_millis = None;
        self.active_fade_enabled = None;
        self.active_end_action = None;
        self.active_original_volume = None;
    }

    /// The persisted in-flight timer, if every resume field is present
    pub fn active_timer(&self) -> Option<ActiveTimer> {
        Some(ActiveTimer {
            end_timestamp_millis: self.active_end_timestamp_millis?,
            fade_enabled: self.active_fade_enabled?,
            end_action: self.active_end_action?,
            original_volume: self.active_original_volume?,
        })
    }
}

/// Kind of deferred stop waiting on the player
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PendingActionKind {
    StopAfterTrack,
    StopAfterQueue,
}

/// A deferred end action that fired but has not finished yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingSleepAction {
    #[serde(rename = "type")]
    pub kind: PendingActionKind,
    /// Track identifiers of the queue at the moment the action fired
    pub queue_snapshot: Vec<String>,
    /// Index of the track that was playing
    pub queue_index: usize,
}

/// What the queue consumer should do with a pending action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingResolution {
    /// Keep playing, the stop point is still ahead
    Waiting,
    /// The stop point has been reached
    StopNow,
    /// The queue changed underneath the action; drop it
    Stale,
}

impl PendingSleepAction {
    /// Record a pending action for a deferred end action.
    ///
    /// Returns `None` for immediate actions or when nothing is playing.
    pub fn for_end_action(
        action: EndAction,
        queue: &[String],
        current_index: Option<usize>,
    ) -> Option<Self> {
        let kind = match action {
            EndAction::StopAfterTrack => PendingActionKind::StopAfterTrack,
            EndAction::StopAfterQueue => PendingActionKind::StopAfterQueue,
            EndAction::PausePlayback | EndAction::StopPlayback => return None,
        };
        let queue_index = current_index.filter(|&i| i < queue.len())?;
        Some(Self {
            kind,
            queue_snapshot: queue.to_vec(),
            queue_index,
        })
    }

    /// Compare against the live queue position
    pub fn resolve(&self, queue: &[String], current_index: Option<usize>) -> PendingResolution {
        if queue != self.queue_snapshot.as_slice() {
            return PendingResolution::Stale;
        }

        match (self.kind, current_index) {
            (_, None) => PendingResolution::StopNow,
            (PendingActionKind::StopAfterTrack, Some(index)) if index != self.queue_index => {
                PendingResolution::StopNow
            }
            (PendingActionKind::StopAfterQueue, Some(index)) if index >= queue.len() => {
                PendingResolution::StopNow
            }
            _ => PendingResolution::Waiting,
        }
    }
}

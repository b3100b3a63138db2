//! Sleep timer controller
//!
//! Owns the countdown state machine. A single tokio task ticks the
//! countdown; every mutation happens under one lock, so `start_timer`,
//! `cancel_timer` and `resume_timer` are atomic from the caller's point of
//! view. A generation counter guarantees that a ticker belonging to an
//! earlier countdown can never complete a newer one.
//!
//! ## Lifecycle
//! ```text
//! idle --start_timer/resume_timer--> running --deadline--> idle (end action fired)
//!                                    running --cancel_timer--> idle
//! ```

use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use super::config::SleepTimerConfig;
use super::fade::{fade_volume, in_fade_window};
use super::port::{Clock, SleepTimerPort};
use super::preferences::SleepTimerPreferences;
use super::state::{
    EndAction, MAX_CUSTOM_HOURS, MAX_CUSTOM_MINUTES, SleepTimerUiState, sanitize_numeric_input,
};

/// Status shown once a countdown ran out
pub const TIMER_FINISHED_MESSAGE: &str = "Timer finished";

/// Completions buffered per subscriber before it lags
const COMPLETION_CAPACITY: usize = 16;

/// Handle to the sleep timer state machine
///
/// Cloning is cheap; all clones drive the same timer.
#[derive(Clone)]
pub struct SleepTimerController {
    shared: Arc<Shared>,
}

struct Shared {
    port: Arc<dyn SleepTimerPort>,
    clock: Arc<dyn Clock>,
    config: SleepTimerConfig,
    inner: Mutex<Inner>,
    state_tx: watch::Sender<SleepTimerUiState>,
    /// One message per countdown that ran out, carrying the action fired
    completion_tx: broadcast::Sender<EndAction>,
}

struct Inner {
    state: SleepTimerUiState,
    /// Incremented whenever a countdown starts, resumes, finishes or is cancelled
    generation: u64,
    ticker: Option<JoinHandle<()>>,
}

enum TickOutcome {
    Continue(Duration),
    Finished,
}

impl std::fmt::Debug for SleepTimerController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SleepTimerController")
            .field("state", &self.shared.inner.lock().state)
            .field("config", &self.shared.config)
            .finish()
    }
}

impl SleepTimerController {
    /// Create an idle controller
    pub fn new(
        port: Arc<dyn SleepTimerPort>,
        clock: Arc<dyn Clock>,
        config: SleepTimerConfig,
    ) -> Self {
        let initial = SleepTimerUiState::new(config.quick_durations_minutes.clone());
        Self::with_initial_state(port, clock, config, initial)
    }

    /// Create a controller from an existing idle snapshot
    ///
    /// Running flags in `initial` are discarded; use [`resume_timer`] to
    /// bring back an in-flight countdown.
    ///
    /// [`resume_timer`]: Self::resume_timer
    pub fn with_initial_state(
        port: Arc<dyn SleepTimerPort>,
        clock: Arc<dyn Clock>,
        config: SleepTimerConfig,
        mut initial: SleepTimerUiState,
    ) -> Self {
        initial.is_running = false;
        initial.scheduled_end_timestamp_millis = None;
        initial.recompute();

        let (state_tx, _) = watch::channel(initial.clone());
        let (completion_tx, _) = broadcast::channel(COMPLETION_CAPACITY);
        Self {
            shared: Arc::new(Shared {
                port,
                clock,
                config,
                inner: Mutex::new(Inner {
                    state: initial,
                    generation: 0,
                    ticker: None,
                }),
                state_tx,
                completion_tx,
            }),
        }
    }

    // ============ Queries ============

    /// Current snapshot
    pub fn state(&self) -> SleepTimerUiState {
        self.shared.inner.lock().state.clone()
    }

    /// Receive every new snapshot
    ///
    /// Snapshots coalesce; use [`completions`] to observe a countdown
    /// running out.
    ///
    /// [`completions`]: Self::completions
    pub fn subscribe(&self) -> watch::Receiver<SleepTimerUiState> {
        self.shared.state_tx.subscribe()
    }

    /// Receive the end action of every countdown that runs out from now on
    ///
    /// Cancelled countdowns send nothing.
    pub fn completions(&self) -> broadcast::Receiver<EndAction> {
        self.shared.completion_tx.subscribe()
    }

    pub fn is_running(&self) -> bool {
        self.shared.inner.lock().state.is_running
    }

    pub fn config(&self) -> &SleepTimerConfig {
        &self.shared.config
    }

    // ============ Idle configuration ============

    /// Pick a preset duration; ignored while running
    pub fn select_quick_duration(&self, minutes: u32) {
        self.shared.mutate_idle("select_quick_duration", |state| {
            state.selected_quick_duration_minutes = Some(minutes);
            state.custom_hours_input.clear();
            state.custom_minutes_input.clear();
        });
    }

    /// Update the custom minutes field, clamped to 0..=59
    pub fn update_custom_minutes(&self, raw: &str) {
        self.shared.mutate_idle("update_custom_minutes", |state| {
            match sanitize_numeric_input(raw, MAX_CUSTOM_MINUTES) {
                Some(value) => {
                    state.custom_minutes_input = value;
                    state.selected_quick_duration_minutes = None;
                }
                None => tracing::debug!("Ignoring non-numeric custom minutes {:?}", raw),
            }
        });
    }

    /// Update the custom hours field, clamped to 0..=23
    pub fn update_custom_hours(&self, raw: &str) {
        self.shared.mutate_idle("update_custom_hours", |state| {
            match sanitize_numeric_input(raw, MAX_CUSTOM_HOURS) {
                Some(value) => {
                    state.custom_hours_input = value;
                    state.selected_quick_duration_minutes = None;
                }
                None => tracing::debug!("Ignoring non-numeric custom hours {:?}", raw),
            }
        });
    }

    /// Toggle the fade-out; a running countdown picks it up on the next tick
    pub fn set_fade_enabled(&self, enabled: bool) {
        let mut inner = self.shared.inner.lock();
        if inner.state.fade_enabled == enabled {
            return;
        }
        inner.state.fade_enabled = enabled;
        if inner.state.is_running && !enabled {
            self.shared.port.set_volume(inner.state.original_volume);
        }
        self.shared.publish(&inner);
    }

    /// Choose the end action; a running countdown fires whatever is set at the deadline
    pub fn select_end_action(&self, action: EndAction) {
        let mut inner = self.shared.inner.lock();
        inner.state.end_action = action;
        self.shared.publish(&inner);
    }

    /// Apply persisted configuration; a no-op while a countdown is running
    pub fn restore_from_preferences(&self, prefs: &SleepTimerPreferences) {
        self.shared.mutate_idle("restore_from_preferences", |state| {
            state.selected_quick_duration_minutes = prefs.selected_duration_minutes;
            state.custom_hours_input =
                sanitize_numeric_input(&prefs.custom_hours_input, MAX_CUSTOM_HOURS)
                    .unwrap_or_default();
            state.custom_minutes_input =
                sanitize_numeric_input(&prefs.custom_minutes_input, MAX_CUSTOM_MINUTES)
                    .unwrap_or_default();
            state.fade_enabled = prefs.fade_enabled;
            state.end_action = prefs.end_action;
            state.status_message = prefs.status_message.clone();
        });
    }

    pub fn show_status_message(&self, message: impl Into<String>) {
        let mut inner = self.shared.inner.lock();
        inner.state.status_message = Some(message.into());
        self.shared.publish(&inner);
    }

    pub fn clear_status_message(&self) {
        let mut inner = self.shared.inner.lock();
        if inner.state.status_message.take().is_some() {
            self.shared.publish(&inner);
        }
    }

    // ============ Countdown ============

    /// Start counting down the configured duration
    ///
    /// No-op unless `is_start_enabled`. Must be called from within a tokio
    /// runtime; the ticker is spawned onto it.
    pub fn start_timer(&self) {
        let Ok(runtime) = Handle::try_current() else {
            tracing::error!("Sleep timer cannot start outside a tokio runtime");
            return;
        };

        let mut inner = self.shared.inner.lock();
        if !inner.state.is_start_enabled {
            tracing::debug!(
                "Ignoring start_timer (running={}, duration={}ms)",
                inner.state.is_running,
                inner.state.configured_duration_millis
            );
            return;
        }

        let original_volume = self.shared.port.current_volume().clamp(0.0, 1.0);
        let duration = inner.state.configured_duration_millis;
        let end = self.shared.clock.now_millis() + duration as i64;

        let state = &mut inner.state;
        state.original_volume = original_volume;
        state.scheduled_end_timestamp_millis = Some(end);
        state.is_running = true;
        state.remaining_millis = duration;
        state.status_message = None;
        state.recompute();

        tracing::info!(
            "Sleep timer started: {}ms, fade={}, end action={:?}",
            duration,
            state.fade_enabled,
            state.end_action
        );

        Shared::spawn_ticker(&self.shared, &mut inner, &runtime);
        self.shared.publish(&inner);
    }

    /// Stop the countdown and restore the original volume; idempotent
    pub fn cancel_timer(&self) {
        let mut inner = self.shared.inner.lock();
        if !inner.state.is_running {
            return;
        }

        inner.generation += 1;
        if let Some(ticker) = inner.ticker.take() {
            ticker.abort();
        }

        self.shared.port.set_volume(inner.state.original_volume);
        let state = &mut inner.state;
        state.is_running = false;
        state.scheduled_end_timestamp_millis = None;
        state.recompute();

        tracing::info!("Sleep timer cancelled");
        self.shared.publish(&inner);
    }

    /// Rebuild an in-flight countdown from persisted fields
    ///
    /// The volume is reset to `original_volume` right away. A deadline in
    /// the past completes on the first tick. Resuming the exact countdown
    /// that is already running does nothing; anything else supersedes it.
    pub fn resume_timer(
        &self,
        end_timestamp_millis: i64,
        fade_enabled: bool,
        end_action: EndAction,
        original_volume: f32,
    ) {
        let Ok(runtime) = Handle::try_current() else {
            tracing::error!("Sleep timer cannot resume outside a tokio runtime");
            return;
        };

        let original_volume = original_volume.clamp(0.0, 1.0);
        let mut inner = self.shared.inner.lock();
        {
            let state = &inner.state;
            if state.is_running
                && state.scheduled_end_timestamp_millis == Some(end_timestamp_millis)
                && state.fade_enabled == fade_enabled
                && state.end_action == end_action
                && state.original_volume == original_volume
            {
                tracing::debug!("Sleep timer already running with the same deadline");
                return;
            }
        }

        self.shared.port.set_volume(original_volume);
        let remaining = remaining_until(end_timestamp_millis, self.shared.clock.now_millis());

        let state = &mut inner.state;
        state.original_volume = original_volume;
        state.fade_enabled = fade_enabled;
        state.end_action = end_action;
        state.scheduled_end_timestamp_millis = Some(end_timestamp_millis);
        state.is_running = true;
        state.configured_duration_millis = state.configured_duration_millis.max(remaining);
        state.remaining_millis = remaining;
        state.status_message = None;
        state.recompute();

        tracing::info!(
            "Sleep timer resumed: {}ms left, fade={}, end action={:?}",
            remaining,
            fade_enabled,
            end_action
        );

        Shared::spawn_ticker(&self.shared, &mut inner, &runtime);
        self.shared.publish(&inner);
    }
}

impl Shared {
    fn publish(&self, inner: &Inner) {
        self.state_tx.send_replace(inner.state.clone());
    }

    fn mutate_idle(&self, operation: &str, f: impl FnOnce(&mut SleepTimerUiState)) {
        let mut inner = self.inner.lock();
        if inner.state.is_running {
            tracing::debug!("Ignoring {} while the sleep timer is running", operation);
            return;
        }
        f(&mut inner.state);
        inner.state.recompute();
        self.publish(&inner);
    }

    fn spawn_ticker(this: &Arc<Self>, inner: &mut Inner, runtime: &Handle) {
        inner.generation += 1;
        if let Some(previous) = inner.ticker.take() {
            previous.abort();
        }
        let generation = inner.generation;
        inner.ticker = Some(runtime.spawn(run_ticker(Arc::downgrade(this), generation)));
    }

    fn tick(&self, generation: u64) -> TickOutcome {
        let mut inner = self.inner.lock();
        if inner.generation != generation || !inner.state.is_running {
            return TickOutcome::Finished;
        }
        let Some(end) = inner.state.scheduled_end_timestamp_millis else {
            return TickOutcome::Finished;
        };

        let remaining = remaining_until(end, self.clock.now_millis())
            .min(inner.state.configured_duration_millis);
        inner.state.remaining_millis = remaining;

        if remaining == 0 {
            self.complete(&mut inner);
            self.publish(&inner);
            return TickOutcome::Finished;
        }

        let fade_window = self.config.fade_window_ms;
        if inner.state.fade_enabled && in_fade_window(remaining, fade_window) {
            self.port
                .set_volume(fade_volume(inner.state.original_volume, remaining, fade_window));
        }

        self.publish(&inner);
        TickOutcome::Continue(Duration::from_millis(remaining).min(self.config.tick_interval()))
    }

    fn complete(&self, inner: &mut Inner) {
        inner.generation += 1;
        // The finishing ticker is the caller; dropping the handle detaches it.
        inner.ticker = None;

        let state = &mut inner.state;
        let action = state.end_action;
        state.is_running = false;
        state.scheduled_end_timestamp_millis = None;
        state.status_message = Some(TIMER_FINISHED_MESSAGE.to_string());
        state.recompute();
        state.remaining_millis = 0;

        self.port.set_volume(state.original_volume);
        match action {
            EndAction::PausePlayback => self.port.pause_playback(),
            EndAction::StopPlayback => self.port.stop_playback(),
            EndAction::StopAfterTrack => self.port.stop_after_current_track(),
            EndAction::StopAfterQueue => self.port.stop_after_queue(),
        }

        tracing::info!("Sleep timer finished, fired {:?}", action);
        // No receivers is fine
        let _ = self.completion_tx.send(action);
    }
}

impl Drop for Shared {
    fn drop(&mut self) {
        if let Some(ticker) = self.inner.get_mut().ticker.take() {
            ticker.abort();
        }
    }
}

async fn run_ticker(shared: Weak<Shared>, generation: u64) {
    loop {
        let delay = {
            let Some(shared) = shared.upgrade() else {
                break;
            };
            match shared.tick(generation) {
                TickOutcome::Continue(delay) => delay,
                TickOutcome::Finished => break,
            }
        };
        tokio::time::sleep(delay).await;
    }
}

fn remaining_until(end_millis: i64, now_millis: i64) -> u64 {
    end_millis.saturating_sub(now_millis).max(0) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::sleep_timer::port::InstantClock;

    const START: i64 = 1_700_000_000_000;

    struct RecordingPort {
        volume: Mutex<f32>,
        volume_log: Mutex<Vec<f32>>,
        actions: Mutex<Vec<EndAction>>,
    }

    impl RecordingPort {
        fn new(volume: f32) -> Arc<Self> {
            Arc::new(Self {
                volume: Mutex::new(volume),
                volume_log: Mutex::new(Vec::new()),
                actions: Mutex::new(Vec::new()),
            })
        }

        fn volume(&self) -> f32 {
            *self.volume.lock()
        }

        fn volume_log(&self) -> Vec<f32> {
            self.volume_log.lock().clone()
        }

        fn actions(&self) -> Vec<EndAction> {
            self.actions.lock().clone()
        }
    }

    impl SleepTimerPort for RecordingPort {
        fn current_volume(&self) -> f32 {
            *self.volume.lock()
        }

        fn set_volume(&self, volume: f32) {
            *self.volume.lock() = volume;
            self.volume_log.lock().push(volume);
        }

        fn pause_playback(&self) {
            self.actions.lock().push(EndAction::PausePlayback);
        }

        fn stop_playback(&self) {
            self.actions.lock().push(EndAction::StopPlayback);
        }

        fn stop_after_current_track(&self) {
            self.actions.lock().push(EndAction::StopAfterTrack);
        }

        fn stop_after_queue(&self) {
            self.actions.lock().push(EndAction::StopAfterQueue);
        }
    }

    fn controller(port: &Arc<RecordingPort>) -> SleepTimerController {
        SleepTimerController::new(
            port.clone(),
            Arc::new(InstantClock::starting_at(START)),
            SleepTimerConfig::default(),
        )
    }

    async fn settle() {
        for _ in 0..16 {
            tokio::task::yield_now().await;
        }
    }

    async fn advance(ms: u64) {
        tokio::time::advance(Duration::from_millis(ms)).await;
        settle().await;
    }

    #[test]
    fn test_custom_minutes_are_clamped() {
        let port = RecordingPort::new(1.0);
        let timer = controller(&port);
        timer.update_custom_minutes("99");
        let state = timer.state();
        assert_eq!(state.custom_minutes_input, "59");
        assert_eq!(state.configured_duration_millis, 59 * 60_000);
        assert!(state.is_start_enabled);
    }

    #[test]
    fn test_invalid_custom_input_keeps_previous_value() {
        let port = RecordingPort::new(1.0);
        let timer = controller(&port);
        timer.update_custom_minutes("12");
        timer.update_custom_minutes("ab");
        assert_eq!(timer.state().custom_minutes_input, "12");

        timer.update_custom_hours("30");
        assert_eq!(timer.state().custom_hours_input, "23");
        assert_eq!(timer.state().configured_duration_millis, (23 * 60 + 12) * 60_000);
    }

    #[test]
    fn test_quick_duration_clears_custom_fields() {
        let port = RecordingPort::new(1.0);
        let timer = controller(&port);
        timer.update_custom_minutes("20");
        timer.select_quick_duration(15);
        let state = timer.state();
        assert_eq!(state.selected_quick_duration_minutes, Some(15));
        assert!(state.custom_minutes_input.is_empty());
        assert_eq!(state.configured_duration_millis, 15 * 60_000);

        timer.update_custom_minutes("5");
        assert_eq!(timer.state().selected_quick_duration_minutes, None);
        assert_eq!(timer.state().configured_duration_millis, 5 * 60_000);
    }

    #[test]
    fn test_start_outside_runtime_is_ignored() {
        let port = RecordingPort::new(1.0);
        let timer = controller(&port);
        timer.select_quick_duration(5);
        timer.start_timer();
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_completes_after_duration() {
        for action in EndAction::all() {
            let port = RecordingPort::new(0.7);
            let timer = controller(&port);
            timer.select_quick_duration(1);
            timer.select_end_action(*action);
            timer.start_timer();
            settle().await;

            let state = timer.state();
            assert!(state.is_running);
            assert!(!state.is_start_enabled);
            assert_eq!(state.scheduled_end_timestamp_millis, Some(START + 60_000));

            advance(59_999).await;
            assert!(timer.is_running());
            assert!(port.actions().is_empty());

            advance(1).await;
            let state = timer.state();
            assert!(!state.is_running);
            assert_eq!(state.scheduled_end_timestamp_millis, None);
            assert_eq!(state.remaining_millis, 0);
            assert_eq!(state.status_message.as_deref(), Some(TIMER_FINISHED_MESSAGE));
            assert_eq!(port.actions(), vec![*action]);
            assert_eq!(port.volume(), 0.7);

            advance(120_000).await;
            assert_eq!(port.actions().len(), 1);
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_exact_duration_not_multiple_of_tick() {
        let port = RecordingPort::new(1.0);
        let timer = SleepTimerController::new(
            port.clone(),
            Arc::new(InstantClock::starting_at(START)),
            SleepTimerConfig {
                tick_interval_ms: 700,
                ..Default::default()
            },
        );
        timer.select_quick_duration(1);
        timer.start_timer();
        settle().await;
        for _ in 0..85 {
            advance(700).await;
        }
        assert!(timer.is_running());
        advance(500).await;
        assert!(!timer.is_running());
        assert_eq!(port.actions(), vec![EndAction::PausePlayback]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_remaining_counts_down() {
        let port = RecordingPort::new(1.0);
        let timer = controller(&port);
        timer.select_quick_duration(5);
        timer.start_timer();
        settle().await;
        advance(1_000).await;
        assert_eq!(timer.state().remaining_millis, 5 * 60_000 - 1_000);
        advance(60_000).await;
        assert_eq!(timer.state().remaining_millis, 4 * 60_000 - 1_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fade_ramps_within_window() {
        let port = RecordingPort::new(0.8);
        let timer = controller(&port);
        timer.select_quick_duration(1);
        timer.set_fade_enabled(true);
        timer.start_timer();
        settle().await;

        advance(20_000).await;
        assert!(port.volume_log().is_empty(), "no fade outside the window");
        assert_eq!(port.volume(), 0.8);

        advance(25_000).await;
        assert!((port.volume() - 0.4).abs() < 1e-3);

        for _ in 0..14 {
            advance(1_000).await;
            let volume = port.volume();
            assert!((0.0..=0.8).contains(&volume));
        }
        assert!(port.volume() < 0.05);

        advance(1_000).await;
        assert!(!timer.is_running());
        assert_eq!(port.volume(), 0.8);
        assert!(port.volume_log().iter().all(|v| (0.0..=0.8).contains(v)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_restores_volume() {
        let port = RecordingPort::new(0.9);
        let timer = controller(&port);
        timer.select_quick_duration(1);
        timer.set_fade_enabled(true);
        timer.start_timer();
        settle().await;
        advance(50_000).await;
        assert!(port.volume() < 0.9);

        timer.cancel_timer();
        let state = timer.state();
        assert!(!state.is_running);
        assert!(state.is_start_enabled);
        assert_eq!(state.scheduled_end_timestamp_millis, None);
        assert_eq!(state.remaining_millis, 60_000);
        assert_eq!(port.volume(), 0.9);

        advance(120_000).await;
        assert!(port.actions().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_when_idle_is_noop() {
        let port = RecordingPort::new(0.5);
        let timer = controller(&port);
        timer.cancel_timer();
        timer.cancel_timer();
        assert!(port.volume_log().is_empty());
        assert!(!timer.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_guarded() {
        let port = RecordingPort::new(1.0);
        let timer = controller(&port);
        timer.start_timer();
        assert!(!timer.is_running(), "zero duration must not start");

        timer.select_quick_duration(1);
        timer.start_timer();
        settle().await;
        advance(10_000).await;
        timer.start_timer();
        assert_eq!(
            timer.state().scheduled_end_timestamp_millis,
            Some(START + 60_000),
            "second start must not move the deadline"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_does_not_fire_stale_completion() {
        let port = RecordingPort::new(1.0);
        let timer = controller(&port);
        timer.select_quick_duration(1);
        timer.start_timer();
        settle().await;
        advance(30_000).await;
        timer.cancel_timer();
        timer.start_timer();
        settle().await;

        advance(30_000).await;
        assert!(port.actions().is_empty());
        assert!(timer.is_running());

        advance(30_000).await;
        assert_eq!(port.actions(), vec![EndAction::PausePlayback]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_setters_ignored_while_running() {
        let port = RecordingPort::new(1.0);
        let timer = controller(&port);
        timer.select_quick_duration(10);
        timer.start_timer();
        settle().await;

        timer.select_quick_duration(5);
        timer.update_custom_minutes("3");
        let state = timer.state();
        assert_eq!(state.selected_quick_duration_minutes, Some(10));
        assert_eq!(state.configured_duration_millis, 10 * 60_000);
        assert!(state.custom_minutes_input.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_end_action_change_applies_at_deadline() {
        let port = RecordingPort::new(1.0);
        let timer = controller(&port);
        timer.select_quick_duration(1);
        timer.start_timer();
        settle().await;
        advance(10_000).await;
        timer.select_end_action(EndAction::StopAfterQueue);
        advance(50_000).await;
        assert_eq!(port.actions(), vec![EndAction::StopAfterQueue]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_disabling_fade_mid_run_restores_volume() {
        let port = RecordingPort::new(0.6);
        let timer = controller(&port);
        timer.select_quick_duration(1);
        timer.set_fade_enabled(true);
        timer.start_timer();
        settle().await;
        advance(45_000).await;
        assert!(port.volume() < 0.6);

        timer.set_fade_enabled(false);
        assert_eq!(port.volume(), 0.6);
        advance(5_000).await;
        assert_eq!(port.volume(), 0.6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_restore_from_preferences_respects_running_timer() {
        let port = RecordingPort::new(1.0);
        let timer = controller(&port);
        let prefs = SleepTimerPreferences {
            selected_duration_minutes: None,
            custom_hours_input: "1".into(),
            custom_minutes_input: "75".into(),
            fade_enabled: true,
            end_action: EndAction::StopPlayback,
            ..Default::default()
        };

        timer.restore_from_preferences(&prefs);
        let state = timer.state();
        assert_eq!(state.custom_minutes_input, "59");
        assert_eq!(state.configured_duration_millis, 119 * 60_000);
        assert!(state.fade_enabled);
        assert_eq!(state.end_action, EndAction::StopPlayback);

        let mut other = prefs.clone();
        other.selected_duration_minutes = Some(5);
        other.fade_enabled = false;
        timer.start_timer();
        settle().await;
        timer.restore_from_preferences(&other);
        let running = timer.state();
        assert!(running.is_running);
        assert!(running.fade_enabled);
        assert_eq!(running.selected_quick_duration_minutes, None);
        assert_eq!(running.configured_duration_millis, 119 * 60_000);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_with_past_deadline_fires_promptly() {
        let port = RecordingPort::new(0.1);
        let timer = controller(&port);
        timer.resume_timer(START - 5_000, true, EndAction::StopPlayback, 0.75);
        settle().await;

        assert_eq!(port.volume_log().first().copied(), Some(0.75));
        assert_eq!(port.actions(), vec![EndAction::StopPlayback]);
        assert!(!timer.is_running());
        assert_eq!(port.volume(), 0.75);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_future_deadline() {
        let port = RecordingPort::new(0.2);
        let timer = controller(&port);
        timer.resume_timer(START + 10_000, false, EndAction::StopAfterQueue, 0.5);
        assert_eq!(port.volume(), 0.5);

        let state = timer.state();
        assert!(state.is_running);
        assert_eq!(state.remaining_millis, 10_000);
        assert!(state.configured_duration_millis >= state.remaining_millis);
        assert_eq!(state.end_action, EndAction::StopAfterQueue);

        settle().await;
        advance(9_000).await;
        assert!(port.actions().is_empty());
        advance(1_000).await;
        assert_eq!(port.actions(), vec![EndAction::StopAfterQueue]);
        assert_eq!(port.volume(), 0.5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_resume_same_timer_is_noop() {
        let port = RecordingPort::new(1.0);
        let timer = controller(&port);
        timer.resume_timer(START + 10_000, false, EndAction::PausePlayback, 0.5);
        timer.resume_timer(START + 10_000, false, EndAction::PausePlayback, 0.5);
        assert_eq!(port.volume_log(), vec![0.5]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_subscribers_see_transitions() {
        let port = RecordingPort::new(1.0);
        let timer = controller(&port);
        let mut rx = timer.subscribe();
        timer.select_quick_duration(1);
        timer.start_timer();
        assert!(rx.borrow_and_update().is_running);

        timer.cancel_timer();
        assert!(rx.has_changed().unwrap());
        assert!(!rx.borrow_and_update().is_running);
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_survives_later_status_change() {
        let port = RecordingPort::new(1.0);
        let timer = controller(&port);
        let mut completions = timer.completions();

        timer.select_quick_duration(1);
        timer.select_end_action(EndAction::StopAfterTrack);
        timer.start_timer();
        settle().await;
        timer.cancel_timer();
        timer.start_timer();
        settle().await;
        advance(60_000).await;
        timer.clear_status_message();

        assert_eq!(timer.state().status_message, None);
        assert_eq!(completions.try_recv(), Ok(EndAction::StopAfterTrack));
        assert!(completions.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_status_message() {
        let port = RecordingPort::new(1.0);
        let timer = controller(&port);
        timer.show_status_message("Sleep timer set");
        assert_eq!(timer.state().status_message.as_deref(), Some("Sleep timer set"));
        timer.clear_status_message();
        assert_eq!(timer.state().status_message, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_dropping_controller_stops_ticker() {
        let port = RecordingPort::new(1.0);
        let timer = controller(&port);
        timer.select_quick_duration(1);
        timer.start_timer();
        settle().await;
        drop(timer);
        advance(120_000).await;
        assert!(port.actions().is_empty());
    }
}

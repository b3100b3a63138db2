//! Main application module
//!
//! `App` ties settings, the player registry and the sleep timer together:
//! it restores the timer at startup and writes every relevant transition
//! back to `Settings`.

mod registry;

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;

use crate::audio::{PlaybackStatus, PlayerEvent, PlayerHandle};
use crate::features::Settings;
use crate::features::settings::SettingsError;
use crate::features::sleep_timer::{
    Clock, EndAction, PendingResolution, PendingSleepAction, SleepTimerController,
    SleepTimerPort, SleepTimerUiState, SystemClock,
};

pub use registry::PlayerRegistry;

/// Settings plus where they are written
struct Persistence {
    settings: Mutex<Settings>,
    path: Option<PathBuf>,
    /// Held for the whole write so saves never interleave on disk
    write_lock: Mutex<()>,
}

impl Persistence {
    fn save(&self) -> Result<(), SettingsError> {
        let _writing = self.write_lock.lock();
        let settings = self.settings.lock().clone();
        match &self.path {
            Some(path) => settings.save_to_file(path),
            None => Err(SettingsError::Io(
                "Could not determine config directory".to_string(),
            )),
        }
    }

    fn save_logged(&self) {
        if let Err(e) = self.save() {
            tracing::warn!("Failed to save settings: {}", e);
        }
    }

    /// Save on the blocking pool so file I/O stays off the async workers
    ///
    /// Each write snapshots the settings once it holds the write lock, so
    /// the last write to finish always carries the newest state.
    fn save_in_background(self: &Arc<Self>) {
        let this = Arc::clone(self);
        tokio::task::spawn_blocking(move || this.save_logged());
    }
}

/// Application core
pub struct App {
    persistence: Arc<Persistence>,
    registry: PlayerRegistry<PlayerHandle>,
    controller: SleepTimerController,
    persist_task: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("registry", &self.registry)
            .field("controller", &self.controller)
            .finish()
    }
}

impl App {
    /// Create the application core with the wall clock and default settings file
    pub fn new(settings: Settings, registry: PlayerRegistry<PlayerHandle>) -> Self {
        Self::with_clock(settings, registry, Arc::new(SystemClock), Settings::file_path())
    }

    /// Create the application core with an explicit clock and settings file
    pub fn with_clock(
        settings: Settings,
        registry: PlayerRegistry<PlayerHandle>,
        clock: Arc<dyn Clock>,
        settings_path: Option<PathBuf>,
    ) -> Self {
        // 1. Build the controller against whatever player gets registered
        let port: Arc<dyn SleepTimerPort> = Arc::new(registry.clone());
        let controller =
            SleepTimerController::new(port, clock, settings.sleep_timer_tuning.clone());
        // Subscribe before resuming so a countdown that is already overdue
        // is still seen completing
        let states = controller.subscribe();
        let completions = controller.completions();

        // 2. Restore idle configuration, then any in-flight countdown
        controller.restore_from_preferences(&settings.sleep_timer);
        if let Some(active) = settings.sleep_timer.active_timer() {
            tracing::info!(
                "Resuming sleep timer ending at {}",
                active.end_timestamp_millis
            );
            controller.resume_timer(
                active.end_timestamp_millis,
                active.fade_enabled,
                active.end_action,
                active.original_volume,
            );
        }

        let persistence = Arc::new(Persistence {
            settings: Mutex::new(settings),
            path: settings_path,
            write_lock: Mutex::new(()),
        });
        persistence
            .settings
            .lock()
            .sleep_timer
            .update_from(&controller.state());

        // 3. Apply the saved volume to every player that shows up
        let volume_source = Arc::clone(&persistence);
        registry.on_available(move |player| {
            let settings = volume_source.settings.lock();
            let volume = settings
                .sleep_timer
                .active_original_volume
                .unwrap_or(settings.volume);
            player.set_volume(volume);
        });

        // 4. Persist transitions for as long as the app lives
        let persist_task = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => Some(runtime.spawn(persist_transitions(
                states,
                completions,
                Arc::clone(&persistence),
                registry.clone(),
            ))),
            Err(_) => {
                tracing::warn!("No tokio runtime, sleep timer changes will not be persisted");
                None
            }
        };

        Self {
            persistence,
            registry,
            controller,
            persist_task,
        }
    }

    pub fn controller(&self) -> &SleepTimerController {
        &self.controller
    }

    pub fn registry(&self) -> &PlayerRegistry<PlayerHandle> {
        &self.registry
    }

    /// Snapshot of the current settings
    pub fn settings(&self) -> Settings {
        self.persistence.settings.lock().clone()
    }

    /// Write settings to disk, recording the player's volume when no timer owns it
    pub fn save(&self) -> Result<(), SettingsError> {
        if !self.controller.is_running() {
            if let Some(player) = self.registry.get() {
                self.persistence.settings.lock().volume = player.volume();
            }
        }
        self.persistence.save()
    }

    /// React to a player event; queue movement may settle a pending stop
    ///
    /// Once the player has stopped, a pending stop is complete and is
    /// dropped without sending another stop.
    pub fn handle_player_event(&self, event: &PlayerEvent) {
        match event {
            PlayerEvent::Stopped => self.clear_pending(),
            PlayerEvent::TrackChanged { .. } => {
                let Some(player) = self.registry.get() else {
                    return;
                };
                if player.state().status() == PlaybackStatus::Stopped {
                    self.clear_pending();
                } else {
                    let (queue, index) = player.state().queue_snapshot();
                    self.reconcile_pending(&queue, index);
                }
            }
            PlayerEvent::VolumeChanged { .. } | PlayerEvent::Paused => {}
        }
    }

    fn clear_pending(&self) {
        let cleared = self.persistence.settings.lock().sleep_timer.pending_action.take();
        if cleared.is_some() {
            tracing::info!("Playback stopped, deferred sleep stop complete");
            self.persistence.save_logged();
        }
    }

    /// Check a persisted deferred stop against the live queue
    ///
    /// Returns `None` when nothing is pending.
    pub fn reconcile_pending(
        &self,
        queue: &[String],
        current_index: Option<usize>,
    ) -> Option<PendingResolution> {
        let resolution = {
            let mut settings = self.persistence.settings.lock();
            let pending = settings.sleep_timer.pending_action.as_ref()?;
            let resolution = pending.resolve(queue, current_index);
            match resolution {
                PendingResolution::Waiting => return Some(resolution),
                PendingResolution::StopNow => {
                    tracing::info!("Deferred sleep stop reached, stopping playback");
                }
                PendingResolution::Stale => {
                    tracing::info!("Queue changed, dropping deferred sleep stop");
                }
            }
            settings.sleep_timer.pending_action = None;
            resolution
        };

        if resolution == PendingResolution::StopNow {
            self.registry.stop_playback();
        }
        self.persistence.save_logged();
        Some(resolution)
    }

    /// Resolve once the running countdown reaches its deadline
    ///
    /// Returns immediately if no countdown is running. A cancel does not
    /// count as finishing; the future keeps waiting for a later countdown.
    pub async fn timer_finished(&self) {
        let mut completions = self.controller.completions();
        if !self.controller.is_running() {
            return;
        }
        // Lagging still means at least one countdown ran out
        if let Err(broadcast::error::RecvError::Closed) = completions.recv().await {
            tracing::debug!("Sleep timer dropped while waiting for it to finish");
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        if let Some(task) = self.persist_task.take() {
            task.abort();
        }
    }
}

async fn persist_transitions(
    mut states: watch::Receiver<SleepTimerUiState>,
    mut completions: broadcast::Receiver<EndAction>,
    persistence: Arc<Persistence>,
    registry: PlayerRegistry<PlayerHandle>,
) {
    loop {
        let changed = tokio::select! {
            result = states.changed() => {
                if result.is_err() {
                    break;
                }
                let current = states.borrow_and_update().clone();
                apply_snapshot(&persistence, &current)
            }
            result = completions.recv() => match result {
                Ok(action) => record_pending(&persistence, &registry, action),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!("Missed {} sleep timer completions", skipped);
                    false
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        };

        if changed {
            persistence.save_in_background();
        }
    }
}

/// Mirror a snapshot into settings; true if anything changed
fn apply_snapshot(persistence: &Persistence, state: &SleepTimerUiState) -> bool {
    let mut settings = persistence.settings.lock();
    let before = settings.sleep_timer.clone();
    settings.sleep_timer.update_from(state);
    settings.sleep_timer != before
}

/// Remember the deferred stop a finished countdown handed to the player
fn record_pending(
    persistence: &Persistence,
    registry: &PlayerRegistry<PlayerHandle>,
    action: EndAction,
) -> bool {
    if !action.is_deferred() {
        return false;
    }
    let (queue, index) = match registry.get() {
        Some(player) if player.state().status() == PlaybackStatus::Stopped => {
            tracing::debug!("Player already stopped, nothing left to defer");
            return false;
        }
        Some(player) => player.state().queue_snapshot(),
        None => (Vec::new(), None),
    };

    let pending = PendingSleepAction::for_end_action(action, &queue, index);
    let mut settings = persistence.settings.lock();
    if settings.sleep_timer.pending_action == pending {
        return false;
    }
    settings.sleep_timer.pending_action = pending;
    true
}

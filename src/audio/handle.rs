//! Player handle for non-blocking control from the core
//!
//! `PlayerHandle` sends commands to the player task and returns
//! immediately. State is read from `SharedPlayerState` without blocking.

use super::events::{PlayerCommand, PlayerCommandSender, SharedPlayerState};
use crate::features::sleep_timer::SleepTimerPort;

/// Handle for controlling the player task
///
/// Commands are fire-and-forget. If the player task has gone away the
/// command is dropped and a warning logged.
#[derive(Clone)]
pub struct PlayerHandle {
    command_tx: PlayerCommandSender,
    state: SharedPlayerState,
}

impl std::fmt::Debug for PlayerHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlayerHandle")
            .field("state", &self.state)
            .finish()
    }
}

impl PlayerHandle {
    /// Create a new player handle
    pub fn new(command_tx: PlayerCommandSender, state: SharedPlayerState) -> Self {
        Self { command_tx, state }
    }

    /// Shared state the player task keeps current
    pub fn state(&self) -> &SharedPlayerState {
        &self.state
    }

    fn send(&self, command: PlayerCommand) {
        if let Err(e) = self.command_tx.send(command) {
            tracing::warn!("Player channel closed, dropped {:?}", e.0);
        }
    }

    // ============ Playback Control ============

    pub fn pause(&self) {
        self.send(PlayerCommand::Pause);
    }

    pub fn stop(&self) {
        self.send(PlayerCommand::Stop);
    }

    /// Set volume
    ///
    /// Shared state is updated immediately so reads right after the call
    /// see the new value.
    pub fn set_volume(&self, volume: f32) {
        let volume = volume.clamp(0.0, 1.0);
        self.state.set_volume(volume);
        self.send(PlayerCommand::SetVolume { volume });
    }

    // ============ State Queries (non-blocking reads) ============

    pub fn volume(&self) -> f32 {
        self.state.volume()
    }

    /// Check if the player task is still receiving commands
    pub fn is_connected(&self) -> bool {
        !self.command_tx.is_closed()
    }
}

impl SleepTimerPort for PlayerHandle {
    fn current_volume(&self) -> f32 {
        self.volume()
    }

    fn set_volume(&self, volume: f32) {
        PlayerHandle::set_volume(self, volume);
    }

    fn pause_playback(&self) {
        self.pause();
    }

    fn stop_playback(&self) {
        self.stop();
    }

    fn stop_after_current_track(&self) {
        self.send(PlayerCommand::StopAfterCurrentTrack);
    }

    fn stop_after_queue(&self) {
        self.send(PlayerCommand::StopAfterQueue);
    }
}

//! Player communication types
//!
//! This module provides commands and events for the player task:
//! - `PlayerCommand` - Commands sent from the core to the player task
//! - `PlayerEvent` - Events sent from the player task back to the app
//! - `SharedPlayerState` - Thread-safe state for non-blocking reads
//!
//! ## Architecture
//! ```text
//! Core (PlayerHandle) --[PlayerCommand]--> Player task
//! Core                <--[PlayerEvent]---- Player task
//! Core                <--[SharedState]---- Player task (non-blocking reads)
//! ```

use std::sync::Arc;

use parking_lot::RwLock;

// ============ Commands (Core -> Player) ============

/// Commands sent to the player task
///
/// All commands are processed asynchronously - the sender returns immediately.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerCommand {
    /// Set output volume (0.0 - 1.0)
    SetVolume { volume: f32 },
    /// Pause playback
    Pause,
    /// Stop playback
    Stop,
    /// Stop once the current track ends
    StopAfterCurrentTrack,
    /// Stop once the queue is exhausted
    StopAfterQueue,
}

// ============ Events (Player -> Core) ============

/// Events emitted by the player task
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// Volume applied
    VolumeChanged { volume: f32 },
    /// Playback paused
    Paused,
    /// Playback stopped
    Stopped,
    /// Current queue position changed
    TrackChanged { index: Option<usize> },
}

// ============ Shared State ============

/// Playback status as seen by readers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackStatus {
    Playing,
    Paused,
    #[default]
    Stopped,
}

/// A stop the player has been asked to perform later
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeferredStop {
    AfterCurrentTrack,
    AfterQueue,
}

/// Inner state protected by RwLock
#[derive(Debug, Clone)]
struct PlayerStateInner {
    status: PlaybackStatus,
    /// Volume (0.0 - 1.0)
    volume: f32,
    /// Media ids of the current queue
    queue: Vec<String>,
    queue_index: Option<usize>,
    deferred_stop: Option<DeferredStop>,
}

impl Default for PlayerStateInner {
    fn default() -> Self {
        Self {
            status: PlaybackStatus::Stopped,
            volume: 1.0,
            queue: Vec::new(),
            queue_index: None,
            deferred_stop: None,
        }
    }
}

/// Thread-safe shared player state
///
/// The player task updates it after each command; everyone else only reads.
#[derive(Clone, Default)]
pub struct SharedPlayerState {
    inner: Arc<RwLock<PlayerStateInner>>,
}

impl std::fmt::Debug for SharedPlayerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("SharedPlayerState")
            .field("status", &inner.status)
            .field("volume", &inner.volume)
            .field("queue_len", &inner.queue.len())
            .field("queue_index", &inner.queue_index)
            .finish()
    }
}

impl SharedPlayerState {
    /// Create new shared state
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> PlaybackStatus {
        self.inner.read().status
    }

    pub fn volume(&self) -> f32 {
        self.inner.read().volume
    }

    /// Current queue and position in it
    pub fn queue_snapshot(&self) -> (Vec<String>, Option<usize>) {
        let inner = self.inner.read();
        (inner.queue.clone(), inner.queue_index)
    }

    pub fn deferred_stop(&self) -> Option<DeferredStop> {
        self.inner.read().deferred_stop
    }

    pub fn set_status(&self, status: PlaybackStatus) {
        self.inner.write().status = status;
    }

    pub fn set_volume(&self, volume: f32) {
        self.inner.write().volume = volume.clamp(0.0, 1.0);
    }

    /// Replace the queue; the index is dropped when out of range
    pub fn set_queue(&self, queue: Vec<String>, index: Option<usize>) {
        let mut inner = self.inner.write();
        inner.queue_index = index.filter(|i| *i < queue.len());
        inner.queue = queue;
    }

    pub fn set_queue_index(&self, index: Option<usize>) {
        let mut inner = self.inner.write();
        inner.queue_index = index.filter(|i| *i < inner.queue.len());
    }

    pub fn set_deferred_stop(&self, stop: Option<DeferredStop>) {
        self.inner.write().deferred_stop = stop;
    }
}

// ============ Channel Types ============

/// Sender for player commands
pub type PlayerCommandSender = tokio::sync::mpsc::UnboundedSender<PlayerCommand>;

/// Receiver for player commands
pub type PlayerCommandReceiver = tokio::sync::mpsc::UnboundedReceiver<PlayerCommand>;

/// Sender for player events
pub type PlayerEventSender = tokio::sync::mpsc::UnboundedSender<PlayerEvent>;

/// Receiver for player events
pub type PlayerEventReceiver = tokio::sync::mpsc::UnboundedReceiver<PlayerEvent>;

/// Create a command channel
pub fn player_command_channel() -> (PlayerCommandSender, PlayerCommandReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

/// Create an event channel
pub fn player_event_channel() -> (PlayerEventSender, PlayerEventReceiver) {
    tokio::sync::mpsc::unbounded_channel()
}

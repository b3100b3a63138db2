//! Observable single-slot player registry
//!
//! Replaces a process-wide "current player" global. The playback side
//! registers its player once it exists; the core reads it on demand or
//! subscribes to be told when it appears.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::features::sleep_timer::SleepTimerPort;

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Holds at most one player; cloning shares the slot
pub struct PlayerRegistry<T> {
    inner: Arc<Mutex<RegistryInner<T>>>,
}

struct RegistryInner<T> {
    current: Option<T>,
    listeners: Vec<Listener<T>>,
}

impl<T> Clone for PlayerRegistry<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for PlayerRegistry<T> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                current: None,
                listeners: Vec::new(),
            })),
        }
    }
}

impl<T> std::fmt::Debug for PlayerRegistry<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("PlayerRegistry")
            .field("registered", &inner.current.is_some())
            .field("listeners", &inner.listeners.len())
            .finish()
    }
}

impl<T: Clone> PlayerRegistry<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a player, replacing any previous one, and notify listeners
    pub fn set(&self, player: T) {
        let listeners = {
            let mut inner = self.inner.lock();
            inner.current = Some(player.clone());
            inner.listeners.clone()
        };
        // Listeners run unlocked so they may read the registry.
        for listener in listeners {
            listener(&player);
        }
    }

    pub fn get(&self) -> Option<T> {
        self.inner.lock().current.clone()
    }

    /// Remove the current player, returning it
    pub fn clear(&self) -> Option<T> {
        self.inner.lock().current.take()
    }

    pub fn is_available(&self) -> bool {
        self.inner.lock().current.is_some()
    }

    /// Call `listener` for every player registered from now on
    ///
    /// If a player is already present the listener runs immediately.
    pub fn on_available(&self, listener: impl Fn(&T) + Send + Sync + 'static) {
        let listener: Listener<T> = Arc::new(listener);
        let current = {
            let mut inner = self.inner.lock();
            inner.listeners.push(Arc::clone(&listener));
            inner.current.clone()
        };
        if let Some(player) = current {
            listener(&player);
        }
    }
}

/// Routes sleep timer effects to whichever player is registered
///
/// Without a player, effects are dropped and the volume reads as full.
impl<T> SleepTimerPort for PlayerRegistry<T>
where
    T: SleepTimerPort + Clone + Send + 'static,
{
    fn current_volume(&self) -> f32 {
        self.get().map_or(1.0, |player| player.current_volume())
    }

    fn set_volume(&self, volume: f32) {
        match self.get() {
            Some(player) => player.set_volume(volume),
            None => tracing::debug!("No player registered, volume change dropped"),
        }
    }

    fn pause_playback(&self) {
        match self.get() {
            Some(player) => player.pause_playback(),
            None => tracing::warn!("No player registered, pause dropped"),
        }
    }

    fn stop_playback(&self) {
        match self.get() {
            Some(player) => player.stop_playback(),
            None => tracing::warn!("No player registered, stop dropped"),
        }
    }

    fn stop_after_current_track(&self) {
        match self.get() {
            Some(player) => player.stop_after_current_track(),
            None => tracing::warn!("No player registered, stop after track dropped"),
        }
    }

    fn stop_after_queue(&self) {
        match self.get() {
            Some(player) => player.stop_after_queue(),
            None => tracing::warn!("No player registered, stop after queue dropped"),
        }
    }
}

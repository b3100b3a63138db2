//! Capabilities the sleep timer consumes
//!
//! The controller never touches a media player directly. It reads and
//! writes volume and fires end actions through [`SleepTimerPort`], and
//! reads wall-clock time through [`Clock`].

use tokio::time::Instant;

/// Player capabilities needed by the sleep timer
///
/// Implementations are called while the controller holds its state lock,
/// so they must not call back into the controller.
pub trait SleepTimerPort: Send + Sync {
    /// Current output volume (0.0 - 1.0)
    fn current_volume(&self) -> f32;
    /// Set output volume (0.0 - 1.0)
    fn set_volume(&self, volume: f32);
    fn pause_playback(&self);
    fn stop_playback(&self);
    /// Stop once the current track has finished
    fn stop_after_current_track(&self);
    /// Stop once the queue has run out
    fn stop_after_queue(&self);
}

/// Source of Unix time in milliseconds
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock, used in production so deadlines survive restarts
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock anchored to a tokio [`Instant`]
///
/// Advances with the tokio timer, including paused test time.
#[derive(Debug, Clone, Copy)]
pub struct InstantClock {
    origin: Instant,
    origin_millis: i64,
}

impl InstantClock {
    /// Anchor to the current wall-clock time
    pub fn new() -> Self {
        Self::starting_at(chrono::Utc::now().timestamp_millis())
    }

    /// Anchor to an arbitrary Unix millisecond value
    pub fn starting_at(origin_millis: i64) -> Self {
        Self {
            origin: Instant::now(),
            origin_millis,
        }
    }
}

impl Default for InstantClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for InstantClock {
    fn now_millis(&self) -> i64 {
        self.origin_millis + self.origin.elapsed().as_millis() as i64
    }
}

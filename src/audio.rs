//! Player plumbing
//!
//! This module connects the core to whatever actually plays audio:
//! - `PlayerHandle`: non-blocking control, implements `SleepTimerPort`
//! - `SharedPlayerState`: lock-protected state readable from anywhere
//! - `player`: headless task that applies commands to shared state
//! - `events`: command/event types and channels

pub mod events;
mod handle;
pub mod player;

pub use events::{
    DeferredStop, PlaybackStatus, PlayerCommand, PlayerEvent, PlayerEventReceiver,
    PlayerEventSender, SharedPlayerState, player_command_channel, player_event_channel,
};
pub use handle::PlayerHandle;
pub use player::{advance, spawn_player};

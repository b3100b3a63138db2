//! Headless player task
//!
//! Applies `PlayerCommand`s to `SharedPlayerState` and reports what it did
//! as `PlayerEvent`s. There is no decoder behind it; whoever embeds the
//! core drives track changes through `advance`.

use super::events::{
    DeferredStop, PlaybackStatus, PlayerCommand, PlayerCommandReceiver, PlayerEvent,
    PlayerEventSender, SharedPlayerState, player_command_channel,
};
use super::handle::PlayerHandle;

/// Spawn the player task on the current runtime
///
/// Returns the handle used to control it. The task exits when every
/// handle has been dropped.
pub fn spawn_player(
    state: SharedPlayerState,
    event_tx: PlayerEventSender,
) -> (PlayerHandle, tokio::task::JoinHandle<()>) {
    let (command_tx, command_rx) = player_command_channel();
    let handle = PlayerHandle::new(command_tx, state.clone());
    let task = tokio::spawn(run_player(command_rx, state, event_tx));
    (handle, task)
}

/// Main loop for the player task
pub async fn run_player(
    mut command_rx: PlayerCommandReceiver,
    state: SharedPlayerState,
    event_tx: PlayerEventSender,
) {
    tracing::info!("Player task started");

    while let Some(command) = command_rx.recv().await {
        tracing::debug!("Player command: {:?}", command);
        if let Some(event) = apply_command(&state, command) {
            let _ = event_tx.send(event);
        }
    }

    tracing::info!("Player task exiting (command channel closed)");
}

fn apply_command(state: &SharedPlayerState, command: PlayerCommand) -> Option<PlayerEvent> {
    match command {
        PlayerCommand::SetVolume { volume } => {
            state.set_volume(volume);
            Some(PlayerEvent::VolumeChanged {
                volume: state.volume(),
            })
        }
        PlayerCommand::Pause => {
            if state.status() == PlaybackStatus::Playing {
                state.set_status(PlaybackStatus::Paused);
                tracing::info!("Playback paused");
                Some(PlayerEvent::Paused)
            } else {
                None
            }
        }
        PlayerCommand::Stop => {
            state.set_status(PlaybackStatus::Stopped);
            state.set_deferred_stop(None);
            tracing::info!("Playback stopped");
            Some(PlayerEvent::Stopped)
        }
        PlayerCommand::StopAfterCurrentTrack => {
            state.set_deferred_stop(Some(DeferredStop::AfterCurrentTrack));
            tracing::info!("Playback will stop after the current track");
            None
        }
        PlayerCommand::StopAfterQueue => {
            state.set_deferred_stop(Some(DeferredStop::AfterQueue));
            tracing::info!("Playback will stop after the queue");
            None
        }
    }
}

/// Move to the next queue entry, honoring a deferred stop
///
/// Returns the events produced by the transition.
pub fn advance(state: &SharedPlayerState) -> Vec<PlayerEvent> {
    let (queue, index) = state.queue_snapshot();
    let next = index.map(|i| i + 1).filter(|i| *i < queue.len());

    let mut events = Vec::new();
    if state.deferred_stop() == Some(DeferredStop::AfterCurrentTrack) {
        state.set_status(PlaybackStatus::Stopped);
        state.set_deferred_stop(None);
        events.push(PlayerEvent::Stopped);
        return events;
    }

    state.set_queue_index(next);
    events.push(PlayerEvent::TrackChanged { index: next });
    if next.is_none() {
        state.set_status(PlaybackStatus::Stopped);
        state.set_deferred_stop(None);
        events.push(PlayerEvent::Stopped);
    }
    events
}

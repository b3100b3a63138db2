//! Ember - headless player daemon
//!
//! Runs the application core against a headless player task. Set
//! `EMBER_SLEEP_MINUTES` to start a sleep timer at launch; the daemon
//! exits on Ctrl-C or once the timer finishes.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use ember::App;
use ember::app::PlayerRegistry;
use ember::audio::{PlaybackStatus, SharedPlayerState, player_event_channel, spawn_player};
use ember::features::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let sleep_minutes = sleep_minutes_from_env()?;

    // 1. Load settings and build the core before any player exists
    let settings = Settings::load();
    let registry = PlayerRegistry::new();
    let app = App::new(settings, registry.clone());

    // 2. Start the player and make it available to the core
    let state = SharedPlayerState::new();
    state.set_status(PlaybackStatus::Playing);
    let (event_tx, mut event_rx) = player_event_channel();
    let (handle, player_task) = spawn_player(state, event_tx);
    registry.set(handle);

    // 3. Optionally start a countdown
    if let Some(minutes) = sleep_minutes {
        app.controller().cancel_timer();
        app.controller().select_quick_duration(minutes);
        app.controller().start_timer();
    }

    let timer_running = app.controller().is_running();
    let finished = async {
        if timer_running {
            app.timer_finished().await
        } else {
            std::future::pending::<()>().await
        }
    };
    tokio::pin!(finished);

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result.context("Failed to listen for Ctrl-C")?;
                tracing::info!("Interrupted, shutting down");
                break;
            }
            _ = &mut finished => {
                tracing::info!("Sleep timer finished, shutting down");
                break;
            }
            Some(event) = event_rx.recv() => {
                tracing::debug!("Player event: {:?}", event);
                app.handle_player_event(&event);
            }
        }
    }

    app.save().context("Failed to save settings")?;
    registry.clear();
    player_task.abort();
    Ok(())
}

/// Minutes requested through `EMBER_SLEEP_MINUTES`, if set
fn sleep_minutes_from_env() -> anyhow::Result<Option<u32>> {
    let Ok(raw) = std::env::var("EMBER_SLEEP_MINUTES") else {
        return Ok(None);
    };
    let minutes: u32 = raw
        .trim()
        .parse()
        .with_context(|| format!("EMBER_SLEEP_MINUTES is not a number: {:?}", raw))?;
    if minutes == 0 {
        anyhow::bail!("EMBER_SLEEP_MINUTES must be greater than zero");
    }
    Ok(Some(minutes))
}

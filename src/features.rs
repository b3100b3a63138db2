//! Feature modules - core logic separated from any UI
//!
//! Each feature module contains the logic for a specific functionality.
//! Features talk to playback only through traits and handles.

pub mod library;
pub mod lyrics;
pub mod settings;
pub mod sleep_timer;

pub use library::{SearchCorpus, SearchResults, SortOrder, search_library};
pub use lyrics::LyricsSynchronizer;
pub use settings::{LibrarySettings, Settings, SettingsError};
pub use sleep_timer::{EndAction, SleepTimerController, SleepTimerPort, SleepTimerUiState};

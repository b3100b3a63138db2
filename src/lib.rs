//! Ember - core logic of a media player
//!
//! Sleep timer, lyrics synchronization, library search and sorting,
//! independent of any UI toolkit.

pub mod app;
pub mod audio;
pub mod features;

pub use app::{App, PlayerRegistry};

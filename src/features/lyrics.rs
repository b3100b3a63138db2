//! Lyrics module - parsing and synchronization
//!
//! - `lrc`: LRC parsing with tolerance for malformed timestamps
//! - `sync`: current-line tracking against a playback position

pub mod lrc;
pub mod sync;
mod types;

pub use lrc::{SYNTHETIC_LINE_SPACING_MS, format_timestamp, parse_lrc};
pub use sync::{
    DEFAULT_POLL_INTERVAL, LyricsSynchronizer, PositionSource, context_range,
    find_current_line_index,
};
pub use types::{LyricsLine, LyricsMetadata, ParsedLyrics};

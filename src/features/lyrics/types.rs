//! Lyrics data types

use serde::{Deserialize, Serialize};

/// A single timed line of lyrics
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LyricsLine {
    /// Start time in milliseconds
    pub timestamp_ms: u64,
    /// Start of the following line, `u64::MAX` for the last line
    pub end_ms: u64,
    pub text: String,
    /// False when the timestamp was synthesized for an untimed line
    #[serde(default)]
    pub timed: bool,
}

impl LyricsLine {
    pub fn new(timestamp_ms: u64, text: impl Into<String>) -> Self {
        Self {
            timestamp_ms,
            end_ms: u64::MAX,
            text: text.into(),
            timed: true,
        }
    }

    /// Whether the line carries no visible text (instrumental gap)
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Whether `position_ms` falls within this line
    pub fn contains(&self, position_ms: u64) -> bool {
        position_ms >= self.timestamp_ms && position_ms < self.end_ms
    }
}

/// ID tags found in an LRC payload
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LyricsMetadata {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Lyricist
    pub author: Option<String>,
    /// Creator of the LRC file
    pub by: Option<String>,
    pub length: Option<String>,
    /// Global adjustment in ms; positive values make lines appear sooner
    pub offset_ms: i64,
}

/// Result of parsing a lyrics payload
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedLyrics {
    /// Lines sorted by timestamp
    pub lines: Vec<LyricsLine>,
    pub metadata: LyricsMetadata,
    /// Lines whose leading bracket could not be read as a timestamp
    pub malformed_count: usize,
}

impl ParsedLyrics {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Whether at least one line carried a real timestamp
    pub fn is_synced(&self) -> bool {
        self.lines.iter().any(|line| line.timed)
    }
}

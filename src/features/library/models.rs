//! Library entity models
//!
//! Plain records handed to the core by whatever owns the media store.

use serde::{Deserialize, Serialize};

/// Audio track
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub album: String,
    /// Duration in milliseconds
    pub duration_ms: u64,
    /// Track number in album
    pub track_number: Option<u32>,
    pub genre: Option<String>,
    /// File path on disk
    pub file_path: String,
    /// When the song entered the library, Unix milliseconds
    pub added_timestamp_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Album {
    pub id: i64,
    pub title: String,
    pub artist: String,
    pub year: Option<i32>,
    pub track_count: u32,
    pub added_timestamp_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Artist {
    pub id: i64,
    pub name: String,
    pub album_count: u32,
    pub track_count: u32,
}

/// User playlist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Playlist {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub track_count: u32,
    /// Created timestamp, Unix milliseconds
    pub created_at_ms: i64,
}

/// Directory containing media
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Folder {
    pub path: String,
    pub name: String,
    pub track_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genre {
    pub name: String,
    pub track_count: u32,
}

/// Shelf a longform item is filed under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LongformCategory {
    #[default]
    Unassigned,
    Podcast,
    Audiobook,
}

impl std::fmt::Display for LongformCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LongformCategory::Unassigned => write!(f, "Unassigned"),
            LongformCategory::Podcast => write!(f, "Podcast"),
            LongformCategory::Audiobook => write!(f, "Audiobook"),
        }
    }
}

/// Podcast episode or audiobook chapter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LongformItem {
    pub id: i64,
    pub title: String,
    /// Show, publisher or folder the item came from
    pub source: String,
    pub category: LongformCategory,
    pub duration_ms: u64,
    pub added_timestamp_ms: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Video {
    pub id: i64,
    pub title: String,
    /// Channel or folder the video came from
    pub source: String,
    pub duration_ms: u64,
    pub added_timestamp_ms: i64,
}

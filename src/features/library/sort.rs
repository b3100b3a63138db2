//! Library sorting
//!
//! Comparator-based, stable sorting by field and direction. Fields an
//! entity does not have compare equal and fall through to the title, so
//! every entity always has a defined position.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::models::{Album, Artist, Folder, Genre, LongformItem, Playlist, Song, Video};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    /// Title or name, compared as exact strings
    #[default]
    Title,
    Duration,
    /// Time added to the library
    Added,
    TrackCount,
    AlbumCount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggle(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// Field plus direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SortOrder {
    pub field: SortField,
    pub direction: SortDirection,
}

impl SortOrder {
    pub fn new(field: SortField, direction: SortDirection) -> Self {
        Self { field, direction }
    }
}

/// Keys an entity can be sorted by
pub trait Sortable {
    /// Title or name
    fn sort_title(&self) -> &str;

    fn sort_duration_ms(&self) -> Option<u64> {
        None
    }

    fn sort_added_ms(&self) -> Option<i64> {
        None
    }

    fn sort_track_count(&self) -> Option<u32> {
        None
    }

    fn sort_album_count(&self) -> Option<u32> {
        None
    }
}

impl Sortable for Song {
    fn sort_title(&self) -> &str {
        &self.title
    }

    fn sort_duration_ms(&self) -> Option<u64> {
        Some(self.duration_ms)
    }

    fn sort_added_ms(&self) -> Option<i64> {
        Some(self.added_timestamp_ms)
    }
}

impl Sortable for Album {
    fn sort_title(&self) -> &str {
        &self.title
    }

    fn sort_added_ms(&self) -> Option<i64> {
        Some(self.added_timestamp_ms)
    }

    fn sort_track_count(&self) -> Option<u32> {
        Some(self.track_count)
    }
}

impl Sortable for Artist {
    fn sort_title(&self) -> &str {
        &self.name
    }

    fn sort_track_count(&self) -> Option<u32> {
        Some(self.track_count)
    }

    fn sort_album_count(&self) -> Option<u32> {
        Some(self.album_count)
    }
}

impl Sortable for Playlist {
    fn sort_title(&self) -> &str {
        &self.name
    }

    fn sort_added_ms(&self) -> Option<i64> {
        Some(self.created_at_ms)
    }

    fn sort_track_count(&self) -> Option<u32> {
        Some(self.track_count)
    }
}

impl Sortable for Folder {
    fn sort_title(&self) -> &str {
        &self.name
    }

    fn sort_track_count(&self) -> Option<u32> {
        Some(self.track_count)
    }
}

impl Sortable for Genre {
    fn sort_title(&self) -> &str {
        &self.name
    }

    fn sort_track_count(&self) -> Option<u32> {
        Some(self.track_count)
    }
}

impl Sortable for LongformItem {
    fn sort_title(&self) -> &str {
        &self.title
    }

    fn sort_duration_ms(&self) -> Option<u64> {
        Some(self.duration_ms)
    }

    fn sort_added_ms(&self) -> Option<i64> {
        Some(self.added_timestamp_ms)
    }
}

impl Sortable for Video {
    fn sort_title(&self) -> &str {
        &self.title
    }

    fn sort_duration_ms(&self) -> Option<u64> {
        Some(self.duration_ms)
    }

    fn sort_added_ms(&self) -> Option<i64> {
        Some(self.added_timestamp_ms)
    }
}

/// Lexicographic title order on the exact strings
///
/// Uppercase sorts before lowercase, so "Zed" precedes "apple".
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    a.cmp(b)
}

/// Ascending comparison of two entities by `field`
pub fn compare_by<T: Sortable + ?Sized>(a: &T, b: &T, field: SortField) -> Ordering {
    let primary = match field {
        SortField::Title => Ordering::Equal,
        SortField::Duration => a.sort_duration_ms().cmp(&b.sort_duration_ms()),
        SortField::Added => a.sort_added_ms().cmp(&b.sort_added_ms()),
        SortField::TrackCount => a.sort_track_count().cmp(&b.sort_track_count()),
        SortField::AlbumCount => a.sort_album_count().cmp(&b.sort_album_count()),
    };
    primary.then_with(|| compare_titles(a.sort_title(), b.sort_title()))
}

/// Sort in place; equal entities keep their relative order
pub fn sort_entities<T: Sortable>(items: &mut [T], order: SortOrder) {
    match order.direction {
        SortDirection::Ascending => items.sort_by(|a, b| compare_by(a, b, order.field)),
        SortDirection::Descending => items.sort_by(|a, b| compare_by(b, a, order.field)),
    }
}

/// Sorted copy of `items`
pub fn sorted<T: Sortable + Clone>(items: &[T], order: SortOrder) -> Vec<T> {
    let mut items = items.to_vec();
    sort_entities(&mut items, order);
    items
}

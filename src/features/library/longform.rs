//! Longform classification heuristics
//!
//! Guesses whether an unfiled longform item is a podcast episode or an
//! audiobook chapter from its title, source and duration.

use super::models::{LongformCategory, LongformItem};

/// Unfiled items longer than this are treated as audiobooks
pub const LONGFORM_DURATION_THRESHOLD_MS: u64 = 20 * 60 * 1000;

const PODCAST_TOKENS: &[&str] = &["podcast", "episode", "radio", "show", "interview", "ep."];

const AUDIOBOOK_TOKENS: &[&str] = &[
    "audiobook",
    "chapter",
    "saga",
    "book",
    "novel",
    "narrated",
];

/// Suggest a category; an existing assignment always wins
pub fn suggest_longform_category(
    title: &str,
    source: &str,
    existing: LongformCategory,
    duration_ms: u64,
) -> LongformCategory {
    if existing != LongformCategory::Unassigned {
        return existing;
    }

    let haystack = format!("{} {}", title, source).to_lowercase();
    let contains_any = |tokens: &[&str]| tokens.iter().any(|token| haystack.contains(token));

    if contains_any(PODCAST_TOKENS) {
        LongformCategory::Podcast
    } else if contains_any(AUDIOBOOK_TOKENS) {
        LongformCategory::Audiobook
    } else if duration_ms > LONGFORM_DURATION_THRESHOLD_MS {
        LongformCategory::Audiobook
    } else {
        LongformCategory::Unassigned
    }
}

impl LongformItem {
    /// Category suggested for this item
    pub fn suggested_category(&self) -> LongformCategory {
        suggest_longform_category(&self.title, &self.source, self.category, self.duration_ms)
    }
}

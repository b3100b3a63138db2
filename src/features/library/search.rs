//! Library search
//!
//! Every entity exposes its searchable fields. Text is normalized by
//! lowercasing, stripping diacritics and dropping punctuation, so
//! "S.O.S" and "sos" index identically. A query is split on whitespace and
//! an entity matches when every term occurs in one of its fields. Spaces
//! inside a field are ignored when matching, which lets "Molten-Heart"
//! find "Molten Heart".

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

use super::models::{Album, Artist, Folder, Genre, LongformItem, Playlist, Song, Video};

/// Separates fields in indexed text so terms never match across fields
const FIELD_SEPARATOR: char = '\n';

/// Entities that can be found by text search
pub trait Searchable {
    /// Fields to index, most significant first
    fn search_fields(&self) -> Vec<&str>;
}

impl Searchable for Song {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.title.as_str(), self.artist.as_str(), self.album.as_str()];
        fields.extend(self.genre.as_deref());
        fields
    }
}

impl Searchable for Album {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.artist.as_str()]
    }
}

impl Searchable for Artist {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }
}

impl Searchable for Playlist {
    fn search_fields(&self) -> Vec<&str> {
        let mut fields = vec![self.name.as_str()];
        fields.extend(self.description.as_deref());
        fields
    }
}

impl Searchable for Folder {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str(), self.path.as_str()]
    }
}

impl Searchable for Genre {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.name.as_str()]
    }
}

impl Searchable for LongformItem {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.source.as_str()]
    }
}

impl Searchable for Video {
    fn search_fields(&self) -> Vec<&str> {
        vec![self.title.as_str(), self.source.as_str()]
    }
}

/// Lowercase, strip diacritics and drop punctuation; whitespace runs become one space
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;

    for c in text.nfd().filter(|c| !is_combining_mark(*c)) {
        if c.is_whitespace() {
            pending_space = !out.is_empty();
        } else if c.is_alphanumeric() {
            if pending_space {
                out.push(' ');
                pending_space = false;
            }
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// Normalized text of all fields with spaces removed, one field per line
pub fn indexed_text<T: Searchable + ?Sized>(item: &T) -> String {
    let mut text = String::new();
    for field in item.search_fields() {
        if !text.is_empty() {
            text.push(FIELD_SEPARATOR);
        }
        text.extend(normalize(field).chars().filter(|c| *c != ' '));
    }
    text
}

/// Normalized, non-empty query terms
pub fn query_terms(query: &str) -> Vec<String> {
    query
        .split_whitespace()
        .map(|term| normalize(term).replace(' ', ""))
        .filter(|term| !term.is_empty())
        .collect()
}

fn matches_terms(indexed: &str, terms: &[String]) -> bool {
    terms.iter().all(|term| {
        indexed
            .split(FIELD_SEPARATOR)
            .any(|field| field.contains(term.as_str()))
    })
}

/// Read-only set of library entities to search
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchCorpus {
    pub songs: Vec<Song>,
    pub playlists: Vec<Playlist>,
    pub folders: Vec<Folder>,
    pub albums: Vec<Album>,
    pub artists: Vec<Artist>,
    pub genres: Vec<Genre>,
    pub longform: Vec<LongformItem>,
    pub videos: Vec<Video>,
}

/// Matches per category, in corpus order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchResults {
    pub songs: Vec<Song>,
    pub playlists: Vec<Playlist>,
    pub folders: Vec<Folder>,
    pub albums: Vec<Album>,
    pub artists: Vec<Artist>,
    pub genres: Vec<Genre>,
    pub longform: Vec<LongformItem>,
    pub videos: Vec<Video>,
}

impl SearchResults {
    /// True when no category has a match
    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    pub fn total_count(&self) -> usize {
        self.songs.len()
            + self.playlists.len()
            + self.folders.len()
            + self.albums.len()
            + self.artists.len()
            + self.genres.len()
            + self.longform.len()
            + self.videos.len()
    }
}

/// Pre-normalized view of one category
struct CategoryIndex<'a, T> {
    items: &'a [T],
    indexed: Vec<String>,
}

impl<'a, T: Searchable + Clone> CategoryIndex<'a, T> {
    fn new(items: &'a [T]) -> Self {
        Self {
            items,
            indexed: items.iter().map(indexed_text).collect(),
        }
    }

    fn filter(&self, terms: &[String]) -> Vec<T> {
        self.items
            .iter()
            .zip(&self.indexed)
            .filter(|(_, indexed)| matches_terms(indexed, terms))
            .map(|(item, _)| item.clone())
            .collect()
    }
}

/// Normalized index over a corpus, reusable across queries
pub struct SearchIndex<'a> {
    songs: CategoryIndex<'a, Song>,
    playlists: CategoryIndex<'a, Playlist>,
    folders: CategoryIndex<'a, Folder>,
    albums: CategoryIndex<'a, Album>,
    artists: CategoryIndex<'a, Artist>,
    genres: CategoryIndex<'a, Genre>,
    longform: CategoryIndex<'a, LongformItem>,
    videos: CategoryIndex<'a, Video>,
}

impl<'a> SearchIndex<'a> {
    pub fn new(corpus: &'a SearchCorpus) -> Self {
        Self {
            songs: CategoryIndex::new(&corpus.songs),
            playlists: CategoryIndex::new(&corpus.playlists),
            folders: CategoryIndex::new(&corpus.folders),
            albums: CategoryIndex::new(&corpus.albums),
            artists: CategoryIndex::new(&corpus.artists),
            genres: CategoryIndex::new(&corpus.genres),
            longform: CategoryIndex::new(&corpus.longform),
            videos: CategoryIndex::new(&corpus.videos),
        }
    }

    /// Run a query; blank queries match nothing
    pub fn search(&self, query: &str) -> SearchResults {
        let terms = query_terms(query);
        if terms.is_empty() {
            return SearchResults::default();
        }

        let results = SearchResults {
            songs: self.songs.filter(&terms),
            playlists: self.playlists.filter(&terms),
            folders: self.folders.filter(&terms),
            albums: self.albums.filter(&terms),
            artists: self.artists.filter(&terms),
            genres: self.genres.filter(&terms),
            longform: self.longform.filter(&terms),
            videos: self.videos.filter(&terms),
        };
        tracing::debug!("Search {:?} matched {} entities", query, results.total_count());
        results
    }
}

/// One-off search without keeping an index
pub fn search_library(corpus: &SearchCorpus, query: &str) -> SearchResults {
    SearchIndex::new(corpus).search(query)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::library::models::LongformCategory;

    fn song(id: i64, title: &str, artist: &str) -> Song {
        Song {
            id,
            title: title.into(),
            artist: artist.into(),
            album: "Embers".into(),
            duration_ms: 200_000,
            track_number: Some(id as u32),
            genre: None,
            file_path: format!("/music/{}.flac", id),
            added_timestamp_ms: id,
        }
    }

    fn video(id: i64, title: &str) -> Video {
        Video {
            id,
            title: title.into(),
            source: "Live Sessions".into(),
            duration_ms: 300_000,
            added_timestamp_ms: id,
        }
    }

    fn corpus() -> SearchCorpus {
        SearchCorpus {
            songs: vec![
                song(1, "Molten Heart", "Cinder"),
                song(2, "Quiet Rain", "Nimbus"),
                song(3, "S.O.S", "Signal"),
                song(4, "Café del Mar", "Énergie"),
            ],
            videos: vec![video(10, "Molten Heart (Live)"), video(11, "Backstage")],
            longform: vec![LongformItem {
                id: 20,
                title: "Episode 4: Molten Core".into(),
                source: "Deep Earth Radio".into(),
                category: LongformCategory::Podcast,
                duration_ms: 3_600_000,
                added_timestamp_ms: 20,
            }],
            artists: vec![Artist {
                id: 30,
                name: "Cinder".into(),
                album_count: 1,
                track_count: 12,
            }],
            ..Default::default()
        }
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("Café  del   Mar!"), "cafe del mar");
        assert_eq!(normalize("S.O.S"), "sos");
        assert_eq!(normalize("Molten-Heart"), "moltenheart");
        assert_eq!(normalize("  Ünïcödé  "), "unicode");
        assert_eq!(normalize("夜に駆ける"), "夜に駆ける");
    }

    #[test]
    fn test_query_matches_across_categories() {
        let results = search_library(&corpus(), "Molten");
        assert_eq!(results.songs.len(), 1);
        assert_eq!(results.songs[0].title, "Molten Heart");
        assert_eq!(results.videos.len(), 1);
        assert_eq!(results.videos[0].title, "Molten Heart (Live)");
        assert_eq!(results.longform.len(), 1);
        assert!(results.artists.is_empty());
    }

    #[test]
    fn test_punctuation_is_ignored() {
        let results = search_library(&corpus(), "sos");
        assert_eq!(results.songs.len(), 1);
        assert_eq!(results.songs[0].title, "S.O.S");

        let results = search_library(&corpus(), "S.O.S");
        assert_eq!(results.songs[0].title, "S.O.S");

        let results = search_library(&corpus(), "Molten-Heart");
        assert_eq!(results.songs.len(), 1);
        assert_eq!(results.videos.len(), 1);
    }

    #[test]
    fn test_diacritics_are_ignored() {
        let results = search_library(&corpus(), "cafe energie");
        assert_eq!(results.songs.len(), 1);
        assert_eq!(results.songs[0].id, 4);
    }

    #[test]
    fn test_all_terms_must_match() {
        let corpus = corpus();
        let index = SearchIndex::new(&corpus);
        assert_eq!(index.search("molten live").videos.len(), 1);
        assert!(index.search("molten live").songs.is_empty());
        assert_eq!(index.search("heart cinder").songs.len(), 1);
        assert!(index.search("heart nimbus").is_empty());
    }

    #[test]
    fn test_terms_do_not_span_fields() {
        // "heartcinder" only exists across the title/artist boundary
        assert!(search_library(&corpus(), "heartcinder").songs.is_empty());
    }

    #[test]
    fn test_blank_query_returns_nothing() {
        assert!(search_library(&corpus(), "   ").is_empty());
        assert!(search_library(&corpus(), "").is_empty());
        assert!(search_library(&corpus(), " -- ").is_empty());
    }

    #[test]
    fn test_results_keep_corpus_order() {
        let mut corpus = corpus();
        corpus.songs.push(song(5, "Heartbeat", "Pulse"));
        let results = search_library(&corpus, "heart");
        let ids: Vec<i64> = results.songs.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 5]);
    }
}

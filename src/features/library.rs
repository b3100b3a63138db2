//! Media library - entity models, search, sorting and longform heuristics

pub mod longform;
pub mod models;
pub mod search;
pub mod sort;

pub use longform::{LONGFORM_DURATION_THRESHOLD_MS, suggest_longform_category};
pub use models::{
    Album, Artist, Folder, Genre, LongformCategory, LongformItem, Playlist, Song, Video,
};
pub use search::{
    SearchCorpus, SearchIndex, SearchResults, Searchable, normalize, search_library,
};
pub use sort::{SortDirection, SortField, SortOrder, Sortable, sort_entities, sorted};

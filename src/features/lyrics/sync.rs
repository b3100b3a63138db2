//! Lyrics synchronization against a playback position
//!
//! `LyricsSynchronizer` owns one parsed lyrics payload and tracks which
//! line is current. Synchronization polls a [`PositionSource`] from a tokio
//! task; the current index lives in shared state so readers never block on
//! the poller.

use std::ops::Range;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::lrc::parse_lrc;
use super::types::{LyricsLine, LyricsMetadata};

/// Default interval between position polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Anything that can report the current playback position
pub trait PositionSource: Send + Sync + 'static {
    fn position_ms(&self) -> u64;
}

impl<F> PositionSource for F
where
    F: Fn() -> u64 + Send + Sync + 'static,
{
    fn position_ms(&self) -> u64 {
        self()
    }
}

/// Index of the last line starting at or before `position_ms`
///
/// `lines` must be sorted by timestamp. Returns `None` when the position
/// precedes the first line or there are no lines.
pub fn find_current_line_index(lines: &[LyricsLine], position_ms: u64) -> Option<usize> {
    lines
        .partition_point(|line| line.timestamp_ms <= position_ms)
        .checked_sub(1)
}

/// Up to `2 * context_size + 1` indices centered on `center`, clamped to `len`
pub fn context_range(len: usize, center: usize, context_size: usize) -> Range<usize> {
    if len == 0 {
        return 0..0;
    }
    let center = center.min(len - 1);
    let start = center.saturating_sub(context_size);
    let end = center.saturating_add(context_size).saturating_add(1).min(len);
    start..end
}

#[derive(Debug, Default)]
struct SyncState {
    lines: Vec<LyricsLine>,
    metadata: LyricsMetadata,
    current_index: Option<usize>,
    is_synchronized: bool,
    /// Poller allowed to write; `None` while not synchronizing
    session: Option<u64>,
    /// Incremented on every start and stop
    generation: u64,
}

impl SyncState {
    fn update(&mut self, position_ms: u64) -> Option<usize> {
        self.current_index = find_current_line_index(&self.lines, position_ms);
        if self.session.is_some() && !self.lines.is_empty() {
            self.is_synchronized = true;
        }
        self.current_index
    }

    /// Lookup on behalf of the poller started as `generation`
    ///
    /// Returns false once that poller has been superseded or stopped.
    fn poll(&mut self, generation: u64, position_ms: u64) -> bool {
        if self.session != Some(generation) {
            return false;
        }
        self.update(position_ms);
        true
    }

    fn begin_session(&mut self) -> u64 {
        self.generation += 1;
        self.session = Some(self.generation);
        self.generation
    }

    fn end_session(&mut self) {
        self.generation += 1;
        self.session = None;
        self.is_synchronized = false;
    }
}

/// Tracks the current line of one lyrics payload
pub struct LyricsSynchronizer {
    state: Arc<RwLock<SyncState>>,
    poll_interval: Duration,
    poller: Option<JoinHandle<()>>,
}

impl std::fmt::Debug for LyricsSynchronizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.read();
        f.debug_struct("LyricsSynchronizer")
            .field("lines", &state.lines.len())
            .field("current_index", &state.current_index)
            .field("is_synchronized", &state.is_synchronized)
            .field("polling", &self.poller.is_some())
            .finish()
    }
}

impl Default for LyricsSynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

impl LyricsSynchronizer {
    pub fn new() -> Self {
        Self::with_poll_interval(DEFAULT_POLL_INTERVAL)
    }

    pub fn with_poll_interval(poll_interval: Duration) -> Self {
        Self {
            state: Arc::new(RwLock::new(SyncState::default())),
            poll_interval: poll_interval.max(Duration::from_millis(1)),
            poller: None,
        }
    }

    /// Replace the lines with a freshly parsed payload
    ///
    /// Returns the number of lines. The current line is cleared and
    /// `is_synchronized` drops until the next lookup.
    pub fn parse_lyrics(&self, src: &str) -> usize {
        let parsed = parse_lrc(src);
        tracing::debug!(
            "Parsed {} lyrics lines ({} malformed stamps)",
            parsed.lines.len(),
            parsed.malformed_count
        );

        let mut state = self.state.write();
        state.lines = parsed.lines;
        state.metadata = parsed.metadata;
        state.current_index = None;
        state.is_synchronized = false;
        state.lines.len()
    }

    pub fn lines(&self) -> Vec<LyricsLine> {
        self.state.read().lines.clone()
    }

    pub fn line_count(&self) -> usize {
        self.state.read().lines.len()
    }

    pub fn metadata(&self) -> LyricsMetadata {
        self.state.read().metadata.clone()
    }

    /// Look up and store the current line for `position_ms`
    ///
    /// Only marks the lyrics synchronized while a synchronization is active.
    pub fn update_current_line(&self, position_ms: u64) -> Option<usize> {
        self.state.write().update(position_ms)
    }

    pub fn current_line_index(&self) -> Option<usize> {
        self.state.read().current_index
    }

    pub fn current_line(&self) -> Option<LyricsLine> {
        let state = self.state.read();
        state.current_index.and_then(|i| state.lines.get(i).cloned())
    }

    pub fn is_synchronized(&self) -> bool {
        self.state.read().is_synchronized
    }

    /// Lines around the current one, fewer near either end of the document
    ///
    /// Before the first line the window is anchored at the start.
    pub fn get_context_lines(&self, context_size: usize) -> Vec<LyricsLine> {
        let state = self.state.read();
        let center = state.current_index.unwrap_or(0);
        state.lines[context_range(state.lines.len(), center, context_size)].to_vec()
    }

    /// Begin polling `source`, replacing any earlier poller
    ///
    /// The first lookup happens immediately. Must be called from within a
    /// tokio runtime.
    pub fn start_synchronization(&mut self, source: impl PositionSource) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::error!("Lyrics synchronization needs a tokio runtime");
            return;
        };
        self.stop_polling();

        let source = Arc::new(source);
        let generation = {
            let mut state = self.state.write();
            let generation = state.begin_session();
            state.poll(generation, source.position_ms());
            generation
        };

        let state = Arc::clone(&self.state);
        let poll_interval = self.poll_interval;
        self.poller = Some(runtime.spawn(async move {
            let mut interval = tokio::time::interval(poll_interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            // The first tick completes immediately and the lookup already ran
            interval.tick().await;
            loop {
                interval.tick().await;
                let position_ms = source.position_ms();
                if !state.write().poll(generation, position_ms) {
                    break;
                }
            }
        }));
    }

    /// Stop polling and mark the lyrics as unsynchronized
    ///
    /// A lookup already in flight on another worker is discarded.
    pub fn stop_synchronization(&mut self) {
        self.stop_polling();
        self.state.write().end_session();
    }

    fn stop_polling(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}

impl Drop for LyricsSynchronizer {
    fn drop(&mut self) {
        self.stop_polling();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU64, Ordering};

    fn timed(stamps: &[u64]) -> Vec<LyricsLine> {
        stamps
            .iter()
            .map(|&t| LyricsLine::new(t, format!("line at {}", t)))
            .collect()
    }

    #[test]
    fn test_find_current_line_index() {
        let lines = timed(&[0, 10_000, 20_000, 30_000]);
        assert_eq!(find_current_line_index(&lines, 20_000), Some(2));
        assert_eq!(find_current_line_index(&lines, 19_999), Some(1));
        assert_eq!(find_current_line_index(&lines, 0), Some(0));
        assert_eq!(find_current_line_index(&lines, 99_000), Some(3));
    }

    #[test]
    fn test_find_before_first_line() {
        let lines = timed(&[5_000, 10_000]);
        assert_eq!(find_current_line_index(&lines, 4_999), None);
        assert_eq!(find_current_line_index(&[], 1_000), None);
    }

    #[test]
    fn test_context_range() {
        assert_eq!(context_range(10, 5, 2), 3..8);
        assert_eq!(context_range(10, 0, 2), 0..3);
        assert_eq!(context_range(10, 9, 2), 7..10);
        assert_eq!(context_range(3, 1, 5), 0..3);
        assert_eq!(context_range(0, 0, 2), 0..0);
        assert_eq!(context_range(4, 2, usize::MAX), 0..4);
    }

    #[test]
    fn test_context_lines_follow_current() {
        let sync = LyricsSynchronizer::new();
        sync.parse_lyrics("[00:00.000]a\n[00:01.000]b\n[00:02.000]c\n[00:03.000]d\n[00:04.000]e");
        sync.update_current_line(3_500);
        let texts: Vec<String> = sync.get_context_lines(1).into_iter().map(|l| l.text).collect();
        assert_eq!(texts, vec!["c", "d", "e"]);

        sync.update_current_line(4_500);
        assert_eq!(sync.get_context_lines(2).len(), 3);
    }

    #[test]
    fn test_manual_update_without_synchronization() {
        let sync = LyricsSynchronizer::new();
        assert_eq!(sync.update_current_line(1_000), None);
        assert!(!sync.is_synchronized());

        sync.parse_lyrics("[00:01.000]one\n[00:02.000]two");
        assert_eq!(sync.update_current_line(1_500), Some(0));
        assert!(!sync.is_synchronized());
        assert_eq!(sync.current_line().map(|l| l.text), Some("one".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_marks_synchronized_while_active() {
        let mut sync = LyricsSynchronizer::new();
        sync.parse_lyrics("[00:01.000]one\n[00:02.000]two");
        sync.start_synchronization(|| 500);
        assert!(sync.is_synchronized());

        sync.parse_lyrics("[00:05.000]fresh");
        assert!(!sync.is_synchronized());
        assert_eq!(sync.current_line_index(), None);
        assert_eq!(sync.update_current_line(6_000), Some(0));
        assert!(sync.is_synchronized());

        sync.stop_synchronization();
        sync.update_current_line(7_000);
        assert!(!sync.is_synchronized());
    }

    #[test]
    fn test_superseded_poll_is_discarded() {
        let mut state = SyncState {
            lines: timed(&[0, 1_000]),
            ..Default::default()
        };
        let first = state.begin_session();
        assert!(state.poll(first, 1_500));
        assert!(state.is_synchronized);

        state.end_session();
        assert!(!state.poll(first, 0));
        assert!(!state.is_synchronized);
        assert_eq!(state.current_index, Some(1));

        let second = state.begin_session();
        assert!(!state.poll(first, 0));
        assert!(state.poll(second, 0));
        assert_eq!(state.current_index, Some(0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_polling_follows_position() {
        let position = Arc::new(AtomicU64::new(0));
        let mut sync = LyricsSynchronizer::with_poll_interval(Duration::from_millis(100));
        sync.parse_lyrics("[00:01.000]one\n[00:02.000]two\n[00:03.000]three");

        let source = Arc::clone(&position);
        sync.start_synchronization(move || source.load(Ordering::Relaxed));
        assert!(sync.is_synchronized());
        assert_eq!(sync.current_line_index(), None);

        position.store(2_100, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(150)).await;
        assert_eq!(sync.current_line_index(), Some(1));

        sync.stop_synchronization();
        assert!(!sync.is_synchronized());
        position.store(3_500, Ordering::Relaxed);
        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(sync.current_line_index(), Some(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_blank_payload_stays_unsynchronized() {
        let mut sync = LyricsSynchronizer::new();
        sync.parse_lyrics("   \n\n");
        sync.start_synchronization(|| 1_000);
        assert!(!sync.is_synchronized());
        assert!(sync.lines().is_empty());
        assert!(sync.get_context_lines(3).is_empty());
    }
}

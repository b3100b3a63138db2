//! LRC parser
//!
//! Reads the common `[mm:ss.xx]text` format with line-level timing.
//! Nothing is ever dropped: a line whose leading bracket is not a valid
//! timestamp is kept verbatim with a synthetic timestamp, one second apart
//! per untimed line, starting at zero.

use super::types::{LyricsLine, LyricsMetadata, ParsedLyrics};

/// Spacing between synthetic timestamps of untimed lines
pub const SYNTHETIC_LINE_SPACING_MS: u64 = 1000;

/// Outcome of reading one bracket at the start of a string
#[derive(Debug, PartialEq, Eq)]
enum TimeTag {
    /// Valid timestamp; `consumed` bytes including both brackets
    Time { consumed: usize, time_ms: u64 },
    /// Bracket present but not a readable timestamp
    Malformed,
    /// No bracket at this position
    Absent,
}

/// Parse a timestamp tag: `[mm:ss.xxx]`, `[mm:ss.xx]`, `[mm:ss.x]` or `[mm:ss:xx]`
fn parse_time(src: &str) -> TimeTag {
    if !src.starts_with('[') {
        return TimeTag::Absent;
    }
    let Some(end_bracket) = src.find(']') else {
        return TimeTag::Malformed;
    };

    match parse_time_body(&src[1..end_bracket]) {
        Some(time_ms) => TimeTag::Time {
            consumed: end_bracket + 1,
            time_ms,
        },
        None => TimeTag::Malformed,
    }
}

fn parse_time_body(body: &str) -> Option<u64> {
    let (min_str, rest) = body.split_once(':')?;
    let (sec_str, frac_str) = rest.split_once(['.', ':'])?;

    let min = parse_digits(min_str)?;
    if sec_str.len() > 2 {
        return None;
    }
    let sec = parse_digits(sec_str)?;
    if sec > 59 {
        return None;
    }

    // Handle different precision: x (deciseconds), xx (centiseconds), xxx (milliseconds)
    let mut ms = parse_digits(frac_str)?;
    match frac_str.len() {
        1 => ms *= 100,
        2 => ms *= 10,
        3 => {}
        _ => return None,
    }

    min.checked_mul(60_000)?.checked_add(sec * 1000 + ms)
}

fn parse_digits(src: &str) -> Option<u64> {
    if src.is_empty() || !src.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    src.parse().ok()
}

/// Read an ID tag line such as `[ar:Artist]` into `metadata`
fn parse_id_tag(line: &str, metadata: &mut LyricsMetadata) -> bool {
    let Some(body) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) else {
        return false;
    };
    let Some((key, value)) = body.split_once(':') else {
        return false;
    };
    let value = value.trim();
    let owned = || Some(value.to_string());

    match key.trim().to_ascii_lowercase().as_str() {
        "ti" => metadata.title = owned(),
        "ar" => metadata.artist = owned(),
        "al" => metadata.album = owned(),
        "au" => metadata.author = owned(),
        "by" => metadata.by = owned(),
        "length" => metadata.length = owned(),
        "offset" => match value.trim_start_matches('+').parse::<i64>() {
            Ok(offset) => metadata.offset_ms = offset,
            Err(_) => tracing::debug!("Ignoring unreadable LRC offset {:?}", value),
        },
        "re" | "ve" | "tool" | "#" => {}
        _ => return false,
    }
    true
}

/// Split the leading timestamps off a trimmed line.
///
/// Returns `None` when the first bracket is malformed.
fn split_timestamps(line: &str) -> Option<(Vec<u64>, &str)> {
    let mut timestamps = Vec::new();
    let mut pos = 0;

    while pos < line.len() {
        match parse_time(&line[pos..]) {
            TimeTag::Time { consumed, time_ms } => {
                timestamps.push(time_ms);
                pos += consumed;
            }
            TimeTag::Malformed if timestamps.is_empty() => return None,
            TimeTag::Malformed | TimeTag::Absent => break,
        }
    }

    Some((timestamps, line[pos..].trim()))
}

/// Parse an LRC payload
pub fn parse_lrc(src: &str) -> ParsedLyrics {
    let mut metadata = LyricsMetadata::default();
    let mut lines = Vec::new();
    let mut untimed_count: u64 = 0;
    let mut malformed_count = 0;

    for raw in src.lines() {
        let line = raw.trim();
        if line.is_empty() || parse_id_tag(line, &mut metadata) {
            continue;
        }

        match split_timestamps(line) {
            Some((timestamps, text)) if !timestamps.is_empty() => {
                lines.extend(timestamps.into_iter().map(|t| LyricsLine::new(t, text)));
            }
            parsed => {
                if parsed.is_none() {
                    malformed_count += 1;
                }
                lines.push(LyricsLine {
                    timed: false,
                    ..LyricsLine::new(untimed_count * SYNTHETIC_LINE_SPACING_MS, line)
                });
                untimed_count += 1;
            }
        }
    }

    if metadata.offset_ms != 0 {
        for line in lines.iter_mut().filter(|l| l.timed) {
            line.timestamp_ms = line
                .timestamp_ms
                .saturating_add_signed(metadata.offset_ms.saturating_neg());
        }
    }

    // Stable, so untimed lines keep their document order
    lines.sort_by_key(|line| line.timestamp_ms);

    let mut next_start = u64::MAX;
    for line in lines.iter_mut().rev() {
        line.end_ms = next_start;
        next_start = line.timestamp_ms;
    }

    ParsedLyrics {
        lines,
        metadata,
        malformed_count,
    }
}

/// Format milliseconds as an LRC timestamp tag
pub fn format_timestamp(time_ms: u64) -> String {
    let ms = time_ms % 1000;
    let sec = (time_ms / 1000) % 60;
    let min = time_ms / 60_000;
    format!("[{:02}:{:02}.{:03}]", min, sec, ms)
}

//! Pure reshaping of parsed records into dimension and fact rows.
//!
//! Rounding policy: timestamps convert from milliseconds to seconds by
//! truncating division (1541990258796 ms -> 1541990258 s); durations round
//! half away from zero (227.8672 -> 228). Both are applied consistently so
//! the time-dimension key and the fact start_time always agree.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Datelike, Timelike};

use crate::db::models::{ArtistDim, SongDim, SongMatch, SongplayFact, TimeDim, UserDim};
use crate::records::{LogEvent, SongRecord};

/// Convert an epoch-milliseconds timestamp to whole epoch seconds.
pub fn epoch_seconds(ts_ms: i64) -> i64 {
    ts_ms / 1000
}

/// Derive songs-dimension rows, deduplicated by song_id.
/// The first occurrence of a key wins; later duplicates are dropped.
pub fn extract_song_dims(records: &[SongRecord]) -> Vec<SongDim> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut rows = Vec::new();
    for r in records {
        if !seen.insert(r.song_id.as_str()) {
            continue;
        }
        rows.push(SongDim {
            song_id: r.song_id.clone(),
            title: r.title.clone(),
            artist_id: r.artist_id.clone(),
            year: r.year,
            duration: r.duration.round() as i64,
        });
    }
    rows
}

/// Derive artists-dimension rows, deduplicated by artist_id, first wins.
pub fn extract_artist_dims(records: &[SongRecord]) -> Vec<ArtistDim> {
    let mut seen: HashSet<&str> = HashSet::new();
    let mut rows = Vec::new();
    for r in records {
        if !seen.insert(r.artist_id.as_str()) {
            continue;
        }
        rows.push(ArtistDim {
            artist_id: r.artist_id.clone(),
            name: r.artist_name.clone(),
            location: r.artist_location.clone(),
            latitude: r.artist_latitude,
            longitude: r.artist_longitude,
        });
    }
    rows
}

/// Derive time-dimension rows from playback events (already filtered to
/// NextSong). Each distinct epoch-seconds key yields exactly one row.
pub fn extract_time_dims(events: &[LogEvent]) -> Vec<TimeDim> {
    let mut seen: HashSet<i64> = HashSet::new();
    let mut rows = Vec::new();
    for e in events {
        let start_time = epoch_seconds(e.ts);
        if !seen.insert(start_time) {
            continue;
        }
        let Some(dt) = DateTime::from_timestamp_millis(e.ts) else {
            log::warn!("Timestamp out of range, skipping: {}", e.ts);
            continue;
        };
        rows.push(TimeDim {
            start_time,
            hour: dt.hour() as i32,
            day: dt.day() as i32,
            week: dt.iso_week().week() as i32,
            month: dt.month() as i32,
            year: dt.year(),
            weekday: dt.format("%A").to_string(),
        });
    }
    rows
}

/// Derive users-dimension rows from playback events. Events with an empty
/// userId are dropped. One row per distinct user; on duplicates the last
/// occurrence in input order overwrites, so the most recent `level` is what
/// reaches the loader. Output preserves first-seen order.
pub fn extract_user_dims(events: &[LogEvent]) -> Vec<UserDim> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut rows: Vec<UserDim> = Vec::new();
    for e in events {
        if e.user_id.is_empty() {
            continue;
        }
        let row = UserDim {
            user_id: e.user_id.clone(),
            first_name: e.first_name.clone(),
            last_name: e.last_name.clone(),
            gender: e.gender.clone(),
            level: e.level.clone(),
        };
        match index.get(&e.user_id) {
            Some(&i) => rows[i] = row,
            None => {
                index.insert(e.user_id.clone(), rows.len());
                rows.push(row);
            }
        }
    }
    rows
}

/// Dimension lookup needed to resolve a fact row's foreign keys.
pub trait SongLookup {
    fn find_song(&self, title: &str, artist: &str) -> crate::db::Result<Option<SongMatch>>;
}

/// Resolve one playback event into a fact row, or None when the event's
/// (song, artist) pair is absent from the loaded dimensions. A miss is a
/// best-effort join falling through, not an error.
pub fn resolve_songplay(
    event: &LogEvent,
    lookup: &impl SongLookup,
) -> crate::db::Result<Option<SongplayFact>> {
    let (Some(title), Some(artist)) = (&event.song, &event.artist) else {
        return Ok(None);
    };

    let Some(m) = lookup.find_song(title, artist)? else {
        return Ok(None);
    };

    Ok(Some(SongplayFact {
        start_time: epoch_seconds(event.ts),
        user_id: event.user_id.clone(),
        level: event.level.clone(),
        song_id: m.song_id,
        artist_id: m.artist_id,
        session_id: event.session_id,
        location: event.location.clone(),
        user_agent: event.user_agent.clone(),
    }))
}

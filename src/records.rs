use std::path::Path;

use serde::Deserialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("malformed JSON in {path} line {line}: {source}")]
    JsonLine {
        path: String,
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, LoadError>;

/// One song-metadata record, one JSON object per file.
#[derive(Debug, Clone, Deserialize)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub artist_name: String,
    pub artist_location: Option<String>,
    pub artist_latitude: Option<f64>,
    pub artist_longitude: Option<f64>,
    pub year: i32,
    /// Duration in seconds; rounded to whole seconds at extraction time.
    pub duration: f64,
}

/// One user-activity event, one JSON object per log line.
/// Log files use camelCase keys for the user/session fields.
#[derive(Debug, Clone, Deserialize)]
pub struct LogEvent {
    /// Event timestamp in epoch milliseconds.
    pub ts: i64,
    pub page: String,
    #[serde(rename = "userId", default)]
    pub user_id: String,
    #[serde(rename = "firstName")]
    pub first_name: Option<String>,
    #[serde(rename = "lastName")]
    pub last_name: Option<String>,
    pub gender: Option<String>,
    #[serde(default)]
    pub level: String,
    pub song: Option<String>,
    pub artist: Option<String>,
    /// Playback length in seconds.
    pub length: Option<f64>,
    #[serde(rename = "sessionId", default)]
    pub session_id: i64,
    pub location: Option<String>,
    #[serde(rename = "userAgent")]
    pub user_agent: Option<String>,
}

impl LogEvent {
    /// Only NextSong events describe an actual playback.
    pub fn is_next_song(&self) -> bool {
        self.page == "NextSong"
    }
}

/// Read a song-metadata file: a single JSON object.
pub fn read_song_file(path: &Path) -> Result<SongRecord> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.display().to_string(),
        source,
    })
}

/// Read an activity-log file: line-delimited JSON, blank lines skipped.
pub fn read_log_file(path: &Path) -> Result<Vec<LogEvent>> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut events = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let event: LogEvent = serde_json::from_str(line).map_err(|source| LoadError::JsonLine {
            path: path.display().to_string(),
            line: i + 1,
            source,
        })?;
        events.push(event);
    }
    Ok(events)
}

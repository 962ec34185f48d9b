/// A songs-dimension row, derived from a song-metadata record.
#[derive(Debug, Clone, PartialEq)]
pub struct SongDim {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    /// Whole seconds, rounded half away from zero.
    pub duration: i64,
}

/// An artists-dimension row, derived from a song-metadata record.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtistDim {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// A users-dimension row, derived from activity events.
/// `level` is the only field the loader updates on re-observation.
#[derive(Debug, Clone, PartialEq)]
pub struct UserDim {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: String,
}

/// A time-dimension row: calendar breakdown of one event timestamp.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeDim {
    /// Epoch seconds, the unique key.
    pub start_time: i64,
    pub hour: i32,
    pub day: i32,
    /// ISO week number.
    pub week: i32,
    pub month: i32,
    pub year: i32,
    /// Full weekday name, e.g. "Monday".
    pub weekday: String,
}

/// A songplays fact row. `songplay_id` is assigned by the database.
#[derive(Debug, Clone, PartialEq)]
pub struct SongplayFact {
    pub start_time: i64,
    pub user_id: String,
    pub level: String,
    pub song_id: String,
    pub artist_id: String,
    pub session_id: i64,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// Result of a (title, artist name) dimension lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct SongMatch {
    pub song_id: String,
    pub artist_id: String,
}

/// Per-table row counts.
#[derive(Debug, Default)]
pub struct TableStats {
    pub songs: i64,
    pub artists: i64,
    pub users: i64,
    pub time_slots: i64,
    pub songplays: i64,
}

use std::path::PathBuf;

use indicatif::{ProgressBar, ProgressStyle};
use thiserror::Error;

use crate::collector::collect_json_files;
use crate::db::{Database, DbError};
use crate::records::{self, LoadError, LogEvent};
use crate::transform;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Load(#[from] LoadError),
    #[error("Database error: {0}")]
    Db(#[from] DbError),
}

/// Input roots for one run.
pub struct EtlPaths {
    pub song_data: PathBuf,
    pub log_data: PathBuf,
}

/// Summary of one run.
pub struct EtlReport {
    pub song_files: usize,
    pub log_files: usize,
    pub songs: usize,
    pub artists: usize,
    pub users: usize,
    pub time_slots: usize,
    pub songplays: usize,
    /// Playback events whose (song, artist) pair had no dimension match.
    pub unmatched: usize,
}

/// Run the full ETL in two phases.
///
/// Phase 1 parses both corpora and loads all four dimension tables, each in
/// its own committed transaction. Phase 2 resolves facts against the
/// committed dimensions and loads songplays. Unmatched events are counted
/// and dropped; anything else that fails aborts the run.
pub fn run_etl(db: &Database, paths: &EtlPaths) -> std::result::Result<EtlReport, EtlError> {
    // Phase 1: dimensions
    let song_files = collect_json_files(&paths.song_data)?;
    log::info!(
        "Found {} song files under {}",
        song_files.len(),
        paths.song_data.display()
    );

    let mut song_records = Vec::with_capacity(song_files.len());
    for path in &song_files {
        song_records.push(records::read_song_file(path)?);
    }

    let log_files = collect_json_files(&paths.log_data)?;
    log::info!(
        "Found {} log files under {}",
        log_files.len(),
        paths.log_data.display()
    );

    let mut events: Vec<LogEvent> = Vec::new();
    for path in &log_files {
        events.extend(records::read_log_file(path)?);
    }

    // Only NextSong events describe playbacks; nothing downstream sees the rest.
    let plays: Vec<LogEvent> = events.into_iter().filter(|e| e.is_next_song()).collect();
    log::info!("{} playback events after page filter", plays.len());

    let artists = db.insert_artists(&transform::extract_artist_dims(&song_records))?;
    let songs = db.insert_songs(&transform::extract_song_dims(&song_records))?;
    let users = db.insert_users(&transform::extract_user_dims(&plays))?;
    let time_slots = db.insert_time_dims(&transform::extract_time_dims(&plays))?;
    log::info!(
        "Dimensions loaded: {artists} artists, {songs} songs, {users} users, {time_slots} time slots"
    );

    // Phase 2: facts, resolved against the dimensions committed above
    let pb = ProgressBar::new(plays.len() as u64);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({per_sec}) {msg}",
        )
        .unwrap()
        .progress_chars("#>-"),
    );
    pb.set_message("Resolving songplays...");

    let mut facts = Vec::new();
    let mut unmatched = 0;
    for event in &plays {
        match transform::resolve_songplay(event, db)? {
            Some(fact) => facts.push(fact),
            None => unmatched += 1,
        }
        pb.inc(1);
    }

    let songplays = db.insert_songplays(&facts)?;
    pb.finish_with_message(format!("{songplays} songplays, {unmatched} unmatched"));

    Ok(EtlReport {
        song_files: song_files.len(),
        log_files: log_files.len(),
        songs,
        artists,
        users,
        time_slots,
        songplays,
        unmatched,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    const SONG_A: &str = r#"{"num_songs": 1, "artist_id": "A1", "artist_latitude": 53.48, "artist_longitude": -2.24, "artist_location": "Manchester, England", "artist_name": "Oasis", "song_id": "S1", "title": "Wonder Wall", "duration": 258.6, "year": 1995}"#;
    const SONG_B: &str = r#"{"num_songs": 1, "artist_id": "A2", "artist_latitude": null, "artist_longitude": null, "artist_location": "", "artist_name": "Casual", "song_id": "S2", "title": "I Didn't Mean To", "duration": 218.93179, "year": 0}"#;

    fn log_line(page: &str, user_id: &str, level: &str, song: &str, artist: &str, ts: i64) -> String {
        format!(
            r#"{{"ts": {ts}, "page": "{page}", "userId": "{user_id}", "firstName": "Ryan", "lastName": "Smith", "gender": "M", "level": "{level}", "song": "{song}", "artist": "{artist}", "length": 259.3, "sessionId": 583, "location": "Atlanta, GA", "userAgent": "Mozilla/5.0"}}"#
        )
    }

    fn setup_corpus(name: &str) -> EtlPaths {
        let root = std::env::temp_dir().join(format!("spinlog-etl-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        let song_data = root.join("song_data/A");
        let log_data = root.join("log_data/2018/11");
        std::fs::create_dir_all(&song_data).unwrap();
        std::fs::create_dir_all(&log_data).unwrap();

        std::fs::write(song_data.join("s1.json"), SONG_A).unwrap();
        std::fs::write(song_data.join("s2.json"), SONG_B).unwrap();

        let lines = [
            // Resolves to S1/A1
            log_line("NextSong", "26", "free", "Wonder Wall", "Oasis", 1541990258796),
            // No dimension match: dropped, not an error
            log_line("NextSong", "26", "paid", "Yellow", "Coldplay", 1541990300000),
            // Not a playback: contributes to no table
            log_line("Home", "80", "free", "Wonder Wall", "Oasis", 1541990400000),
            // Empty user id: no user row, but fact still resolves
            log_line("NextSong", "", "free", "Wonder Wall", "Oasis", 1541990500000),
        ];
        std::fs::write(log_data.join("events.json"), lines.join("\n")).unwrap();

        EtlPaths {
            song_data: root.join("song_data"),
            log_data: root.join("log_data"),
        }
    }

    #[test]
    fn test_run_etl_end_to_end() {
        let paths = setup_corpus("full");
        let db = Database::open_in_memory().unwrap();
        let report = run_etl(&db, &paths).unwrap();

        assert_eq!(report.song_files, 2);
        assert_eq!(report.log_files, 1);
        assert_eq!(report.songs, 2);
        assert_eq!(report.artists, 2);
        assert_eq!(report.users, 1);
        assert_eq!(report.time_slots, 3);
        assert_eq!(report.songplays, 2);
        assert_eq!(report.unmatched, 1);

        let stats = db.stats().unwrap();
        assert_eq!(stats.songs, 2);
        assert_eq!(stats.users, 1);
        assert_eq!(stats.songplays, 2);

        // The Home event contributed nothing.
        let home_slots: i64 = db
            .conn
            .query_row(
                "SELECT COUNT(*) FROM time WHERE start_time = 1541990400",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert_eq!(home_slots, 0);

        // Resolved fact carries event fields verbatim.
        let (start_time, level, song_id): (i64, String, String) = db
            .conn
            .query_row(
                "SELECT start_time, level, song_id FROM songplays ORDER BY songplay_id LIMIT 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(start_time, 1541990258);
        assert_eq!(level, "free");
        assert_eq!(song_id, "S1");
    }

    #[test]
    fn test_rerun_updates_level_without_duplicating_dims() {
        let paths = setup_corpus("rerun");
        let db = Database::open_in_memory().unwrap();
        run_etl(&db, &paths).unwrap();

        // Same corpus again, but user 26 is now paid.
        let upgraded = log_line("NextSong", "26", "paid", "Wonder Wall", "Oasis", 1541990258796);
        std::fs::write(paths.log_data.join("2018/11/events.json"), upgraded).unwrap();
        let report = run_etl(&db, &paths).unwrap();

        // Dimension conflicts are no-ops except the level refresh.
        assert_eq!(report.songs, 0);
        assert_eq!(report.artists, 0);
        assert_eq!(report.time_slots, 0);

        let stats = db.stats().unwrap();
        assert_eq!(stats.users, 1);
        assert_eq!(stats.time_slots, 3);
        // Facts have no natural key: the rerun appends.
        assert_eq!(stats.songplays, 3);

        let level: String = db
            .conn
            .query_row("SELECT level FROM users WHERE user_id = '26'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(level, "paid");
    }

    #[test]
    fn test_missing_song_dir_aborts() {
        let db = Database::open_in_memory().unwrap();
        let paths = EtlPaths {
            song_data: Path::new("/nonexistent/song_data").to_path_buf(),
            log_data: Path::new("/nonexistent/log_data").to_path_buf(),
        };
        assert!(matches!(run_etl(&db, &paths), Err(EtlError::Io(_))));
    }

    #[test]
    fn test_malformed_log_aborts() {
        let paths = setup_corpus("badlog");
        std::fs::write(paths.log_data.join("2018/11/events.json"), "{ nope").unwrap();
        let db = Database::open_in_memory().unwrap();
        assert!(matches!(run_etl(&db, &paths), Err(EtlError::Load(_))));
    }
}

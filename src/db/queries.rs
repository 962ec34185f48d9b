use super::models::{ArtistDim, SongDim, SongMatch, SongplayFact, TableStats, TimeDim, UserDim};
use super::{Database, Result};
use crate::transform::SongLookup;
use rusqlite::params;

impl Database {
    /// Insert songs-dimension rows in one transaction.
    /// Key conflicts are ignored — the first write wins.
    /// Returns the number of rows actually written.
    pub fn insert_songs(&self, rows: &[SongDim]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO songs (song_id, title, artist_id, year, duration)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(song_id) DO NOTHING",
            )?;
            for r in rows {
                written += stmt.execute(params![r.song_id, r.title, r.artist_id, r.year, r.duration])?;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    /// Insert artists-dimension rows; first write wins on conflict.
    pub fn insert_artists(&self, rows: &[ArtistDim]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO artists (artist_id, name, location, latitude, longitude)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(artist_id) DO NOTHING",
            )?;
            for r in rows {
                written += stmt.execute(params![r.artist_id, r.name, r.location, r.latitude, r.longitude])?;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    /// Upsert users-dimension rows. On an existing user only `level` is
    /// refreshed; the other fields keep their first-inserted values.
    pub fn insert_users(&self, rows: &[UserDim]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO users (user_id, first_name, last_name, gender, level)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(user_id) DO UPDATE SET level = excluded.level",
            )?;
            for r in rows {
                written += stmt.execute(params![r.user_id, r.first_name, r.last_name, r.gender, r.level])?;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    /// Insert time-dimension rows; first write wins on conflict.
    pub fn insert_time_dims(&self, rows: &[TimeDim]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO time (start_time, hour, day, week, month, year, weekday)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                 ON CONFLICT(start_time) DO NOTHING",
            )?;
            for r in rows {
                written += stmt.execute(params![
                    r.start_time,
                    r.hour,
                    r.day,
                    r.week,
                    r.month,
                    r.year,
                    r.weekday,
                ])?;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    /// Insert fact rows. songplay_id is auto-assigned; there is no natural
    /// key, so repeated loads produce duplicate rows by design of the schema.
    pub fn insert_songplays(&self, rows: &[SongplayFact]) -> Result<usize> {
        let tx = self.conn.unchecked_transaction()?;
        let mut written = 0;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO songplays (
                    start_time, user_id, level, song_id, artist_id,
                    session_id, location, user_agent
                 ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for r in rows {
                written += stmt.execute(params![
                    r.start_time,
                    r.user_id,
                    r.level,
                    r.song_id,
                    r.artist_id,
                    r.session_id,
                    r.location,
                    r.user_agent,
                ])?;
            }
        }
        tx.commit()?;
        Ok(written)
    }

    /// Look up the (song_id, artist_id) pair for a song title and artist name.
    pub fn find_song(&self, title: &str, artist: &str) -> Result<Option<SongMatch>> {
        let result = self.conn.query_row(
            "SELECT songs.song_id, artists.artist_id
             FROM songs JOIN artists ON songs.artist_id = artists.artist_id
             WHERE songs.title = ?1 AND artists.name = ?2",
            params![title, artist],
            |row| {
                Ok(SongMatch {
                    song_id: row.get(0)?,
                    artist_id: row.get(1)?,
                })
            },
        );

        match result {
            Ok(m) => Ok(Some(m)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Row counts for all five tables.
    pub fn stats(&self) -> Result<TableStats> {
        let count = |table: &str| -> Result<i64> {
            let sql = format!("SELECT COUNT(*) FROM {table}");
            Ok(self.conn.query_row(&sql, [], |row| row.get(0))?)
        };

        Ok(TableStats {
            songs: count("songs")?,
            artists: count("artists")?,
            users: count("users")?,
            time_slots: count("time")?,
            songplays: count("songplays")?,
        })
    }
}

impl SongLookup for Database {
    fn find_song(&self, title: &str, artist: &str) -> Result<Option<SongMatch>> {
        Database::find_song(self, title, artist)
    }
}

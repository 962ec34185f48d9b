pub mod models;
pub mod queries;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, DbError>;

pub struct Database {
    pub conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).ok();
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        // WAL mode for better concurrent read performance
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "synchronous", "NORMAL")?;
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        self.create_tables()?;
        Ok(())
    }

    /// Create the star schema. Idempotent.
    pub fn create_tables(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS songs (
                song_id     TEXT PRIMARY KEY,
                title       TEXT NOT NULL,
                artist_id   TEXT NOT NULL,
                year        INTEGER,
                duration    INTEGER
            );

            CREATE TABLE IF NOT EXISTS artists (
                artist_id   TEXT PRIMARY KEY,
                name        TEXT NOT NULL,
                location    TEXT,
                latitude    REAL,
                longitude   REAL
            );

            CREATE TABLE IF NOT EXISTS users (
                user_id     TEXT PRIMARY KEY,
                first_name  TEXT,
                last_name   TEXT,
                gender      TEXT,
                level       TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS time (
                start_time  INTEGER PRIMARY KEY,
                hour        INTEGER NOT NULL,
                day         INTEGER NOT NULL,
                week        INTEGER NOT NULL,
                month       INTEGER NOT NULL,
                year        INTEGER NOT NULL,
                weekday     TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS songplays (
                songplay_id INTEGER PRIMARY KEY AUTOINCREMENT,
                start_time  INTEGER NOT NULL,
                user_id     TEXT NOT NULL,
                level       TEXT,
                song_id     TEXT NOT NULL REFERENCES songs(song_id),
                artist_id   TEXT NOT NULL REFERENCES artists(artist_id),
                session_id  INTEGER,
                location    TEXT,
                user_agent  TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_songs_title ON songs(title);
            CREATE INDEX IF NOT EXISTS idx_artists_name ON artists(name);
            CREATE INDEX IF NOT EXISTS idx_songplays_start ON songplays(start_time);
            ",
        )?;
        Ok(())
    }

    /// Drop all five tables and recreate them empty.
    pub fn reset(&self) -> Result<()> {
        self.conn.execute_batch(
            "
            DROP TABLE IF EXISTS songplays;
            DROP TABLE IF EXISTS users;
            DROP TABLE IF EXISTS songs;
            DROP TABLE IF EXISTS artists;
            DROP TABLE IF EXISTS time;
            ",
        )?;
        self.create_tables()
    }
}

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

use crate::error::ReelboxError;
use crate::models::PlayRecord;

const SCHEMA_V1: &str = include_str!("../../../migrations/001_play_records.sql");

/// SQLite-backed play history, keyed by `"<source>+<id>"`.
pub struct PlayRecordStore {
    conn: Connection,
}

impl PlayRecordStore {
    /// Open (or create) the database at the given path and run migrations.
    pub fn open(path: &Path) -> Result<Self, ReelboxError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, ReelboxError> {
        let conn = Connection::open_in_memory()?;
        run_migrations(&conn)?;
        Ok(Self { conn })
    }

    /// Insert or overwrite the record stored under `key`.
    pub fn save(&self, key: &str, record: &PlayRecord) -> Result<(), ReelboxError> {
        self.conn.execute(
            "INSERT INTO play_records (record_key, title, source_name, cover, episode_index,
             total_episodes, play_time, total_time, save_time)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(record_key) DO UPDATE SET
                title = excluded.title,
                source_name = excluded.source_name,
                cover = excluded.cover,
                episode_index = excluded.episode_index,
                total_episodes = excluded.total_episodes,
                play_time = excluded.play_time,
                total_time = excluded.total_time,
                save_time = excluded.save_time",
            params![
                key,
                record.title,
                record.source_name,
                record.cover,
                record.index,
                record.total_episodes,
                record.play_time as i64,
                record.total_time as i64,
                record.save_time.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Result<Option<PlayRecord>, ReelboxError> {
        self.conn
            .query_row(
                "SELECT record_key, title, source_name, cover, episode_index, total_episodes,
                 play_time, total_time, save_time
                 FROM play_records WHERE record_key = ?1",
                params![key],
                |row| row_to_record(row).map(|(_, r)| r),
            )
            .optional()
            .map_err(Into::into)
    }

    /// All records by key.
    pub fn get_all(&self) -> Result<HashMap<String, PlayRecord>, ReelboxError> {
        let mut stmt = self.conn.prepare(
            "SELECT record_key, title, source_name, cover, episode_index, total_episodes,
             play_time, total_time, save_time
             FROM play_records",
        )?;
        let rows = stmt.query_map([], row_to_record)?;
        let mut records = HashMap::new();
        for row in rows {
            let (key, record) = row?;
            records.insert(key, record);
        }
        Ok(records)
    }

    pub fn remove(&self, key: &str) -> Result<(), ReelboxError> {
        self.conn
            .execute("DELETE FROM play_records WHERE record_key = ?1", params![key])?;
        Ok(())
    }

    pub fn clear(&self) -> Result<(), ReelboxError> {
        self.conn.execute("DELETE FROM play_records", [])?;
        Ok(())
    }
}

fn run_migrations(conn: &Connection) -> Result<(), ReelboxError> {
    let version: i32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .unwrap_or(0);

    if version < 1 {
        conn.execute_batch(SCHEMA_V1)?;
        conn.pragma_update(None, "user_version", 1)?;
    }
    Ok(())
}

// ── Helpers ─────────────────────────────────────────────────────

fn row_to_record(row: &rusqlite::Row<'_>) -> rusqlite::Result<(String, PlayRecord)> {
    let save_time: String = row.get(8)?;
    Ok((
        row.get(0)?,
        PlayRecord {
            title: row.get(1)?,
            source_name: row.get(2)?,
            cover: row.get(3)?,
            index: row.get(4)?,
            total_episodes: row.get(5)?,
            play_time: row.get::<_, i64>(6)?.max(0) as u64,
            total_time: row.get::<_, i64>(7)?.max(0) as u64,
            save_time: parse_datetime(&save_time),
        },
    ))
}

/// Parse an RFC 3339 timestamp, falling back to the Unix epoch on garbage.
fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_default()
}

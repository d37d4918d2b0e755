use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use crate::app_dirs::AppDirs;
use crate::config::{Difficulty, Mode};
use crate::keystroke::Keystroke;

/// Value object handed to the persistence collaborator when a session
/// finishes. The engine produces it; everything after that is our problem.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub text_id: String,
    pub category: String,
    pub difficulty: Difficulty,
    pub mode: Mode,
    pub wpm: u32,
    pub raw_wpm: u32,
    pub accuracy: u32,
    pub consistency: u32,
    pub char_count: usize,
    pub error_count: usize,
    pub duration_ms: u64,
    pub started_at: DateTime<Local>,
    pub finished_at: DateTime<Local>,
    pub keystrokes: Vec<Keystroke>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SessionSummary {
    pub id: i64,
    pub mode: Mode,
    pub category: String,
    pub wpm: u32,
    pub accuracy: u32,
    pub consistency: u32,
    pub finished_at: DateTime<Local>,
}

/// The persistence collaborator's contract. Callers fire and forget: a
/// failed save never rolls back or invalidates in-memory results.
pub trait SessionStore {
    fn save(&mut self, record: &SessionRecord) -> io::Result<i64>;
    fn personal_best(&self, mode: &Mode) -> io::Result<Option<SessionSummary>>;
    fn recent(&self, limit: usize) -> io::Result<Vec<SessionSummary>>;
}

/// Sqlite-backed session history.
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the store under the user's state directory.
    pub fn open_default() -> rusqlite::Result<Self> {
        let path = Self::default_path().unwrap_or_else(|| PathBuf::from("velo_sessions.db"));
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {e}")),
                )
            })?;
        }
        Self::open(path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> rusqlite::Result<Self> {
        let conn = Connection::open(path)?;
        Self::init(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> rusqlite::Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init(&conn)?;
        Ok(Self { conn })
    }

    fn default_path() -> Option<PathBuf> {
        AppDirs::db_path()
    }

    fn init(conn: &Connection) -> rusqlite::Result<()> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS sessions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                text_id TEXT NOT NULL,
                category TEXT NOT NULL,
                difficulty TEXT NOT NULL,
                mode TEXT NOT NULL,
                wpm INTEGER NOT NULL,
                raw_wpm INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                consistency INTEGER NOT NULL,
                char_count INTEGER NOT NULL,
                error_count INTEGER NOT NULL,
                duration_ms INTEGER NOT NULL,
                started_at TEXT NOT NULL,
                finished_at TEXT NOT NULL,
                keystrokes TEXT NOT NULL
            )
            "#,
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_mode ON sessions(mode)",
            [],
        )?;
        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_sessions_finished_at ON sessions(finished_at)",
            [],
        )?;
        Ok(())
    }

    /// Reload the full keystroke log of a stored session, for replay views.
    pub fn keystrokes(&self, id: i64) -> rusqlite::Result<Vec<Keystroke>> {
        let raw: String = self.conn.query_row(
            "SELECT keystrokes FROM sessions WHERE id = ?1",
            [id],
            |row| row.get(0),
        )?;
        serde_json::from_str(&raw).map_err(|_| {
            rusqlite::Error::InvalidColumnType(0, "keystrokes".to_string(), rusqlite::types::Type::Text)
        })
    }

    /// Dump the session history to CSV, newest first. Returns the row count.
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> io::Result<usize> {
        let mut stmt = self
            .conn
            .prepare(
                r#"
                SELECT finished_at, mode, category, difficulty, wpm, raw_wpm,
                       accuracy, consistency, char_count, error_count, duration_ms
                FROM sessions
                ORDER BY finished_at DESC
                "#,
            )
            .map_err(io::Error::other)?;

        let mut writer = csv::Writer::from_path(path).map_err(io::Error::other)?;
        writer
            .write_record([
                "finished_at",
                "mode",
                "category",
                "difficulty",
                "wpm",
                "raw_wpm",
                "accuracy",
                "consistency",
                "chars",
                "errors",
                "duration_ms",
            ])
            .map_err(io::Error::other)?;

        let mut rows = stmt.query([]).map_err(io::Error::other)?;
        let mut count = 0usize;
        while let Some(row) = rows.next().map_err(io::Error::other)? {
            let fields: [String; 11] = [
                row.get::<_, String>(0).map_err(io::Error::other)?,
                row.get::<_, String>(1).map_err(io::Error::other)?,
                row.get::<_, String>(2).map_err(io::Error::other)?,
                row.get::<_, String>(3).map_err(io::Error::other)?,
                row.get::<_, i64>(4).map_err(io::Error::other)?.to_string(),
                row.get::<_, i64>(5).map_err(io::Error::other)?.to_string(),
                row.get::<_, i64>(6).map_err(io::Error::other)?.to_string(),
                row.get::<_, i64>(7).map_err(io::Error::other)?.to_string(),
                row.get::<_, i64>(8).map_err(io::Error::other)?.to_string(),
                row.get::<_, i64>(9).map_err(io::Error::other)?.to_string(),
                row.get::<_, i64>(10).map_err(io::Error::other)?.to_string(),
            ];
            writer.write_record(&fields).map_err(io::Error::other)?;
            count += 1;
        }
        writer.flush()?;
        Ok(count)
    }

    fn summary_query(&self, sql: &str, args: &[&dyn rusqlite::ToSql]) -> rusqlite::Result<Vec<SessionSummary>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(args, |row| {
            let mode_str: String = row.get(1)?;
            let mode = Mode::from_str(&mode_str).map_err(|_| {
                rusqlite::Error::InvalidColumnType(1, "mode".to_string(), rusqlite::types::Type::Text)
            })?;
            let finished_str: String = row.get(6)?;
            let finished_at = DateTime::parse_from_rfc3339(&finished_str)
                .map_err(|_| {
                    rusqlite::Error::InvalidColumnType(
                        6,
                        "finished_at".to_string(),
                        rusqlite::types::Type::Text,
                    )
                })?
                .with_timezone(&Local);
            Ok(SessionSummary {
                id: row.get(0)?,
                mode,
                category: row.get(2)?,
                wpm: row.get(3)?,
                accuracy: row.get(4)?,
                consistency: row.get(5)?,
                finished_at,
            })
        })?;
        rows.collect()
    }
}

const SUMMARY_COLS: &str = "id, mode, category, wpm, accuracy, consistency, finished_at";

impl SessionStore for SqliteStore {
    fn save(&mut self, record: &SessionRecord) -> io::Result<i64> {
        let keystrokes = serde_json::to_string(&record.keystrokes)?;
        self.conn
            .execute(
                r#"
                INSERT INTO sessions
                (text_id, category, difficulty, mode, wpm, raw_wpm, accuracy,
                 consistency, char_count, error_count, duration_ms,
                 started_at, finished_at, keystrokes)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
                "#,
                params![
                    record.text_id,
                    record.category,
                    record.difficulty.to_string(),
                    record.mode.to_string(),
                    record.wpm,
                    record.raw_wpm,
                    record.accuracy,
                    record.consistency,
                    record.char_count as i64,
                    record.error_count as i64,
                    record.duration_ms as i64,
                    record.started_at.to_rfc3339(),
                    record.finished_at.to_rfc3339(),
                    keystrokes,
                ],
            )
            .map_err(io::Error::other)?;
        Ok(self.conn.last_insert_rowid())
    }

    fn personal_best(&self, mode: &Mode) -> io::Result<Option<SessionSummary>> {
        let sql = format!(
            "SELECT {SUMMARY_COLS} FROM sessions WHERE mode = ?1 \
             ORDER BY wpm DESC, finished_at ASC LIMIT 1"
        );
        let mut results = self
            .summary_query(&sql, &[&mode.to_string()])
            .map_err(io::Error::other)?;
        Ok(results.pop())
    }

    fn recent(&self, limit: usize) -> io::Result<Vec<SessionSummary>> {
        let sql = format!(
            "SELECT {SUMMARY_COLS} FROM sessions ORDER BY finished_at DESC, id DESC LIMIT ?1"
        );
        self.summary_query(&sql, &[&(limit as i64)])
            .map_err(io::Error::other)
    }
}

/// In-memory store for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub records: Vec<SessionRecord>,
}

impl MemoryStore {
    fn summary(&self, idx: usize) -> SessionSummary {
        let r = &self.records[idx];
        SessionSummary {
            id: idx as i64 + 1,
            mode: r.mode,
            category: r.category.clone(),
            wpm: r.wpm,
            accuracy: r.accuracy,
            consistency: r.consistency,
            finished_at: r.finished_at,
        }
    }
}

impl SessionStore for MemoryStore {
    fn save(&mut self, record: &SessionRecord) -> io::Result<i64> {
        self.records.push(record.clone());
        Ok(self.records.len() as i64)
    }

    fn personal_best(&self, mode: &Mode) -> io::Result<Option<SessionSummary>> {
        Ok((0..self.records.len())
            .filter(|&i| self.records[i].mode == *mode)
            .map(|i| self.summary(i))
            .max_by_key(|s| s.wpm))
    }

    fn recent(&self, limit: usize) -> io::Result<Vec<SessionSummary>> {
        Ok((0..self.records.len())
            .rev()
            .take(limit)
            .map(|i| self.summary(i))
            .collect())
    }
}

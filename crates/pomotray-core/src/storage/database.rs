//! SQLite-based session storage and statistics.
//!
//! Provides persistent storage for:
//! - Completed intervals (one row per finished countdown)
//! - Period statistics (today, week, month, year, all time)

use std::path::Path;

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};

use super::data_dir;
use crate::effects::SessionSink;
use crate::error::{DatabaseError, ValidationError};
use crate::timer::TimerMode;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: i64,
    pub mode: TimerMode,
    pub duration_seconds: u64,
    pub completed_at: DateTime<Utc>,
    pub completed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stats {
    pub total_sessions: u64,
    /// Completed work intervals.
    pub work_sessions: u64,
    /// Minutes across every recorded interval, breaks included.
    pub total_minutes: u64,
    pub hours: u64,
    pub minutes: u64,
}

/// Look-back window for statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    /// Since UTC midnight.
    Today,
    /// Last 7 days.
    Week,
    /// Last 30 days.
    Month,
    /// Last 365 days.
    Year,
    All,
}

impl Period {
    /// Lower bound of the window relative to `now`, `None` for all time.
    pub fn since(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Period::Today => now
                .date_naive()
                .and_hms_opt(0, 0, 0)
                .map(|midnight| midnight.and_utc()),
            Period::Week => Some(now - Duration::days(7)),
            Period::Month => Some(now - Duration::days(30)),
            Period::Year => Some(now - Duration::days(365)),
            Period::All => None,
        }
    }
}

impl std::str::FromStr for Period {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(Period::Today),
            "week" => Ok(Period::Week),
            "month" => Ok(Period::Month),
            "year" => Ok(Period::Year),
            "all" => Ok(Period::All),
            other => Err(ValidationError::InvalidValue {
                field: "period".into(),
                message: format!("expected today|week|month|year|all, got '{other}'"),
            }),
        }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// SQLite database for session storage.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `<data_dir>/pomotray.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> crate::error::Result<Self> {
        let path = data_dir()?.join("pomotray.db");
        Ok(Self::open_at(&path)?)
    }

    pub fn open_at(path: &Path) -> Result<Self, DatabaseError> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database.
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), rusqlite::Error> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id               INTEGER PRIMARY KEY AUTOINCREMENT,
                mode             TEXT NOT NULL,
                duration_seconds INTEGER NOT NULL,
                completed_at     TEXT NOT NULL,
                completed        INTEGER NOT NULL DEFAULT 1
            );

            CREATE INDEX IF NOT EXISTS idx_sessions_completed_at ON sessions(completed_at);
            CREATE INDEX IF NOT EXISTS idx_sessions_mode ON sessions(mode);",
        )?;
        Ok(())
    }

    /// Record an interval. Returns the new row id.
    pub fn record_session(
        &self,
        mode: TimerMode,
        duration_seconds: u64,
        completed_at: DateTime<Utc>,
        completed: bool,
    ) -> Result<i64, DatabaseError> {
        self.conn.execute(
            "INSERT INTO sessions (mode, duration_seconds, completed_at, completed)
             VALUES (?1, ?2, ?3, ?4)",
            params![mode.as_str(), duration_seconds, timestamp(completed_at), completed],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Sessions completed at or after `since`, oldest first.
    pub fn sessions_since(
        &self,
        since: Option<DateTime<Utc>>,
    ) -> Result<Vec<SessionRecord>, DatabaseError> {
        let lower = since.map(timestamp).unwrap_or_default();
        let mut stmt = self.conn.prepare(
            "SELECT id, mode, duration_seconds, completed_at, completed
             FROM sessions
             WHERE completed_at >= ?1
             ORDER BY completed_at, id",
        )?;
        let rows = stmt.query_map(params![lower], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u64>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, bool>(4)?,
            ))
        })?;

        let mut sessions = Vec::new();
        for row in rows {
            let (id, mode, duration_seconds, completed_at, completed) = row?;
            let mode = mode
                .parse::<TimerMode>()
                .map_err(DatabaseError::QueryFailed)?;
            let completed_at = DateTime::parse_from_rfc3339(&completed_at)
                .map_err(|e| DatabaseError::QueryFailed(format!("bad completed_at: {e}")))?
                .with_timezone(&Utc);
            sessions.push(SessionRecord {
                id,
                mode,
                duration_seconds,
                completed_at,
                completed,
            });
        }
        Ok(sessions)
    }

    /// Aggregate statistics for `period`, measured back from `now`.
    pub fn stats(&self, period: Period, now: DateTime<Utc>) -> Result<Stats, DatabaseError> {
        let lower = period.since(now).map(timestamp).unwrap_or_default();
        let (total_sessions, work_sessions, total_seconds) = self.conn.query_row(
            "SELECT COUNT(*),
                    COALESCE(SUM(CASE WHEN mode = 'work' AND completed = 1 THEN 1 ELSE 0 END), 0),
                    COALESCE(SUM(duration_seconds), 0)
             FROM sessions
             WHERE completed_at >= ?1",
            params![lower],
            |row| {
                Ok((
                    row.get::<_, u64>(0)?,
                    row.get::<_, u64>(1)?,
                    row.get::<_, u64>(2)?,
                ))
            },
        )?;

        let total_minutes = total_seconds / 60;
        Ok(Stats {
            total_sessions,
            work_sessions,
            total_minutes,
            hours: total_minutes / 60,
            minutes: total_minutes % 60,
        })
    }

    pub fn stats_all(&self) -> Result<Stats, DatabaseError> {
        self.stats(Period::All, Utc::now())
    }
}

impl SessionSink for Database {
    fn save_session(
        &mut self,
        mode: TimerMode,
        duration_seconds: u64,
        completed_at: DateTime<Utc>,
    ) -> crate::error::Result<()> {
        self.record_session(mode, duration_seconds, completed_at, true)?;
        Ok(())
    }
}

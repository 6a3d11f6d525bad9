//! SQLite-based persistence for session event logs.
//!
//! The store writes a session's full ordered event array on every save and
//! hands it back verbatim for `SessionEngine::restore`; it never interprets
//! transitions. Event rows keep the `{type, timestamp, data}` wire parts so
//! a stored log round-trips exactly.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use super::data_dir;
use crate::error::DatabaseError;
use crate::problem::Problem;
use crate::session::{EventPayload, Preset, SessionEvent, SessionStatus};

/// One stored session row, without its events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: String,
    pub problem: Problem,
    pub preset: Preset,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// SQLite database for session event logs.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open the database at `~/.config/drillroom/drillroom.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    pub fn open() -> Result<Self, DatabaseError> {
        let path = data_dir()
            .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?
            .join("drillroom.db");
        Self::open_at(path)
    }

    /// Open at an explicit path (tests, exports).
    pub fn open_at(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(path),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self, DatabaseError> {
        let conn = Connection::open_in_memory().map_err(|source| DatabaseError::OpenFailed {
            path: PathBuf::from(":memory:"),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<(), DatabaseError> {
        self.conn
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS schema_version (
                    version INTEGER PRIMARY KEY
                );

                CREATE TABLE IF NOT EXISTS sessions (
                    id         TEXT PRIMARY KEY,
                    problem    TEXT NOT NULL,
                    preset     TEXT NOT NULL,
                    status     TEXT NOT NULL,
                    created_at TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS events (
                    session_id TEXT NOT NULL REFERENCES sessions(id) ON DELETE CASCADE,
                    seq        INTEGER NOT NULL,
                    type       TEXT NOT NULL,
                    timestamp  INTEGER NOT NULL,
                    data       TEXT NOT NULL,
                    PRIMARY KEY (session_id, seq)
                );

                CREATE INDEX IF NOT EXISTS idx_sessions_status ON sessions(status);
                CREATE INDEX IF NOT EXISTS idx_sessions_updated_at ON sessions(updated_at);",
            )
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;

        if self.schema_version()? < 1 {
            self.conn
                .execute("INSERT INTO schema_version (version) VALUES (1)", [])
                .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        }
        Ok(())
    }

    fn schema_version(&self) -> Result<i32, DatabaseError> {
        let version = self
            .conn
            .query_row("SELECT version FROM schema_version", [], |row| {
                row.get::<_, i32>(0)
            })
            .optional()?;
        Ok(version.unwrap_or(0))
    }

    /// Insert or refresh a session row and rewrite its full event array.
    pub fn save_session(
        &mut self,
        id: &str,
        problem: &Problem,
        preset: Preset,
        status: SessionStatus,
        events: &[SessionEvent],
    ) -> Result<(), DatabaseError> {
        let problem_json =
            serde_json::to_string(problem).map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO sessions (id, problem, preset, status, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?5)
             ON CONFLICT(id) DO UPDATE SET status = ?4, updated_at = ?5",
            params![id, problem_json, preset.as_str(), status.as_str(), now],
        )?;
        tx.execute("DELETE FROM events WHERE session_id = ?1", params![id])?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO events (session_id, seq, type, timestamp, data)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (seq, event) in events.iter().enumerate() {
                let data = event_data_json(&event.payload)
                    .map_err(|e| DatabaseError::QueryFailed(e.to_string()))?;
                stmt.execute(params![
                    id,
                    seq as i64,
                    event.payload.kind().as_str(),
                    event.timestamp,
                    data,
                ])?;
            }
        }
        tx.commit()?;
        tracing::debug!(session = id, events = events.len(), "saved session log");
        Ok(())
    }

    /// Load a session's full ordered event array.
    pub fn load_events(&self, session_id: &str) -> Result<Vec<SessionEvent>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT type, timestamp, data FROM events WHERE session_id = ?1 ORDER BY seq",
        )?;
        let rows = stmt.query_map(params![session_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?;

        let mut events = Vec::new();
        for row in rows {
            let (type_str, timestamp, data) = row?;
            let payload = decode_payload(&type_str, &data).map_err(|message| {
                DatabaseError::CorruptRecord {
                    id: session_id.to_string(),
                    message,
                }
            })?;
            events.push(SessionEvent { timestamp, payload });
        }
        Ok(events)
    }

    /// The most recently touched in-progress session, if any.
    pub fn active_session(&self) -> Result<Option<SessionRecord>, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, problem, preset, status, created_at, updated_at
                 FROM sessions WHERE status = 'in_progress'
                 ORDER BY updated_at DESC LIMIT 1",
                [],
                record_columns,
            )
            .optional()?;
        row.map(decode_record).transpose()
    }

    /// Fetch one session row by id.
    pub fn get_session(&self, id: &str) -> Result<SessionRecord, DatabaseError> {
        let row = self
            .conn
            .query_row(
                "SELECT id, problem, preset, status, created_at, updated_at
                 FROM sessions WHERE id = ?1",
                params![id],
                record_columns,
            )
            .optional()?;
        match row {
            Some(raw) => decode_record(raw),
            None => Err(DatabaseError::UnknownSession(id.to_string())),
        }
    }

    /// All stored sessions, most recently touched first.
    pub fn list_sessions(&self) -> Result<Vec<SessionRecord>, DatabaseError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, problem, preset, status, created_at, updated_at
             FROM sessions ORDER BY updated_at DESC",
        )?;
        let rows = stmt.query_map([], record_columns)?;
        let mut records = Vec::new();
        for row in rows {
            records.push(decode_record(row?)?);
        }
        Ok(records)
    }
}

type RawRecord = (String, String, String, String, String, String);

fn record_columns(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok((
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn decode_record(raw: RawRecord) -> Result<SessionRecord, DatabaseError> {
    let (id, problem_json, preset_str, status_str, created_at, updated_at) = raw;
    let corrupt = |message: String| DatabaseError::CorruptRecord {
        id: id.clone(),
        message,
    };
    let problem: Problem =
        serde_json::from_str(&problem_json).map_err(|e| corrupt(e.to_string()))?;
    let preset: Preset = preset_str
        .parse()
        .map_err(|_| corrupt(format!("unknown preset '{preset_str}'")))?;
    let status = SessionStatus::parse(&status_str)
        .ok_or_else(|| corrupt(format!("unknown status '{status_str}'")))?;
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map_err(|e| corrupt(e.to_string()))?
        .with_timezone(&Utc);
    let updated_at = DateTime::parse_from_rfc3339(&updated_at)
        .map_err(|e| corrupt(e.to_string()))?
        .with_timezone(&Utc);
    Ok(SessionRecord {
        id,
        problem,
        preset,
        status,
        created_at,
        updated_at,
    })
}

/// Extract the `data` half of the wire shape for one payload.
fn event_data_json(payload: &EventPayload) -> Result<String, serde_json::Error> {
    let value = serde_json::to_value(payload)?;
    let data = value
        .get("data")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));
    serde_json::to_string(&data)
}

fn decode_payload(type_str: &str, data: &str) -> Result<EventPayload, String> {
    let data_value: serde_json::Value =
        serde_json::from_str(data).map_err(|e| e.to_string())?;
    serde_json::from_value(serde_json::json!({ "type": type_str, "data": data_value }))
        .map_err(|e| e.to_string())
}

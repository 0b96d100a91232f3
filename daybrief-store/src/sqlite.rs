//! Embedded SQLite backend.
//!
//! Every write goes through [`SqliteStore::with_retry`]: transient errors
//! (busy, locked, I/O) back off exponentially; structural errors fail fast.
//! Exhausting the retry budget emits one audit event before the original
//! error propagates.

use chrono::{DateTime, NaiveDate, Utc};
use daybrief_core::{Energy, RetryPolicy, Task};
use rusqlite::{params, Connection, OptionalExtension};
use tracing::{error, warn};

use crate::error::StoreError;
use crate::models::{EventRecord, ScoreRecord, SurfacedStatus, SurfacedTask};
use crate::BriefStore;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS task_scores (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    task_id TEXT NOT NULL UNIQUE,
    impact INTEGER NOT NULL,
    urgency INTEGER NOT NULL,
    energy TEXT NOT NULL,
    total_score INTEGER NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS weekly_outcomes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    week_start TEXT NOT NULL,
    outcomes TEXT NOT NULL,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    UNIQUE(user_id, week_start)
);

CREATE TABLE IF NOT EXISTS surfaced_tasks (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    task_id TEXT NOT NULL,
    task_content TEXT NOT NULL,
    surfaced_at TEXT NOT NULL,
    surfaced_on TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'surfaced',
    UNIQUE(user_id, task_id, surfaced_on)
);

CREATE TABLE IF NOT EXISTS events (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    timestamp TEXT NOT NULL,
    severity TEXT NOT NULL,
    action TEXT NOT NULL,
    payload TEXT,
    user_id TEXT
);

CREATE INDEX IF NOT EXISTS idx_surfaced_user_day ON surfaced_tasks(user_id, surfaced_on);
CREATE INDEX IF NOT EXISTS idx_events_action ON events(action);
"#;

/// Embedded-file store. Not a singleton: construct one and pass it to the
/// components that need it.
pub struct SqliteStore {
    conn: Connection,
    policy: RetryPolicy,
}

impl SqliteStore {
    /// Open (or create) the database at `path`.
    pub fn open(path: &std::path::Path, policy: RetryPolicy) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, policy })
    }

    /// In-memory store for tests.
    pub fn open_in_memory(policy: RetryPolicy) -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn, policy })
    }

    /// Run `op` with the retry discipline.
    ///
    /// Only transient errors are retried; on exhaustion one audit event is
    /// written (best-effort) and the last error comes back.
    pub(crate) fn with_retry<T>(
        &self,
        op_name: &str,
        op: impl Fn(&Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut attempt = 0;
        loop {
            match op(&self.conn) {
                Ok(v) => return Ok(v),
                Err(err) if err.is_transient() => {
                    if let Some(delay) = self.policy.delay_after(attempt) {
                        warn!(
                            op = op_name,
                            attempt = attempt + 1,
                            max = self.policy.max_attempts,
                            %err,
                            "transient store error, retrying"
                        );
                        std::thread::sleep(delay);
                        attempt += 1;
                        continue;
                    }

                    error!(op = op_name, attempts = self.policy.max_attempts, %err,
                        "store retry budget exhausted");
                    self.audit_exhaustion(op_name, &err);
                    return Err(err);
                }
                Err(err) => {
                    error!(op = op_name, %err, "non-retryable store error");
                    return Err(err);
                }
            }
        }
    }

    /// One audit row per exhaustion. The events insert itself is
    /// best-effort: if the database is still down there is nothing left to
    /// do but log.
    fn audit_exhaustion(&self, op_name: &str, err: &StoreError) {
        let payload = serde_json::json!({
            "operation": op_name,
            "error": err.to_string(),
            "attempts": self.policy.max_attempts,
            "kind": err.kind(),
        });
        let result = self.conn.execute(
            "INSERT INTO events (timestamp, severity, action, payload, user_id)
             VALUES (?1, 'error', 'store_retry_exhausted', ?2, NULL)",
            params![Utc::now().to_rfc3339(), payload.to_string()],
        );
        if let Err(audit_err) = result {
            error!(%audit_err, "failed to record retry exhaustion event");
        }
    }
}

fn parse_utc(s: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Corrupt(format!("bad timestamp '{s}': {e}")))
}

fn parse_date(s: &str) -> Result<NaiveDate, StoreError> {
    s.parse()
        .map_err(|e| StoreError::Corrupt(format!("bad date '{s}': {e}")))
}

impl BriefStore for SqliteStore {
    fn save_score(&self, record: &ScoreRecord) -> Result<(), StoreError> {
        self.with_retry("save_score", |conn| {
            conn.execute(
                "INSERT OR REPLACE INTO task_scores
                 (task_id, impact, urgency, energy, total_score, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    record.task_id,
                    record.impact,
                    record.urgency,
                    record.energy.as_str(),
                    record.total_score,
                    record.created_at.to_rfc3339(),
                ],
            )?;
            Ok(())
        })
    }

    fn get_score(&self, task_id: &str) -> Result<Option<ScoreRecord>, StoreError> {
        self.with_retry("get_score", |conn| {
            conn.query_row(
                "SELECT task_id, impact, urgency, energy, total_score, created_at
                 FROM task_scores WHERE task_id = ?1",
                params![task_id],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u8>(1)?,
                        row.get::<_, u8>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, i32>(4)?,
                        row.get::<_, String>(5)?,
                    ))
                },
            )
            .optional()?
            .map(|(task_id, impact, urgency, energy, total_score, created_at)| {
                let energy = Energy::parse(&energy)
                    .ok_or_else(|| StoreError::Corrupt(format!("bad energy '{energy}'")))?;
                Ok(ScoreRecord {
                    task_id,
                    impact,
                    urgency,
                    energy,
                    total_score,
                    created_at: parse_utc(&created_at)?,
                })
            })
            .transpose()
        })
    }

    fn set_outcomes(
        &self,
        user_id: &str,
        week_start: NaiveDate,
        outcomes: &[String],
    ) -> Result<(), StoreError> {
        // Up to 3 non-empty outcome statements per week.
        let outcomes: Vec<&String> = outcomes
            .iter()
            .filter(|o| !o.trim().is_empty())
            .take(3)
            .collect();
        let json = serde_json::to_string(&outcomes)?;

        self.with_retry("set_outcomes", |conn| {
            let now = Utc::now().to_rfc3339();
            conn.execute(
                "INSERT INTO weekly_outcomes (user_id, week_start, outcomes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT(user_id, week_start)
                 DO UPDATE SET outcomes = ?3, updated_at = ?4",
                params![user_id, week_start.to_string(), json, now],
            )?;
            Ok(())
        })
    }

    fn outcomes_for_week(
        &self,
        user_id: &str,
        week_start: NaiveDate,
    ) -> Result<Option<Vec<String>>, StoreError> {
        self.with_retry("outcomes_for_week", |conn| {
            let json: Option<String> = conn
                .query_row(
                    "SELECT outcomes FROM weekly_outcomes
                     WHERE user_id = ?1 AND week_start = ?2",
                    params![user_id, week_start.to_string()],
                    |row| row.get(0),
                )
                .optional()?;

            json.map(|j| serde_json::from_str(&j).map_err(StoreError::from))
                .transpose()
        })
    }

    fn record_surfaced(
        &self,
        user_id: &str,
        tasks: &[Task],
        surfaced_on: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        self.with_retry("record_surfaced", |conn| {
            let mut inserted = 0;
            for task in tasks {
                // INSERT OR IGNORE keeps the same-day brief run idempotent.
                inserted += conn.execute(
                    "INSERT OR IGNORE INTO surfaced_tasks
                     (user_id, task_id, task_content, surfaced_at, surfaced_on, status)
                     VALUES (?1, ?2, ?3, ?4, ?5, 'surfaced')",
                    params![
                        user_id,
                        task.id,
                        task.content,
                        now.to_rfc3339(),
                        surfaced_on.to_string(),
                    ],
                )?;
            }
            Ok(inserted)
        })
    }

    fn surfaced_on(&self, user_id: &str, day: NaiveDate) -> Result<Vec<SurfacedTask>, StoreError> {
        self.with_retry("surfaced_on", |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, task_id, task_content, surfaced_at, surfaced_on, status
                 FROM surfaced_tasks
                 WHERE user_id = ?1 AND surfaced_on = ?2
                 ORDER BY id",
            )?;

            let rows = stmt.query_map(params![user_id, day.to_string()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                ))
            })?;

            let mut out = Vec::new();
            for row in rows {
                let (user_id, task_id, content, surfaced_at, surfaced_on, status) = row?;
                out.push(SurfacedTask {
                    user_id,
                    task_id,
                    content,
                    surfaced_at: parse_utc(&surfaced_at)?,
                    surfaced_on: parse_date(&surfaced_on)?,
                    status: SurfacedStatus::parse(&status)
                        .ok_or_else(|| StoreError::Corrupt(format!("bad status '{status}'")))?,
                });
            }
            Ok(out)
        })
    }

    fn update_surfaced_status(
        &self,
        user_id: &str,
        task_id: &str,
        day: NaiveDate,
        status: SurfacedStatus,
    ) -> Result<bool, StoreError> {
        self.with_retry("update_surfaced_status", |conn| {
            // Forward-only: a row leaves 'surfaced' exactly once.
            let changed = conn.execute(
                "UPDATE surfaced_tasks SET status = ?1
                 WHERE user_id = ?2 AND task_id = ?3 AND surfaced_on = ?4
                   AND status = 'surfaced'",
                params![status.as_str(), user_id, task_id, day.to_string()],
            )?;
            Ok(changed > 0)
        })
    }

    fn log_event(
        &self,
        severity: &str,
        action: &str,
        payload: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), StoreError> {
        self.with_retry("log_event", |conn| {
            conn.execute(
                "INSERT INTO events (timestamp, severity, action, payload, user_id)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    Utc::now().to_rfc3339(),
                    severity,
                    action,
                    payload.to_string(),
                    user_id,
                ],
            )?;
            Ok(())
        })
    }

    fn recent_events(&self, limit: usize) -> Result<Vec<EventRecord>, StoreError> {
        self.with_retry("recent_events", |conn| {
            let mut stmt = conn.prepare(
                "SELECT timestamp, severity, action, payload, user_id
                 FROM events ORDER BY id DESC LIMIT ?1",
            )?;

            let rows = stmt.query_map(params![limit], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, Option<String>>(4)?,
                ))
            })?;

            let mut out = Vec::new();
            for row in rows {
                let (timestamp, severity, action, payload, user_id) = row?;
                let payload = payload
                    .map(|p| serde_json::from_str(&p))
                    .transpose()?
                    .unwrap_or(serde_json::Value::Null);
                out.push(EventRecord {
                    timestamp: parse_utc(&timestamp)?,
                    severity,
                    action,
                    payload,
                    user_id,
                });
            }
            Ok(out)
        })
    }
}

//! daybrief-store: durable state for the brief engine.
//!
//! Owns the on-disk representation of score records, weekly outcomes,
//! surfaced-task history, and the append-only event log. Task data itself
//! belongs to the upstream task-store and is never cached authoritatively
//! here.

pub mod error;
pub mod models;
pub mod sqlite;

use chrono::{DateTime, NaiveDate, Utc};
use daybrief_core::Task;

pub use error::StoreError;
pub use models::{week_start, EventRecord, ScoreRecord, SurfacedStatus, SurfacedTask};
pub use sqlite::SqliteStore;

/// Storage backend contract.
///
/// The embedded SQLite backend is the default; a networked-relational
/// backend can implement the same trait without touching the jobs.
pub trait BriefStore {
    /// Upsert by task_id: rescoring replaces the previous record.
    fn save_score(&self, record: &ScoreRecord) -> Result<(), StoreError>;

    fn get_score(&self, task_id: &str) -> Result<Option<ScoreRecord>, StoreError>;

    /// Upsert by (user_id, week_start); keeps at most 3 non-empty outcomes.
    fn set_outcomes(
        &self,
        user_id: &str,
        week_start: NaiveDate,
        outcomes: &[String],
    ) -> Result<(), StoreError>;

    fn outcomes_for_week(
        &self,
        user_id: &str,
        week_start: NaiveDate,
    ) -> Result<Option<Vec<String>>, StoreError>;

    /// Record tasks surfaced in a brief run. Idempotent per
    /// (user, task, local day); returns how many rows were actually new.
    fn record_surfaced(
        &self,
        user_id: &str,
        tasks: &[Task],
        surfaced_on: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError>;

    fn surfaced_on(&self, user_id: &str, day: NaiveDate) -> Result<Vec<SurfacedTask>, StoreError>;

    /// Move a surfaced row forward to `completed` or `snoozed`. Returns
    /// false when the row was absent or had already left `surfaced`.
    fn update_surfaced_status(
        &self,
        user_id: &str,
        task_id: &str,
        day: NaiveDate,
        status: SurfacedStatus,
    ) -> Result<bool, StoreError>;

    /// Append to the audit log.
    fn log_event(
        &self,
        severity: &str,
        action: &str,
        payload: serde_json::Value,
        user_id: Option<&str>,
    ) -> Result<(), StoreError>;

    fn recent_events(&self, limit: usize) -> Result<Vec<EventRecord>, StoreError>;
}

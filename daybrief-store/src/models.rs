//! Persisted record types.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use daybrief_core::Energy;
use serde::{Deserialize, Serialize};

/// One score per task; rescoring replaces the row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub task_id: String,
    pub impact: u8,
    pub urgency: u8,
    pub energy: Energy,
    pub total_score: i32,
    pub created_at: DateTime<Utc>,
}

/// Resolution state of a task surfaced in a morning brief.
///
/// Transitions are forward-only: `Surfaced` may become `Completed` or
/// `Snoozed`, nothing moves back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfacedStatus {
    Surfaced,
    Completed,
    Snoozed,
}

impl SurfacedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SurfacedStatus::Surfaced => "surfaced",
            SurfacedStatus::Completed => "completed",
            SurfacedStatus::Snoozed => "snoozed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "surfaced" => Some(SurfacedStatus::Surfaced),
            "completed" => Some(SurfacedStatus::Completed),
            "snoozed" => Some(SurfacedStatus::Snoozed),
            _ => None,
        }
    }
}

/// A task shown to a user in a brief, with its content snapshot at the time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfacedTask {
    pub user_id: String,
    pub task_id: String,
    pub content: String,
    pub surfaced_at: DateTime<Utc>,
    /// User-local calendar day of the brief run; the idempotency key.
    pub surfaced_on: NaiveDate,
    pub status: SurfacedStatus,
}

/// Append-only audit record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    pub timestamp: DateTime<Utc>,
    pub severity: String,
    pub action: String,
    pub payload: serde_json::Value,
    pub user_id: Option<String>,
}

/// Monday of the week containing `date`; the weekly-outcomes key.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    let days_since_monday = date.weekday().num_days_from_monday();
    date - chrono::Duration::days(i64::from(days_since_monday))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_start_mid_week() {
        // 2026-03-05 is a Thursday.
        let d = NaiveDate::from_ymd_opt(2026, 3, 5).unwrap();
        assert_eq!(week_start(d), NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
    }

    #[test]
    fn test_week_start_on_monday() {
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(week_start(monday), monday);
    }

    #[test]
    fn test_status_roundtrip() {
        for s in [
            SurfacedStatus::Surfaced,
            SurfacedStatus::Completed,
            SurfacedStatus::Snoozed,
        ] {
            assert_eq!(SurfacedStatus::parse(s.as_str()), Some(s));
        }
        assert_eq!(SurfacedStatus::parse("deleted"), None);
    }
}

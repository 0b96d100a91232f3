//! Scheduling gate: decides whether a job should fire for a user at a given
//! wall-clock instant.
//!
//! The external scheduler ticks more often than jobs run; this module does
//! the per-user, per-job "is it time yet" arithmetic in the user's timezone.

use chrono::{DateTime, Datelike, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Tolerance around the target time, in minutes.
pub const DEFAULT_WINDOW_TOLERANCE_MIN: i64 = 5;

/// How often a job recurs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    Daily,
    /// Mondays only.
    Weekly,
}

/// A job's firing schedule: target local time, tolerance, cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub target: NaiveTime,
    pub tolerance_min: i64,
    pub cadence: Cadence,
}

impl Schedule {
    pub fn daily(target: NaiveTime) -> Self {
        Self {
            target,
            tolerance_min: DEFAULT_WINDOW_TOLERANCE_MIN,
            cadence: Cadence::Daily,
        }
    }

    pub fn weekly(target: NaiveTime) -> Self {
        Self {
            target,
            tolerance_min: DEFAULT_WINDOW_TOLERANCE_MIN,
            cadence: Cadence::Weekly,
        }
    }

    /// Whether this schedule fires at `now` (UTC) for a user in `tz`.
    ///
    /// Weekly cadence additionally requires the local day to be Monday.
    pub fn fires_at(&self, now: DateTime<Utc>, tz: Tz) -> bool {
        let local = now.with_timezone(&tz);

        if self.cadence == Cadence::Weekly && local.weekday() != Weekday::Mon {
            return false;
        }

        within_window(local.time(), self.target, self.tolerance_min)
    }
}

/// Absolute minutes-since-midnight distance between `now` and `target` is at
/// most `tolerance_min`.
pub fn within_window(now: NaiveTime, target: NaiveTime, tolerance_min: i64) -> bool {
    let now_min = i64::from(now.hour()) * 60 + i64::from(now.minute());
    let target_min = i64::from(target.hour()) * 60 + i64::from(target.minute());
    (now_min - target_min).abs() <= tolerance_min
}

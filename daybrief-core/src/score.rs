//! Deep-work scoring: user input parsing and the energy-fit regime.
//!
//! The energy-fit bonus depends on the local wall clock, so every function
//! that needs it takes the clock as an explicit parameter. Callers pass the
//! user-local time; tests pass a fixed one.

use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

/// Preferred time-of-day for a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Energy {
    Am,
    Pm,
}

impl Energy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Energy::Am => "am",
            Energy::Pm => "pm",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "am" => Some(Energy::Am),
            "pm" => Some(Energy::Pm),
            _ => None,
        }
    }
}

/// A parsed impact/urgency/energy triple, each axis validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreInput {
    /// 1-5.
    pub impact: u8,
    /// 1-5.
    pub urgency: u8,
    pub energy: Energy,
}

/// Parse user input like `4/3/am` into a validated [`ScoreInput`].
///
/// Malformed input is a `None`, never an error: the caller owns the
/// corrective messaging.
pub fn parse_score_input(input: &str) -> Option<ScoreInput> {
    let parts: Vec<&str> = input.trim().split('/').collect();
    if parts.len() != 3 {
        return None;
    }

    let impact: u8 = parts[0].parse().ok()?;
    let urgency: u8 = parts[1].parse().ok()?;
    if !(1..=5).contains(&impact) || !(1..=5).contains(&urgency) {
        return None;
    }

    let energy = Energy::parse(parts[2])?;

    Some(ScoreInput {
        impact,
        urgency,
        energy,
    })
}

/// The morning regime is local hour in [6, 12); everything else is pm.
pub fn is_morning(now_local: NaiveDateTime) -> bool {
    (6..12).contains(&now_local.hour())
}

/// Whether the task's preferred energy matches the current regime.
pub fn energy_fits(energy: Energy, now_local: NaiveDateTime) -> bool {
    match energy {
        Energy::Am => is_morning(now_local),
        Energy::Pm => !is_morning(now_local),
    }
}

/// Composite score: impact + urgency, +1 when the energy tag matches the
/// current time-of-day regime.
pub fn total_score(impact: u8, urgency: u8, energy: Energy, now_local: NaiveDateTime) -> i32 {
    let mut total = i32::from(impact) + i32::from(urgency);
    if energy_fits(energy, now_local) {
        total += 1;
    }
    total
}

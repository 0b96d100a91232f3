//! Task snapshot model.
//!
//! Tasks are owned by the external task-store; what we hold here is an
//! immutable per-fetch snapshot. Local mutation only happens through explicit
//! update calls back to the store.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

/// Due date with an optional time-of-day component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Due {
    pub date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
}

impl Due {
    pub fn date_only(date: NaiveDate) -> Self {
        Self { date, time: None }
    }

    pub fn at(date: NaiveDate, time: NaiveTime) -> Self {
        Self {
            date,
            time: Some(time),
        }
    }
}

/// Snapshot of a task as the upstream store reports it.
///
/// `priority` is ordinal 1-4, 1 = highest (P1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub content: String,

    pub priority: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due: Option<Due>,

    #[serde(default)]
    pub labels: Vec<String>,

    #[serde(default)]
    pub completed: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
}

impl Task {
    pub fn new(id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            content: content.into(),
            priority: 4,
            due: None,
            labels: Vec::new(),
            completed: false,
            project: None,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_due(mut self, due: Due) -> Self {
        self.due = Some(due);
        self
    }

    pub fn with_labels<I, S>(mut self, labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.labels = labels.into_iter().map(Into::into).collect();
        self
    }

    pub fn completed(mut self) -> Self {
        self.completed = true;
        self
    }

    pub fn has_label(&self, name: &str) -> bool {
        self.labels.iter().any(|l| l == name)
    }
}

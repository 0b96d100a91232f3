//! Morning-brief selection: partition tasks into the four brief buckets.
//!
//! The selection policy is deliberately narrow triage, not a catch-all:
//! tasks matching no rule (a P3 overdue, a P2 due today) are dropped from
//! the brief entirely. Widening this would change the product, not fix a
//! bug.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::labels::CARRYOVER_LABEL;
use crate::task::Task;

/// Default cap on undated P1 suggestions.
pub const DEFAULT_MAX_UNDATED_P1: usize = 15;

/// The four morning-brief buckets. A task lands in at most one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BriefBuckets {
    /// Open tasks still carrying the carryover label from a prior day.
    pub carryover: Vec<Task>,
    /// Open P1/P2 tasks due before today.
    pub overdue: Vec<Task>,
    /// Open P1 tasks due exactly today.
    pub today_p1: Vec<Task>,
    /// Undated open P1 tasks, capped, in input order.
    pub suggested_p1: Vec<Task>,
}

impl BriefBuckets {
    pub fn is_empty(&self) -> bool {
        self.carryover.is_empty()
            && self.overdue.is_empty()
            && self.today_p1.is_empty()
            && self.suggested_p1.is_empty()
    }
}

/// Partition tasks for the morning brief.
///
/// Rules in precedence order, completed tasks excluded first:
/// - carryover label → `carryover`, regardless of anything else
/// - due + P1/P2 + overdue → `overdue`
/// - due + P1 + due today → `today_p1`
/// - undated + P1 → `suggested_p1`, first `max_undated_p1` in input order
///
/// `overdue` and `today_p1` come back date-sorted ascending; `suggested_p1`
/// intentionally keeps upstream order.
pub fn select_brief_tasks(tasks: &[Task], today: NaiveDate, max_undated_p1: usize) -> BriefBuckets {
    let mut buckets = BriefBuckets::default();
    let mut undated_p1: Vec<Task> = Vec::new();

    for task in tasks {
        if task.completed {
            continue;
        }

        if task.has_label(CARRYOVER_LABEL) {
            buckets.carryover.push(task.clone());
            continue;
        }

        match task.due {
            Some(due) => {
                if (task.priority == 1 || task.priority == 2) && due.date < today {
                    buckets.overdue.push(task.clone());
                } else if task.priority == 1 && due.date == today {
                    buckets.today_p1.push(task.clone());
                }
                // Anything else with a due date is out of brief scope.
            }
            None => {
                if task.priority == 1 {
                    undated_p1.push(task.clone());
                }
            }
        }
    }

    buckets
        .overdue
        .sort_by_key(|t| t.due.map(|d| d.date).unwrap_or(today));
    buckets
        .today_p1
        .sort_by_key(|t| t.due.map(|d| d.date).unwrap_or(today));

    undated_p1.truncate(max_undated_p1);
    buckets.suggested_p1 = undated_p1;

    buckets
}

/// Priority buckets for the lightweight task picker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PickerGroups {
    pub p1: Vec<Task>,
    pub p2: Vec<Task>,
    pub p3: Vec<Task>,
}

/// Group open tasks by priority, each bucket ordered overdue → due today or
/// later → undated.
pub fn group_for_picker(tasks: &[Task], today: NaiveDate) -> PickerGroups {
    let mut groups = PickerGroups::default();

    for task in tasks {
        if task.completed {
            continue;
        }
        match task.priority {
            1 => groups.p1.push(task.clone()),
            2 => groups.p2.push(task.clone()),
            _ => groups.p3.push(task.clone()),
        }
    }

    let sort_key = |t: &Task| match t.due {
        None => (1u8, 1u8, NaiveDate::MAX),
        Some(due) => (u8::from(due.date >= today), 0, due.date),
    };

    groups.p1.sort_by_key(sort_key);
    groups.p2.sort_by_key(sort_key);
    groups.p3.sort_by_key(sort_key);

    groups
}

/// One entry of a user-approved morning-brief plan.
///
/// `labels` is the task's label snapshot at plan-build time; applying the
/// plan unions the carryover label into it rather than appending blindly,
/// which is what keeps re-application idempotent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanEntry {
    pub task_id: String,
    pub include: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<NaiveTime>,
    #[serde(default)]
    pub labels: Vec<String>,
}

impl PlanEntry {
    /// Final label set for the task once the plan lands: snapshot plus the
    /// carryover label, no duplicates.
    pub fn labels_with_carryover(&self) -> Vec<String> {
        let mut labels = self.labels.clone();
        if !labels.iter().any(|l| l == CARRYOVER_LABEL) {
            labels.push(CARRYOVER_LABEL.to_string());
        }
        labels
    }
}

//! Morning-brief plan application.
//!
//! Two-phase, at-least-once, non-transactional: phase 1 sweeps the
//! carryover label off every currently carried task, phase 2 pushes each
//! included entry's update. There is no rollback; individual failures are
//! collected and reported, never swallowed.

use chrono::NaiveDate;
use daybrief_core::{Due, PlanEntry, CARRYOVER_LABEL};
use tracing::warn;

use crate::error::ApiError;
use crate::tasks::{TaskApi, TaskFilter, TaskUpdate};

/// Outcome of a plan application. `failures` holds (task_id, error) pairs
/// for the caller to retry or report.
#[derive(Debug, Default)]
pub struct ApplyReport {
    pub cleared: Vec<String>,
    pub applied: Vec<String>,
    pub failures: Vec<(String, ApiError)>,
}

impl ApplyReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Apply a user-approved morning-brief plan to the task-store.
///
/// The due date is only touched when the entry carries a time: date becomes
/// `today` with that time. An entry without a time leaves the due date
/// alone. The carryover label is re-added via set-union, so re-applying the
/// same plan is idempotent.
///
/// Errors from the initial carryover sweep listing are fatal (we cannot
/// know what to clear); everything after that degrades per-task.
pub fn apply_brief_plan(
    client: &impl TaskApi,
    plan: &[PlanEntry],
    today: NaiveDate,
) -> Result<ApplyReport, ApiError> {
    let mut report = ApplyReport::default();

    // Phase 1: full sweep, not a delta — clear the label from every task
    // that currently carries it.
    let carried = client.list_tasks(Some(&TaskFilter::by_label(CARRYOVER_LABEL)))?;
    for task in carried {
        let remaining: Vec<String> = task
            .labels
            .iter()
            .filter(|l| *l != CARRYOVER_LABEL)
            .cloned()
            .collect();
        let update = TaskUpdate {
            labels: Some(remaining),
            ..Default::default()
        };
        match client.update_task(&task.id, &update) {
            Ok(_) => report.cleared.push(task.id),
            Err(err) => {
                warn!(task_id = %task.id, %err, "failed to clear carryover label");
                report.failures.push((task.id, err));
            }
        }
    }

    // Phase 2: push each included entry.
    for entry in plan {
        if !entry.include {
            continue;
        }

        let update = TaskUpdate {
            priority: entry.priority,
            due: entry.time.map(|time| Due::at(today, time)),
            labels: Some(entry.labels_with_carryover()),
        };

        match client.update_task(&entry.task_id, &update) {
            Ok(_) => report.applied.push(entry.task_id.clone()),
            Err(err) => {
                warn!(task_id = %entry.task_id, %err, "failed to apply plan entry");
                report.failures.push((entry.task_id.clone(), err));
            }
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;
    use daybrief_core::Task;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory task-store double; `failing` ids error on update.
    struct FakeStore {
        tasks: RefCell<HashMap<String, Task>>,
        failing: Vec<String>,
    }

    impl FakeStore {
        fn new(tasks: Vec<Task>) -> Self {
            Self {
                tasks: RefCell::new(tasks.into_iter().map(|t| (t.id.clone(), t)).collect()),
                failing: Vec::new(),
            }
        }

        fn task(&self, id: &str) -> Task {
            self.tasks.borrow()[id].clone()
        }
    }

    impl TaskApi for FakeStore {
        fn list_tasks(&self, filter: Option<&TaskFilter>) -> Result<Vec<Task>, ApiError> {
            let mut out: Vec<Task> = self.tasks.borrow().values().cloned().collect();
            out.sort_by(|a, b| a.id.cmp(&b.id));
            if let Some(f) = filter {
                if let Some(label) = &f.label {
                    out.retain(|t| t.has_label(label));
                }
            }
            Ok(out)
        }

        fn get_task(&self, task_id: &str) -> Result<Task, ApiError> {
            self.tasks
                .borrow()
                .get(task_id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound {
                    resource: format!("task {task_id}"),
                })
        }

        fn update_task(&self, task_id: &str, update: &TaskUpdate) -> Result<Task, ApiError> {
            if self.failing.contains(&task_id.to_string()) {
                return Err(ApiError::Transient("upstream unavailable".into()));
            }
            let mut tasks = self.tasks.borrow_mut();
            let task = tasks.get_mut(task_id).ok_or_else(|| ApiError::NotFound {
                resource: format!("task {task_id}"),
            })?;
            if let Some(p) = update.priority {
                task.priority = p;
            }
            if let Some(due) = update.due {
                task.due = Some(due);
            }
            if let Some(labels) = &update.labels {
                task.labels = labels.clone();
            }
            Ok(task.clone())
        }

        fn complete_task(&self, task_id: &str) -> Result<bool, ApiError> {
            self.tasks
                .borrow_mut()
                .get_mut(task_id)
                .map(|t| {
                    t.completed = true;
                    true
                })
                .ok_or_else(|| ApiError::NotFound {
                    resource: format!("task {task_id}"),
                })
        }

        fn ensure_label(&self, name: &str) -> Result<String, ApiError> {
            Ok(format!("label-{name}"))
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    fn entry(task_id: &str, labels: &[&str]) -> PlanEntry {
        PlanEntry {
            task_id: task_id.into(),
            include: true,
            priority: Some(1),
            time: None,
            labels: labels.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn test_sweep_clears_stale_carryover() {
        let store = FakeStore::new(vec![
            Task::new("old", "yesterday's pick").with_labels([CARRYOVER_LABEL, "ops"]),
            Task::new("new", "today's pick"),
        ]);

        let report = apply_brief_plan(&store, &[entry("new", &[])], today()).unwrap();
        assert!(report.is_clean());
        assert_eq!(report.cleared, vec!["old"]);

        assert!(!store.task("old").has_label(CARRYOVER_LABEL));
        assert!(store.task("old").has_label("ops"));
        assert!(store.task("new").has_label(CARRYOVER_LABEL));
    }

    #[test]
    fn test_time_sets_due_no_time_leaves_due_alone() {
        let store = FakeStore::new(vec![Task::new("a", "timed"), Task::new("b", "untimed")]);
        let mut timed = entry("a", &[]);
        timed.time = NaiveTime::from_hms_opt(9, 0, 0);

        let report =
            apply_brief_plan(&store, &[timed, entry("b", &[])], today()).unwrap();
        assert!(report.is_clean());

        let due = store.task("a").due.unwrap();
        assert_eq!(due.date, today());
        assert_eq!(due.time, NaiveTime::from_hms_opt(9, 0, 0));
        assert!(store.task("b").due.is_none());
    }

    #[test]
    fn test_reapplying_same_plan_is_idempotent() {
        let store = FakeStore::new(vec![Task::new("a", "pick").with_labels(["ops"])]);
        let plan = vec![entry("a", &["ops"])];

        apply_brief_plan(&store, &plan, today()).unwrap();
        let after_first = store.task("a");

        // Second run re-clears and re-applies; final state identical, no
        // duplicate labels.
        apply_brief_plan(&store, &plan, today()).unwrap();
        let after_second = store.task("a");

        assert_eq!(after_first, after_second);
        assert_eq!(
            after_second
                .labels
                .iter()
                .filter(|l| *l == CARRYOVER_LABEL)
                .count(),
            1
        );
    }

    #[test]
    fn test_excluded_entries_skipped() {
        let store = FakeStore::new(vec![Task::new("a", "pick")]);
        let mut skipped = entry("a", &[]);
        skipped.include = false;

        let report = apply_brief_plan(&store, &[skipped], today()).unwrap();
        assert!(report.applied.is_empty());
        assert!(!store.task("a").has_label(CARRYOVER_LABEL));
    }

    #[test]
    fn test_partial_failure_is_reported_not_swallowed() {
        let mut store = FakeStore::new(vec![Task::new("ok", "fine"), Task::new("bad", "broken")]);
        store.failing.push("bad".into());

        let report =
            apply_brief_plan(&store, &[entry("ok", &[]), entry("bad", &[])], today()).unwrap();
        assert_eq!(report.applied, vec!["ok"]);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].0, "bad");
        // The successful entry still landed.
        assert!(store.task("ok").has_label(CARRYOVER_LABEL));
    }
}

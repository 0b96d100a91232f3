//! Task ranking for the morning brief.
//!
//! The score is a pure function of (task, outcomes, now); the additive
//! precedence is fixed and user-facing, so any change here must stay
//! explainable:
//!
//! 1. +1000 weekly-outcome alignment (first match only)
//! 2. +500  `rev_driver` label
//! 3. +impact+urgency (+1 energy fit) when both decoded scores are set
//! 4. +200 overdue / +100 due exactly today

use chrono::NaiveDateTime;
use tracing::debug;

use crate::labels::{decode_score_labels, REV_DRIVER_LABEL};
use crate::score::energy_fits;
use crate::task::Task;

pub const OUTCOME_ALIGNMENT_BONUS: f64 = 1000.0;
pub const REV_DRIVER_BONUS: f64 = 500.0;
pub const OVERDUE_BONUS: f64 = 200.0;
pub const DUE_TODAY_BONUS: f64 = 100.0;

/// Compute the priority score for a single task.
///
/// `now_local` is the user-local clock; it drives both the energy-fit bonus
/// and the overdue/due-today comparison.
pub fn priority_score(task: &Task, weekly_outcomes: &[String], now_local: NaiveDateTime) -> f64 {
    let mut score = 0.0;

    let content = task.content.to_lowercase();
    for outcome in weekly_outcomes {
        if content.contains(&outcome.to_lowercase()) {
            score += OUTCOME_ALIGNMENT_BONUS;
            debug!(task_id = %task.id, "task matches weekly outcome");
            break;
        }
    }

    if task.has_label(REV_DRIVER_LABEL) {
        score += REV_DRIVER_BONUS;
    }

    let decoded = decode_score_labels(&task.labels);
    if decoded.impact > 0 && decoded.urgency > 0 {
        let mut base = i32::from(decoded.impact) + i32::from(decoded.urgency);
        if decoded.energy.is_some_and(|e| energy_fits(e, now_local)) {
            base += 1;
        }
        score += f64::from(base);
    }

    if let Some(due) = task.due {
        let today = now_local.date();
        if due.date < today {
            score += OVERDUE_BONUS;
        } else if due.date == today {
            score += DUE_TODAY_BONUS;
        }
    }

    score
}

/// Rank tasks descending by [`priority_score`] and return the top `limit`.
///
/// The sort is stable: equal scores keep their input order, so the same
/// inputs always produce the same ranking.
pub fn sort_tasks(
    tasks: &[Task],
    weekly_outcomes: &[String],
    limit: usize,
    now_local: NaiveDateTime,
) -> Vec<Task> {
    if tasks.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(f64, &Task)> = tasks
        .iter()
        .map(|t| (priority_score(t, weekly_outcomes, now_local), t))
        .collect();

    scored.sort_by(|a, b| b.0.total_cmp(&a.0));

    scored
        .into_iter()
        .take(limit)
        .map(|(_, t)| t.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task::Due;
    use chrono::NaiveDate;

    fn morning() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(8, 30, 0)
            .unwrap()
    }

    fn outcomes(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_outcome_beats_rev_driver() {
        let tasks = vec![
            Task::new("t1", "Ship feature X"),
            Task::new("t2", "Random").with_labels([REV_DRIVER_LABEL]),
        ];
        let top = sort_tasks(&tasks, &outcomes(&["Ship feature X"]), 2, morning());
        assert_eq!(top[0].id, "t1");
        assert_eq!(top[1].id, "t2");
    }

    #[test]
    fn test_outcome_match_is_case_insensitive_and_single() {
        let task = Task::new("t1", "SHIP feature x and ship again");
        let score = priority_score(&task, &outcomes(&["ship"]), morning());
        assert_eq!(score, OUTCOME_ALIGNMENT_BONUS);
    }

    #[test]
    fn test_deep_work_scores_with_energy_fit() {
        let task = Task::new("t1", "deep").with_labels(["impact4", "urgency3", "energy_am"]);
        // 4 + 3 + 1 (am fit at 08:30).
        assert_eq!(priority_score(&task, &[], morning()), 8.0);

        let pm = NaiveDate::from_ymd_opt(2026, 3, 2)
            .unwrap()
            .and_hms_opt(15, 0, 0)
            .unwrap();
        assert_eq!(priority_score(&task, &[], pm), 7.0);
    }

    #[test]
    fn test_deep_work_needs_both_axes() {
        let task = Task::new("t1", "half scored").with_labels(["impact4", "energy_am"]);
        assert_eq!(priority_score(&task, &[], morning()), 0.0);
    }

    #[test]
    fn test_malformed_score_labels_contribute_zero() {
        let task = Task::new("t1", "odd").with_labels(["impactX", "urgency3"]);
        assert_eq!(priority_score(&task, &[], morning()), 0.0);
    }

    #[test]
    fn test_due_date_bonuses() {
        let today = morning().date();
        let overdue = Task::new("t1", "late")
            .with_due(Due::date_only(today.pred_opt().unwrap()));
        let due_today = Task::new("t2", "today").with_due(Due::date_only(today));
        let future = Task::new("t3", "later")
            .with_due(Due::date_only(today.succ_opt().unwrap()));

        assert_eq!(priority_score(&overdue, &[], morning()), OVERDUE_BONUS);
        assert_eq!(priority_score(&due_today, &[], morning()), DUE_TODAY_BONUS);
        assert_eq!(priority_score(&future, &[], morning()), 0.0);
    }

    #[test]
    fn test_stable_ties_keep_input_order() {
        let tasks = vec![
            Task::new("a", "one"),
            Task::new("b", "two"),
            Task::new("c", "three"),
        ];
        let sorted = sort_tasks(&tasks, &[], 3, morning());
        let ids: Vec<&str> = sorted.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c"]);
    }

    #[test]
    fn test_deterministic_for_fixed_inputs() {
        let tasks = vec![
            Task::new("a", "Ship feature X").with_labels(["impact2", "urgency2", "energy_pm"]),
            Task::new("b", "Random").with_labels([REV_DRIVER_LABEL]),
            Task::new("c", "overdue item")
                .with_due(Due::date_only(morning().date().pred_opt().unwrap())),
        ];
        let o = outcomes(&["ship feature x"]);
        let first = sort_tasks(&tasks, &o, 3, morning());
        for _ in 0..10 {
            assert_eq!(sort_tasks(&tasks, &o, 3, morning()), first);
        }
    }

    #[test]
    fn test_empty_input() {
        assert!(sort_tasks(&[], &outcomes(&["x"]), 3, morning()).is_empty());
    }

    #[test]
    fn test_limit_applied() {
        let tasks: Vec<Task> = (0..10)
            .map(|i| Task::new(format!("t{i}"), "task"))
            .collect();
        assert_eq!(sort_tasks(&tasks, &[], 3, morning()).len(), 3);
    }
}

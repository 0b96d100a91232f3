//! Inbound chat handling: score replies and brief button actions.
//!
//! These run off gateway deliveries (the `action` command feeds them a JSON
//! payload). Replies go back through the caller, which owns the transport.

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use daybrief_api::{ApiError, TaskApi, TaskUpdate};
use daybrief_core::{
    encode_score_labels, local_now, parse_score_input, strip_score_labels, total_score,
};
use daybrief_store::{BriefStore, ScoreRecord, SurfacedStatus};
use serde::Deserialize;
use tracing::warn;

use crate::messages;
use crate::session::SessionStore;

/// What a text reply produced; `reply` is the text to send back.
#[derive(Debug, PartialEq)]
pub enum ReplyOutcome {
    Saved { task_id: String, reply: String },
    Invalid { reply: String },
    NoPending,
}

/// Attribute a bare score reply (`4/3/am`) to the task the user was last
/// prompted about, persist the score, and push the score labels upstream.
///
/// A malformed reply re-arms the session so the user can just try again.
pub fn handle_score_reply<S: BriefStore, T: TaskApi>(
    sessions: &mut SessionStore,
    store: &S,
    tasks: &T,
    user_id: &str,
    text: &str,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<ReplyOutcome> {
    let Some(task_id) = sessions.take_pending_score(user_id) else {
        return Ok(ReplyOutcome::NoPending);
    };

    let Some(input) = parse_score_input(text) else {
        sessions.set_pending_score(user_id, &task_id);
        return Ok(ReplyOutcome::Invalid {
            reply: messages::score_invalid(),
        });
    };

    let task = tasks.get_task(&task_id)?;
    let total = total_score(input.impact, input.urgency, input.energy, local_now(now, tz));

    store.save_score(&ScoreRecord {
        task_id: task_id.clone(),
        impact: input.impact,
        urgency: input.urgency,
        energy: input.energy,
        total_score: total,
        created_at: now,
    })?;

    let mut labels = strip_score_labels(&task.labels);
    labels.extend(encode_score_labels(input.impact, input.urgency, input.energy));
    tasks.update_task(
        &task_id,
        &TaskUpdate {
            labels: Some(labels),
            ..Default::default()
        },
    )?;

    if let Err(err) = store.log_event(
        "info",
        "score_saved",
        serde_json::json!({ "task_id": task_id, "total": total }),
        Some(user_id),
    ) {
        warn!(%err, "failed to audit score save");
    }

    Ok(ReplyOutcome::Saved {
        reply: messages::score_saved(&task.content, total),
        task_id,
    })
}

/// A button click forwarded by the chat gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct ActionPayload {
    pub action_id: String,
    /// Task id the button was attached to.
    pub value: String,
    pub user_id: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ActionOutcome {
    Completed { task_id: String },
    Snoozed { task_id: String },
    /// The surfaced row had already moved on; the click is a no-op.
    Stale,
    Unknown,
}

/// Resolve a brief button click against the surfaced history for `day`.
///
/// Completing also closes the task upstream; a task already gone from the
/// task-store still gets its local row marked completed.
pub fn handle_brief_action<S: BriefStore, T: TaskApi>(
    store: &S,
    tasks: &T,
    payload: &ActionPayload,
    day: NaiveDate,
) -> Result<ActionOutcome> {
    let task_id = payload.value.clone();
    match payload.action_id.as_str() {
        "brief_complete" => {
            match tasks.complete_task(&task_id) {
                Ok(_) => {}
                Err(ApiError::NotFound { .. }) => {
                    warn!(task_id, "task gone upstream; marking completed locally");
                }
                Err(err) => return Err(err.into()),
            }
            let moved = store.update_surfaced_status(
                &payload.user_id,
                &task_id,
                day,
                SurfacedStatus::Completed,
            )?;
            if moved {
                Ok(ActionOutcome::Completed { task_id })
            } else {
                Ok(ActionOutcome::Stale)
            }
        }
        "brief_snooze" => {
            let moved = store.update_surfaced_status(
                &payload.user_id,
                &task_id,
                day,
                SurfacedStatus::Snoozed,
            )?;
            if moved {
                Ok(ActionOutcome::Snoozed { task_id })
            } else {
                Ok(ActionOutcome::Stale)
            }
        }
        other => {
            warn!(action_id = other, "unrecognized action");
            Ok(ActionOutcome::Unknown)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{utc, MockTasks};
    use daybrief_core::{RetryPolicy, Task, DEEP_WORK_LABEL};
    use daybrief_store::SqliteStore;

    fn fixed_tz() -> Tz {
        "America/Chicago".parse().unwrap()
    }

    fn store() -> SqliteStore {
        SqliteStore::open_in_memory(RetryPolicy::default()).unwrap()
    }

    #[test]
    fn test_score_reply_saves_and_relabels() {
        let store = store();
        let tasks = MockTasks::new(vec![
            Task::new("t-1", "Write the design note").with_labels([DEEP_WORK_LABEL, "impact2"])
        ]);
        let mut sessions = SessionStore::default();
        sessions.set_pending_score("U1", "t-1");

        // 14:00 UTC is morning in Chicago, so energy am fits.
        let outcome = handle_score_reply(
            &mut sessions,
            &store,
            &tasks,
            "U1",
            "4/3/am",
            utc(2026, 3, 2, 14, 0),
            fixed_tz(),
        )
        .unwrap();

        match outcome {
            ReplyOutcome::Saved { task_id, .. } => assert_eq!(task_id, "t-1"),
            other => panic!("expected Saved, got {other:?}"),
        }

        let record = store.get_score("t-1").unwrap().unwrap();
        assert_eq!((record.impact, record.urgency), (4, 3));
        assert_eq!(record.total_score, 8);

        let task = tasks.task("t-1");
        assert!(task.has_label("impact4"));
        assert!(task.has_label("urgency3"));
        assert!(task.has_label("energy_am"));
        assert!(!task.has_label("impact2"));
        assert!(task.has_label(DEEP_WORK_LABEL));
    }

    #[test]
    fn test_invalid_reply_rearms_session() {
        let store = store();
        let tasks = MockTasks::new(vec![Task::new("t-1", "x")]);
        let mut sessions = SessionStore::default();
        sessions.set_pending_score("U1", "t-1");

        let outcome = handle_score_reply(
            &mut sessions,
            &store,
            &tasks,
            "U1",
            "very important",
            utc(2026, 3, 2, 14, 0),
            fixed_tz(),
        )
        .unwrap();
        assert!(matches!(outcome, ReplyOutcome::Invalid { .. }));

        // The retry still finds the pending task.
        let outcome = handle_score_reply(
            &mut sessions,
            &store,
            &tasks,
            "U1",
            "2/2/pm",
            utc(2026, 3, 2, 14, 0),
            fixed_tz(),
        )
        .unwrap();
        assert!(matches!(outcome, ReplyOutcome::Saved { .. }));
    }

    #[test]
    fn test_reply_without_pending_is_ignored() {
        let store = store();
        let tasks = MockTasks::new(vec![]);
        let mut sessions = SessionStore::default();
        let outcome = handle_score_reply(
            &mut sessions,
            &store,
            &tasks,
            "U1",
            "4/3/am",
            utc(2026, 3, 2, 14, 0),
            fixed_tz(),
        )
        .unwrap();
        assert_eq!(outcome, ReplyOutcome::NoPending);
    }

    #[test]
    fn test_complete_action_closes_upstream_and_locally() {
        let store = store();
        let tasks = MockTasks::new(vec![Task::new("t-1", "Ship it")]);
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        store
            .record_surfaced("U1", &[tasks.task("t-1")], day, utc(2026, 3, 2, 14, 30))
            .unwrap();

        let payload = ActionPayload {
            action_id: "brief_complete".into(),
            value: "t-1".into(),
            user_id: "U1".into(),
        };
        let outcome = handle_brief_action(&store, &tasks, &payload, day).unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::Completed {
                task_id: "t-1".into()
            }
        );
        assert!(tasks.task("t-1").completed);

        // Second click finds the row already moved on.
        let outcome = handle_brief_action(&store, &tasks, &payload, day).unwrap();
        assert_eq!(outcome, ActionOutcome::Stale);
    }

    #[test]
    fn test_complete_tolerates_task_gone_upstream() {
        let store = store();
        let tasks = MockTasks::new(vec![]);
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        store
            .record_surfaced(
                "U1",
                &[Task::new("t-gone", "Deleted meanwhile")],
                day,
                utc(2026, 3, 2, 14, 30),
            )
            .unwrap();

        let payload = ActionPayload {
            action_id: "brief_complete".into(),
            value: "t-gone".into(),
            user_id: "U1".into(),
        };
        let outcome = handle_brief_action(&store, &tasks, &payload, day).unwrap();
        assert_eq!(
            outcome,
            ActionOutcome::Completed {
                task_id: "t-gone".into()
            }
        );
    }

    #[test]
    fn test_snooze_is_terminal() {
        let store = store();
        let tasks = MockTasks::new(vec![Task::new("t-1", "Later")]);
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        store
            .record_surfaced("U1", &[tasks.task("t-1")], day, utc(2026, 3, 2, 14, 30))
            .unwrap();

        let snooze = ActionPayload {
            action_id: "brief_snooze".into(),
            value: "t-1".into(),
            user_id: "U1".into(),
        };
        assert_eq!(
            handle_brief_action(&store, &tasks, &snooze, day).unwrap(),
            ActionOutcome::Snoozed {
                task_id: "t-1".into()
            }
        );

        let complete = ActionPayload {
            action_id: "brief_complete".into(),
            ..snooze
        };
        assert_eq!(
            handle_brief_action(&store, &tasks, &complete, day).unwrap(),
            ActionOutcome::Stale
        );
    }

    #[test]
    fn test_unknown_action_is_reported() {
        let store = store();
        let tasks = MockTasks::new(vec![]);
        let payload = ActionPayload {
            action_id: "brief_defer_forever".into(),
            value: "t-1".into(),
            user_id: "U1".into(),
        };
        let day = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        assert_eq!(
            handle_brief_action(&store, &tasks, &payload, day).unwrap(),
            ActionOutcome::Unknown
        );
    }
}

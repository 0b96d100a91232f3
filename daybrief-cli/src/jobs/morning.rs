//! Morning brief: pick the top tasks, persist them, then deliver.
//!
//! The surfaced rows are written before the message goes out so the evening
//! wrap can reconcile even if the send itself fails halfway.

use anyhow::Result;
use chrono::{DateTime, Utc};
use daybrief_api::{ChatGateway, TaskApi};
use daybrief_core::{local_now, sort_tasks};
use daybrief_store::{week_start, BriefStore};
use tracing::{debug, error, warn};

use super::{resolve_timezone, JobContext, BRIEF_SIZE};
use crate::messages;

/// Run the brief for one user. Failures are absorbed: the user gets a
/// fallback message and the audit log gets the error.
pub fn run<S: BriefStore, T: TaskApi, C: ChatGateway>(
    ctx: &JobContext<'_, S, T, C>,
    user_id: &str,
    now: DateTime<Utc>,
) -> bool {
    match send_brief(ctx, user_id, now) {
        Ok(()) => true,
        Err(err) => {
            error!(user_id, %err, "morning brief failed");
            if let Err(e) = ctx.store.log_event(
                "error",
                "morning_brief_failed",
                serde_json::json!({ "error": err.to_string() }),
                Some(user_id),
            ) {
                warn!(%e, "failed to audit brief failure");
            }
            if let Err(e) = ctx.chat.send_message(user_id, &messages::brief_fallback()) {
                warn!(user_id, %e, "fallback message undeliverable");
            }
            false
        }
    }
}

fn send_brief<S: BriefStore, T: TaskApi, C: ChatGateway>(
    ctx: &JobContext<'_, S, T, C>,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let tz = resolve_timezone(ctx, user_id);
    let now_local = local_now(now, tz);
    let today = now_local.date();

    let outcomes = ctx
        .store
        .outcomes_for_week(user_id, week_start(today))?
        .unwrap_or_default();

    let mut tasks = ctx.tasks.list_tasks(None)?;
    tasks.retain(|t| !t.completed);
    if tasks.is_empty() {
        ctx.chat.send_message(user_id, &messages::no_tasks_brief())?;
        return Ok(());
    }

    let top = sort_tasks(&tasks, &outcomes, BRIEF_SIZE, now_local);

    // Persist first; a crash after this point loses the message, not the
    // day's record.
    let new_rows = ctx.store.record_surfaced(user_id, &top, today, now)?;
    if new_rows == 0 {
        debug!(user_id, %today, "brief already surfaced today; resending");
    }

    ctx.chat
        .send_message(user_id, &messages::morning_brief(&top))?;

    let ids: Vec<&str> = top.iter().map(|t| t.id.as_str()).collect();
    if let Err(err) = ctx.store.log_event(
        "info",
        "morning_brief_sent",
        serde_json::json!({ "task_ids": ids, "new_rows": new_rows }),
        Some(user_id),
    ) {
        warn!(%err, "failed to audit brief send");
    }
    Ok(())
}

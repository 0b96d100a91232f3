//! Evening wrap: reconcile this morning's picks and send the recap.

use anyhow::Result;
use chrono::{DateTime, Utc};
use daybrief_api::{ApiError, ChatGateway, TaskApi};
use daybrief_core::local_now;
use daybrief_store::{BriefStore, SurfacedStatus, SurfacedTask};
use tracing::{debug, error, warn};

use super::{resolve_timezone, JobContext};
use crate::messages;

pub fn run<S: BriefStore, T: TaskApi, C: ChatGateway>(
    ctx: &JobContext<'_, S, T, C>,
    user_id: &str,
    now: DateTime<Utc>,
) -> bool {
    match send_wrap(ctx, user_id, now) {
        Ok(()) => true,
        Err(err) => {
            error!(user_id, %err, "evening wrap failed");
            if let Err(e) = ctx.store.log_event(
                "error",
                "evening_wrap_failed",
                serde_json::json!({ "error": err.to_string() }),
                Some(user_id),
            ) {
                warn!(%e, "failed to audit wrap failure");
            }
            if let Err(e) = ctx.chat.send_message(user_id, &messages::wrap_fallback()) {
                warn!(user_id, %e, "fallback message undeliverable");
            }
            false
        }
    }
}

fn send_wrap<S: BriefStore, T: TaskApi, C: ChatGateway>(
    ctx: &JobContext<'_, S, T, C>,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let tz = resolve_timezone(ctx, user_id);
    let today = local_now(now, tz).date();

    let surfaced = ctx.store.surfaced_on(user_id, today)?;
    if surfaced.is_empty() {
        debug!(user_id, %today, "no brief today; skipping wrap");
        return Ok(());
    }

    let mut done: Vec<&SurfacedTask> = Vec::new();
    let mut open: Vec<&SurfacedTask> = Vec::new();
    for row in &surfaced {
        match row.status {
            SurfacedStatus::Completed => done.push(row),
            // Snoozed tasks were explicitly deferred; leave them out of the
            // recap entirely.
            SurfacedStatus::Snoozed => {}
            SurfacedStatus::Surfaced => {
                if completed_upstream(ctx.tasks, &row.task_id) {
                    ctx.store.update_surfaced_status(
                        user_id,
                        &row.task_id,
                        today,
                        SurfacedStatus::Completed,
                    )?;
                    done.push(row);
                } else {
                    open.push(row);
                }
            }
        }
    }

    ctx.chat
        .send_message(user_id, &messages::evening_wrap(&done, &open))?;

    if let Err(err) = ctx.store.log_event(
        "info",
        "evening_wrap_sent",
        serde_json::json!({ "completed": done.len(), "open": open.len() }),
        Some(user_id),
    ) {
        warn!(%err, "failed to audit wrap send");
    }
    Ok(())
}

/// A task missing upstream counts as completed; the common cause is
/// completion with auto-archive. A transient lookup failure counts as open
/// so we never claim credit we can't verify.
fn completed_upstream(tasks: &impl TaskApi, task_id: &str) -> bool {
    match tasks.get_task(task_id) {
        Ok(task) => task.completed,
        Err(ApiError::NotFound { .. }) => true,
        Err(err) => {
            warn!(task_id, %err, "reconciliation lookup failed; treating as open");
            false
        }
    }
}

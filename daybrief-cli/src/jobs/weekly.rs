//! Monday outcomes prompt.
//!
//! Skipped entirely when the user already set outcomes for the week, so a
//! late tick never nags twice.

use anyhow::Result;
use chrono::{DateTime, Utc};
use daybrief_api::{ChatGateway, TaskApi};
use daybrief_core::local_now;
use daybrief_store::{week_start, BriefStore};
use tracing::{debug, error, warn};

use super::{resolve_timezone, JobContext};
use crate::messages;

pub fn run<S: BriefStore, T: TaskApi, C: ChatGateway>(
    ctx: &JobContext<'_, S, T, C>,
    user_id: &str,
    now: DateTime<Utc>,
) -> bool {
    match prompt(ctx, user_id, now) {
        Ok(()) => true,
        Err(err) => {
            error!(user_id, %err, "weekly outcomes prompt failed");
            if let Err(e) = ctx.store.log_event(
                "error",
                "weekly_prompt_failed",
                serde_json::json!({ "error": err.to_string() }),
                Some(user_id),
            ) {
                warn!(%e, "failed to audit prompt failure");
            }
            false
        }
    }
}

fn prompt<S: BriefStore, T: TaskApi, C: ChatGateway>(
    ctx: &JobContext<'_, S, T, C>,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let tz = resolve_timezone(ctx, user_id);
    let today = local_now(now, tz).date();
    let week = week_start(today);

    if ctx.store.outcomes_for_week(user_id, week)?.is_some() {
        debug!(user_id, %week, "outcomes already set; skipping prompt");
        return Ok(());
    }

    ctx.chat.send_message(user_id, &messages::weekly_prompt())?;

    if let Err(err) = ctx.store.log_event(
        "info",
        "weekly_prompt_sent",
        serde_json::json!({ "week_start": week }),
        Some(user_id),
    ) {
        warn!(%err, "failed to audit weekly prompt");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::testing::{utc, MockChat, MockTasks};
    use chrono::NaiveDate;
    use daybrief_core::RetryPolicy;
    use daybrief_store::SqliteStore;

    // 15:00 UTC on Monday 2026-03-02 is 09:00 in Chicago.
    fn monday_morning() -> chrono::DateTime<Utc> {
        utc(2026, 3, 2, 15, 0)
    }

    #[test]
    fn test_prompt_sent_when_no_outcomes_yet() {
        let store = SqliteStore::open_in_memory(RetryPolicy::default()).unwrap();
        let tasks = MockTasks::new(vec![]);
        let chat = MockChat::new();
        let cfg = Config::default();

        let ctx = JobContext {
            store: &store,
            tasks: &tasks,
            chat: &chat,
            config: &cfg,
        };
        assert!(run(&ctx, "U1", monday_morning()));
        assert!(chat.sent_to("U1")[0].contains("1-3 outcomes"));
    }

    #[test]
    fn test_prompt_skipped_when_outcomes_exist() {
        let store = SqliteStore::open_in_memory(RetryPolicy::default()).unwrap();
        let monday = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        store
            .set_outcomes("U1", monday, &["ship the beta".to_string()])
            .unwrap();
        let tasks = MockTasks::new(vec![]);
        let chat = MockChat::new();
        let cfg = Config::default();

        let ctx = JobContext {
            store: &store,
            tasks: &tasks,
            chat: &chat,
            config: &cfg,
        };
        assert!(run(&ctx, "U1", monday_morning()));
        assert!(chat.sent.borrow().is_empty());
    }
}

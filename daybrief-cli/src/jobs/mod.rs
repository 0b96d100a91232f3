//! Scheduled jobs and the tick loop that dispatches them.
//!
//! Jobs are generic over the store, task-store, and chat gateway traits so
//! they run against mocks in tests and the HTTP clients in production. One
//! user's failure never blocks the rest of the roster.

pub mod evening;
pub mod morning;
pub mod score_batch;
pub mod weekly;

use anyhow::Result;
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use daybrief_api::{ChatGateway, TaskApi};
use daybrief_core::{parse_tz, Schedule};
use daybrief_store::BriefStore;
use tracing::{info, warn};

use crate::config::Config;

/// Tasks shown per morning brief.
pub const BRIEF_SIZE: usize = 3;

pub struct JobContext<'a, S: BriefStore, T: TaskApi, C: ChatGateway> {
    pub store: &'a S,
    pub tasks: &'a T,
    pub chat: &'a C,
    pub config: &'a Config,
}

/// The user's profile timezone, falling back to the configured default and
/// finally UTC. Never fails: a bad timezone should not cost anyone their
/// brief.
pub fn resolve_timezone<S: BriefStore, T: TaskApi, C: ChatGateway>(
    ctx: &JobContext<'_, S, T, C>,
    user_id: &str,
) -> Tz {
    match ctx.chat.user_timezone(user_id) {
        Ok(tz) => tz,
        Err(err) => {
            warn!(user_id, %err, "timezone lookup failed; using default");
            parse_tz(&ctx.config.schedule.default_timezone).unwrap_or_else(|err| {
                warn!(%err, "default timezone invalid; using UTC");
                chrono_tz::UTC
            })
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    pub ran: usize,
    pub succeeded: usize,
}

impl TickSummary {
    fn record(&mut self, ok: bool) {
        self.ran += 1;
        if ok {
            self.succeeded += 1;
        }
    }
}

/// One scheduler tick: for every active user, run whichever jobs fall inside
/// their local firing window right now.
pub fn run_due_jobs<S: BriefStore, T: TaskApi, C: ChatGateway>(
    ctx: &JobContext<'_, S, T, C>,
    now: DateTime<Utc>,
) -> Result<TickSummary> {
    let tolerance = ctx.config.schedule.tolerance_min;
    let mut brief = Schedule::daily(Config::parse_time(&ctx.config.schedule.brief_time)?);
    let mut wrap = Schedule::daily(Config::parse_time(&ctx.config.schedule.wrap_time)?);
    let mut outcomes = Schedule::weekly(Config::parse_time(&ctx.config.schedule.outcomes_time)?);
    brief.tolerance_min = tolerance;
    wrap.tolerance_min = tolerance;
    outcomes.tolerance_min = tolerance;

    let mut summary = TickSummary::default();
    for user_id in &ctx.config.users.active {
        let tz = resolve_timezone(ctx, user_id);
        if outcomes.fires_at(now, tz) {
            info!(user_id, job = "weekly_outcomes", "firing");
            summary.record(weekly::run(ctx, user_id, now));
        }
        if brief.fires_at(now, tz) {
            info!(user_id, job = "morning_brief", "firing");
            summary.record(morning::run(ctx, user_id, now));
        }
        if wrap.fires_at(now, tz) {
            info!(user_id, job = "evening_wrap", "firing");
            summary.record(evening::run(ctx, user_id, now));
        }
    }
    Ok(summary)
}

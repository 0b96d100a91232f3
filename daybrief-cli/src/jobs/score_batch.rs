//! Batch scoring sweep over unscored deep-work tasks.
//!
//! Tags qualifying tasks with the deep-work label, estimates impact and
//! urgency from the task text, and writes both the score record and the
//! score labels. User-supplied scores (the chat reply flow) overwrite these
//! estimates later via the same upsert.

use anyhow::Result;
use chrono::{DateTime, Utc};
use daybrief_api::{ChatGateway, TaskApi, TaskUpdate};
use daybrief_core::{
    encode_score_labels, extract_duration, is_deep_work, local_now, parse_tz, strip_score_labels,
    total_score, Energy,
};
use daybrief_store::{BriefStore, ScoreRecord};
use tracing::{info, warn};

use super::JobContext;

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ScoreBatchSummary {
    pub scanned: usize,
    pub scored: usize,
    pub newly_labeled: usize,
    pub failures: usize,
}

/// Sweep the open task list. Manual command; errors reaching the task list
/// propagate, per-task failures are counted and skipped.
pub fn run<S: BriefStore, T: TaskApi, C: ChatGateway>(
    ctx: &JobContext<'_, S, T, C>,
    now: DateTime<Utc>,
) -> Result<ScoreBatchSummary> {
    // Label creation is advisory; the label may already exist.
    if let Err(err) = ctx.tasks.ensure_label(daybrief_core::DEEP_WORK_LABEL) {
        warn!(%err, "could not ensure deep-work label; continuing");
    }

    let tz = parse_tz(&ctx.config.schedule.default_timezone).unwrap_or(chrono_tz::UTC);
    let now_local = local_now(now, tz);

    let mut summary = ScoreBatchSummary::default();
    for task in ctx.tasks.list_tasks(None)? {
        if task.completed {
            continue;
        }
        summary.scanned += 1;

        if ctx.store.get_score(&task.id)?.is_some() {
            continue;
        }
        let duration = extract_duration(&task.content);
        if !is_deep_work(&task.content, duration) {
            continue;
        }

        let (impact, urgency) = estimate_scores(&task.content);
        let energy = Energy::Am;
        let total = total_score(impact, urgency, energy, now_local);

        ctx.store.save_score(&ScoreRecord {
            task_id: task.id.clone(),
            impact,
            urgency,
            energy,
            total_score: total,
            created_at: now,
        })?;

        let mut labels = strip_score_labels(&task.labels);
        if !labels.iter().any(|l| l == daybrief_core::DEEP_WORK_LABEL) {
            labels.push(daybrief_core::DEEP_WORK_LABEL.to_string());
            summary.newly_labeled += 1;
        }
        labels.extend(encode_score_labels(impact, urgency, energy));

        match ctx.tasks.update_task(
            &task.id,
            &TaskUpdate {
                labels: Some(labels),
                ..Default::default()
            },
        ) {
            Ok(_) => summary.scored += 1,
            Err(err) => {
                warn!(task_id = %task.id, %err, "label push failed");
                summary.failures += 1;
            }
        }
    }

    info!(?summary, "score batch finished");
    if let Err(err) = ctx.store.log_event(
        "info",
        "score_batch_finished",
        serde_json::json!({
            "scanned": summary.scanned,
            "scored": summary.scored,
            "failures": summary.failures,
        }),
        None,
    ) {
        warn!(%err, "failed to audit score batch");
    }
    Ok(summary)
}

/// Keyword estimate of impact and urgency, both defaulting to the middle of
/// the scale.
fn estimate_scores(content: &str) -> (u8, u8) {
    let text = content.to_lowercase();

    let urgency = if ["urgent", "asap", "critical", "deadline"]
        .iter()
        .any(|k| text.contains(k))
    {
        5
    } else if ["important", "priority"].iter().any(|k| text.contains(k)) {
        4
    } else {
        3
    };

    let impact = if ["strategic", "key", "major", "critical"]
        .iter()
        .any(|k| text.contains(k))
    {
        5
    } else if ["improve", "enhance", "optimize"]
        .iter()
        .any(|k| text.contains(k))
    {
        4
    } else {
        3
    };

    (impact, urgency)
}

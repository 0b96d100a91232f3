use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use daybrief_api::{apply_brief_plan, HttpChatClient, RestTaskClient, TaskApi};
use daybrief_core::{group_for_picker, local_now, parse_tz, select_brief_tasks, PlanEntry, Task};
use daybrief_store::{week_start, BriefStore, SqliteStore};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod config;
mod handlers;
mod jobs;
mod messages;
mod session;
#[cfg(test)]
mod testing;

use config::{Config, CHAT_TOKEN_VAR, TASKSTORE_TOKEN_VAR};
use jobs::JobContext;

#[derive(Parser, Debug)]
#[command(name = "daybrief", version, about = "Daily brief engine CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Write a default config to ~/.daybrief/config.toml
    Init,

    /// One scheduler tick: run whatever jobs are due for each active user
    Tick,

    /// Send the morning brief now (ignores the schedule window)
    MorningBrief {
        /// Single user; defaults to every active user
        #[arg(long)]
        user: Option<String>,
    },

    /// Send the evening wrap now
    EveningWrap {
        #[arg(long)]
        user: Option<String>,
    },

    /// Send the Monday outcomes prompt now
    WeeklyPrompt {
        #[arg(long)]
        user: Option<String>,
    },

    /// Sweep open tasks: tag deep work and write estimated scores
    ScoreBatch,

    /// Score one task by hand, e.g. --input 4/3/am
    Score {
        #[arg(long)]
        user: String,
        #[arg(long)]
        task_id: String,
        #[arg(long)]
        input: String,
    },

    /// Weekly outcomes commands
    Outcomes {
        #[command(subcommand)]
        command: OutcomesCommand,
    },

    /// Show today's brief buckets and the priority picker
    Plan {
        /// Emit an editable JSON plan instead of text
        #[arg(long)]
        json: bool,
    },

    /// Apply an edited plan file produced by `plan --json`
    Apply {
        #[arg(long)]
        plan: PathBuf,
    },

    /// Handle a forwarded button action payload (JSON)
    Action {
        #[arg(long)]
        json: String,
    },

    /// Print recent audit events
    Events {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
enum OutcomesCommand {
    /// Set this week's outcomes (up to 3)
    Set {
        #[arg(long)]
        user: String,
        /// Repeatable: --outcome "ship the beta" --outcome "close renewal"
        #[arg(long = "outcome")]
        outcomes: Vec<String>,
    },

    /// Show this week's outcomes
    Show {
        #[arg(long)]
        user: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Init => config::init_config()?,
        Command::Tick => {
            let (cfg, store, tasks, chat) = connect()?;
            let ctx = JobContext {
                store: &store,
                tasks: &tasks,
                chat: &chat,
                config: &cfg,
            };
            let summary = jobs::run_due_jobs(&ctx, Utc::now())?;
            println!("Ran {} job(s), {} succeeded", summary.ran, summary.succeeded);
        }
        Command::MorningBrief { user } => {
            let (cfg, store, tasks, chat) = connect()?;
            let ctx = JobContext {
                store: &store,
                tasks: &tasks,
                chat: &chat,
                config: &cfg,
            };
            for user_id in roster(&cfg, user)? {
                let ok = jobs::morning::run(&ctx, &user_id, Utc::now());
                println!("morning brief for {user_id}: {}", outcome(ok));
            }
        }
        Command::EveningWrap { user } => {
            let (cfg, store, tasks, chat) = connect()?;
            let ctx = JobContext {
                store: &store,
                tasks: &tasks,
                chat: &chat,
                config: &cfg,
            };
            for user_id in roster(&cfg, user)? {
                let ok = jobs::evening::run(&ctx, &user_id, Utc::now());
                println!("evening wrap for {user_id}: {}", outcome(ok));
            }
        }
        Command::WeeklyPrompt { user } => {
            let (cfg, store, tasks, chat) = connect()?;
            let ctx = JobContext {
                store: &store,
                tasks: &tasks,
                chat: &chat,
                config: &cfg,
            };
            for user_id in roster(&cfg, user)? {
                let ok = jobs::weekly::run(&ctx, &user_id, Utc::now());
                println!("weekly prompt for {user_id}: {}", outcome(ok));
            }
        }
        Command::ScoreBatch => {
            let (cfg, store, tasks, chat) = connect()?;
            let ctx = JobContext {
                store: &store,
                tasks: &tasks,
                chat: &chat,
                config: &cfg,
            };
            let summary = jobs::score_batch::run(&ctx, Utc::now())?;
            println!(
                "Scanned {}, scored {}, newly labeled {}, failures {}",
                summary.scanned, summary.scored, summary.newly_labeled, summary.failures
            );
        }
        Command::Score {
            user,
            task_id,
            input,
        } => {
            let (cfg, store, tasks, chat) = connect()?;
            let tz = jobs::resolve_timezone(
                &JobContext {
                    store: &store,
                    tasks: &tasks,
                    chat: &chat,
                    config: &cfg,
                },
                &user,
            );
            let mut sessions = session::SessionStore::default();
            sessions.set_pending_score(&user, &task_id);
            let outcome = handlers::handle_score_reply(
                &mut sessions,
                &store,
                &tasks,
                &user,
                &input,
                Utc::now(),
                tz,
            )?;
            match outcome {
                handlers::ReplyOutcome::Saved { reply, .. }
                | handlers::ReplyOutcome::Invalid { reply } => println!("{reply}"),
                handlers::ReplyOutcome::NoPending => println!("nothing pending"),
            }
        }
        Command::Outcomes { command } => {
            let (cfg, store, _, chat) = connect()?;
            match command {
                OutcomesCommand::Set { user, outcomes } => {
                    let week = this_week(&cfg, &chat, &user);
                    store.set_outcomes(&user, week, &outcomes)?;
                    let saved = store.outcomes_for_week(&user, week)?.unwrap_or_default();
                    println!("Saved {} outcome(s) for week of {week}", saved.len());
                }
                OutcomesCommand::Show { user } => {
                    let week = this_week(&cfg, &chat, &user);
                    match store.outcomes_for_week(&user, week)? {
                        Some(outcomes) => {
                            println!("Week of {week}:");
                            for o in outcomes {
                                println!("  - {o}");
                            }
                        }
                        None => println!("No outcomes set for week of {week}"),
                    }
                }
            }
        }
        Command::Plan { json } => {
            let (cfg, _store, tasks, _chat) = connect()?;
            let tz = parse_tz(&cfg.schedule.default_timezone)?;
            let today = local_now(Utc::now(), tz).date();
            let all = tasks.list_tasks(None)?;
            let buckets = select_brief_tasks(&all, today, cfg.schedule.max_undated_p1);
            if json {
                let entries: Vec<PlanEntry> = buckets
                    .carryover
                    .iter()
                    .chain(&buckets.overdue)
                    .chain(&buckets.today_p1)
                    .chain(&buckets.suggested_p1)
                    .map(|t| PlanEntry {
                        task_id: t.id.clone(),
                        include: true,
                        priority: Some(t.priority),
                        time: None,
                        labels: t.labels.clone(),
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&entries)?);
            } else {
                print_bucket("Carryover", &buckets.carryover);
                print_bucket("Overdue", &buckets.overdue);
                print_bucket("Due today (P1)", &buckets.today_p1);
                print_bucket("Suggested (undated P1)", &buckets.suggested_p1);
                let groups = group_for_picker(&all, today);
                println!(
                    "\nPicker: {} P1, {} P2, {} other",
                    groups.p1.len(),
                    groups.p2.len(),
                    groups.p3.len()
                );
            }
        }
        Command::Apply { plan } => {
            let (cfg, store, tasks, _chat) = connect()?;
            let raw = std::fs::read_to_string(&plan)
                .with_context(|| format!("read {}", plan.display()))?;
            let entries: Vec<PlanEntry> =
                serde_json::from_str(&raw).context("parse plan JSON")?;
            let tz = parse_tz(&cfg.schedule.default_timezone)?;
            let today = local_now(Utc::now(), tz).date();
            let report = apply_brief_plan(&tasks, &entries, today)?;
            println!(
                "Cleared {}, applied {}, {} failure(s)",
                report.cleared.len(),
                report.applied.len(),
                report.failures.len()
            );
            for (task_id, err) in &report.failures {
                eprintln!("  {task_id}: {err}");
            }
            store.log_event(
                "info",
                "plan_applied",
                serde_json::json!({
                    "applied": report.applied.len(),
                    "failures": report.failures.len(),
                }),
                None,
            )?;
        }
        Command::Action { json } => {
            let (cfg, store, tasks, chat) = connect()?;
            let payload: handlers::ActionPayload =
                serde_json::from_str(&json).context("parse action payload")?;
            let tz = jobs::resolve_timezone(
                &JobContext {
                    store: &store,
                    tasks: &tasks,
                    chat: &chat,
                    config: &cfg,
                },
                &payload.user_id,
            );
            let today = local_now(Utc::now(), tz).date();
            let outcome = handlers::handle_brief_action(&store, &tasks, &payload, today)?;
            println!("{outcome:?}");
        }
        Command::Events { limit } => {
            let (_cfg, store) = open_store_only()?;
            for event in store.recent_events(limit)? {
                println!(
                    "{} [{}] {} {}",
                    event.timestamp.to_rfc3339(),
                    event.severity,
                    event.action,
                    event.payload
                );
            }
        }
    }

    Ok(())
}

/// Everything the jobs need. Tokens come from the environment and are
/// required here, not at first use.
fn connect() -> Result<(Config, SqliteStore, RestTaskClient, HttpChatClient)> {
    let cfg = config::load_config()?;
    let policy = cfg.retry_policy();
    let store = SqliteStore::open(&cfg.db_path()?, policy)?;
    let tasks = RestTaskClient::new(
        &cfg.taskstore.base_url,
        config::require_token(TASKSTORE_TOKEN_VAR, "task-store")?,
        policy,
    );
    let chat = HttpChatClient::new(
        &cfg.chat.base_url,
        config::require_token(CHAT_TOKEN_VAR, "chat")?,
        policy,
    );
    Ok((cfg, store, tasks, chat))
}

fn open_store_only() -> Result<(Config, SqliteStore)> {
    let cfg = config::load_config()?;
    let store = SqliteStore::open(&cfg.db_path()?, cfg.retry_policy())?;
    Ok((cfg, store))
}

fn roster(cfg: &Config, user: Option<String>) -> Result<Vec<String>> {
    match user {
        Some(u) => Ok(vec![u]),
        None if cfg.users.active.is_empty() => {
            anyhow::bail!("no active users configured; pass --user or edit config.toml")
        }
        None => Ok(cfg.users.active.clone()),
    }
}

fn this_week(cfg: &Config, chat: &HttpChatClient, user_id: &str) -> chrono::NaiveDate {
    use daybrief_api::ChatGateway;
    let tz = chat
        .user_timezone(user_id)
        .ok()
        .or_else(|| parse_tz(&cfg.schedule.default_timezone).ok())
        .unwrap_or(chrono_tz::UTC);
    week_start(local_now(Utc::now(), tz).date())
}

fn outcome(ok: bool) -> &'static str {
    if ok {
        "ok"
    } else {
        "failed (see events)"
    }
}

fn print_bucket(title: &str, tasks: &[Task]) {
    println!("{title}:");
    if tasks.is_empty() {
        println!("  (none)");
        return;
    }
    for t in tasks {
        let due = t
            .due
            .map(|d| format!(" due {}", d.date))
            .unwrap_or_default();
        println!("  [P{}] {}{due}", t.priority, t.content);
    }
}

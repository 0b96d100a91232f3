//! Outbound message text.
//!
//! Plain text only; formatting stays here so the jobs read as logic.

use daybrief_core::Task;
use daybrief_store::SurfacedTask;

pub fn morning_brief(tasks: &[Task]) -> String {
    let mut out = String::from("Good morning! Here's your focus for today:\n");
    for (i, task) in tasks.iter().enumerate() {
        out.push_str(&format!("{}. {}", i + 1, task.content));
        if task.priority == 1 {
            out.push_str(" [P1]");
        }
        if let Some(due) = &task.due {
            out.push_str(&format!(" (due {})", due.date));
        }
        out.push('\n');
    }
    out.push_str("\nReply `done <n>` or use the buttons to check things off.");
    out
}

pub fn no_tasks_brief() -> String {
    "Good morning! Nothing on your plate today. Enjoy the open runway.".to_string()
}

pub fn brief_fallback() -> String {
    "Good morning! I couldn't pull your tasks just now. \
     I'll have your brief ready next time."
        .to_string()
}

pub fn evening_wrap(done: &[&SurfacedTask], open: &[&SurfacedTask]) -> String {
    let mut out = String::from("Evening wrap-up.\n");
    if done.is_empty() {
        out.push_str("Nothing checked off from this morning's brief yet.\n");
    } else {
        out.push_str(&format!("Completed {} of today's picks:\n", done.len()));
        for t in done {
            out.push_str(&format!("  \u{2713} {}\n", t.content));
        }
    }
    if !open.is_empty() {
        out.push_str("Still open:\n");
        for t in open {
            out.push_str(&format!("  \u{2022} {}\n", t.content));
        }
        out.push_str("They'll carry into tomorrow's brief.\n");
    }
    out
}

pub fn wrap_fallback() -> String {
    "Couldn't assemble tonight's wrap-up. Tomorrow's brief will still pick up \
     where you left off."
        .to_string()
}

pub fn weekly_prompt() -> String {
    "New week! What are the 1-3 outcomes that would make this week a win? \
     Reply with `outcomes: first; second; third`."
        .to_string()
}

pub fn score_prompt(task: &Task) -> String {
    format!(
        "How would you score \"{}\"? Reply `impact/urgency/energy`, \
         e.g. `4/3/am` (1-5 scales, energy am or pm).",
        task.content
    )
}

pub fn score_invalid() -> String {
    "I didn't catch that. Scores look like `4/3/am`: impact 1-5, \
     urgency 1-5, energy am or pm."
        .to_string()
}

pub fn score_saved(content: &str, total: i32) -> String {
    format!("Got it. \"{content}\" scored, total {total}.")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use daybrief_core::Due;

    #[test]
    fn test_morning_brief_numbers_tasks_and_flags_p1() {
        let tasks = vec![
            Task::new("a", "Ship the migration").with_priority(1),
            Task::new("b", "Review the draft")
                .with_due(Due::date_only(NaiveDate::from_ymd_opt(2026, 3, 2).unwrap())),
        ];
        let text = morning_brief(&tasks);
        assert!(text.contains("1. Ship the migration [P1]"));
        assert!(text.contains("2. Review the draft (due 2026-03-02)"));
    }

    #[test]
    fn test_evening_wrap_mentions_carryover_only_when_open_remain() {
        let done = SurfacedTask {
            user_id: "U1".into(),
            task_id: "a".into(),
            content: "Ship it".into(),
            surfaced_at: chrono::Utc::now(),
            surfaced_on: NaiveDate::from_ymd_opt(2026, 3, 2).unwrap(),
            status: daybrief_store::SurfacedStatus::Completed,
        };
        let all_done = evening_wrap(&[&done], &[]);
        assert!(all_done.contains("Completed 1"));
        assert!(!all_done.contains("carry into tomorrow"));

        let with_open = evening_wrap(&[], &[&done]);
        assert!(with_open.contains("Still open"));
        assert!(with_open.contains("carry into tomorrow"));
    }
}

//! Duration extraction and deep-work classification.
//!
//! Pure string functions: no clock, no I/O. Pattern order matters — hour
//! forms are tried before minute forms so "2h" never parses as 2 minutes.

use regex::Regex;
use std::sync::OnceLock;

/// Keywords that mark a task as likely deep work when no explicit duration
/// is present.
pub const DEEP_WORK_KEYWORDS: &[&str] = &[
    "plan",
    "design",
    "architect",
    "analyze",
    "research",
    "write",
    "create",
    "develop",
    "implement",
    "review",
    "presentation",
    "proposal",
    "strategy",
    "report",
];

/// Default duration assigned when only a deep-work keyword matches.
pub const DEFAULT_DEEP_WORK_MINUTES: u32 = 30;

/// Minimum duration that qualifies as deep work on its own.
pub const DEEP_WORK_THRESHOLD_MINUTES: u32 = 15;

fn duration_patterns() -> &'static [(Regex, u32)] {
    static PATTERNS: OnceLock<Vec<(Regex, u32)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        // (pattern, multiplier to minutes); checked in order.
        vec![
            (Regex::new(r"(\d+)\s*(?:hours?|hrs?|h)\b").unwrap(), 60),
            (Regex::new(r"(\d+)\s*(?:minutes?|mins?|m)\b").unwrap(), 1),
            (Regex::new(r"(\d+)min\b").unwrap(), 1),
            (Regex::new(r"~(\d+)m\b").unwrap(), 1),
        ]
    })
}

/// Extract an estimated duration in minutes from free task text.
///
/// Explicit forms win ("2 hours", "30 minutes", "45min", "~20m"); otherwise
/// a deep-work keyword implies [`DEFAULT_DEEP_WORK_MINUTES`].
pub fn extract_duration(text: &str) -> Option<u32> {
    let text = text.to_lowercase();

    for (pattern, multiplier) in duration_patterns() {
        if let Some(caps) = pattern.captures(&text) {
            if let Ok(n) = caps[1].parse::<u32>() {
                return Some(n * multiplier);
            }
        }
    }

    if DEEP_WORK_KEYWORDS.iter().any(|k| text.contains(k)) {
        return Some(DEFAULT_DEEP_WORK_MINUTES);
    }

    None
}

/// Whether a task qualifies as deep work.
///
/// True when the duration (given or inferred from the text) reaches the
/// threshold, or when the text carries any deep-work keyword.
pub fn is_deep_work(text: &str, duration_minutes: Option<u32>) -> bool {
    let duration = duration_minutes.or_else(|| extract_duration(text));
    if duration.is_some_and(|d| d >= DEEP_WORK_THRESHOLD_MINUTES) {
        return true;
    }

    let text = text.to_lowercase();
    DEEP_WORK_KEYWORDS.iter().any(|k| text.contains(k))
}

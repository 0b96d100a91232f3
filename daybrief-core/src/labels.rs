//! Label codec: typed score data carried as task-store labels.
//!
//! Labels are the only arbitrary-metadata channel the upstream task-store
//! exposes, so scores ride along as `impact{N}` / `urgency{N}` /
//! `energy_{am|pm}`. Decoding is lenient: malformed numeric suffixes are
//! ignored and contribute nothing.

use crate::score::Energy;

/// Revenue-driver flag label.
pub const REV_DRIVER_LABEL: &str = "rev_driver";

/// Deep-work marker label (tasks estimated at 30+ minutes).
pub const DEEP_WORK_LABEL: &str = "t_30plus";

/// Carryover label: marks a task as part of today's committed set.
pub const CARRYOVER_LABEL: &str = "top_today";

const IMPACT_PREFIX: &str = "impact";
const URGENCY_PREFIX: &str = "urgency";
const ENERGY_PREFIX: &str = "energy_";

/// Scores decoded from a task's label set. Absent or malformed axes are 0 /
/// `None`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DecodedScores {
    pub impact: u8,
    pub urgency: u8,
    pub energy: Option<Energy>,
}

/// Encode a score triple as its three labels.
pub fn encode_score_labels(impact: u8, urgency: u8, energy: Energy) -> [String; 3] {
    [
        format!("{IMPACT_PREFIX}{impact}"),
        format!("{URGENCY_PREFIX}{urgency}"),
        format!("{ENERGY_PREFIX}{}", energy.as_str()),
    ]
}

/// Decode score labels out of a task's label set.
pub fn decode_score_labels<S: AsRef<str>>(labels: &[S]) -> DecodedScores {
    let mut decoded = DecodedScores::default();

    for label in labels {
        let label = label.as_ref();
        if let Some(rest) = label.strip_prefix(ENERGY_PREFIX) {
            decoded.energy = Energy::parse(rest);
        } else if let Some(rest) = label.strip_prefix(URGENCY_PREFIX) {
            if let Ok(n) = rest.parse::<u8>() {
                decoded.urgency = n;
            }
        } else if let Some(rest) = label.strip_prefix(IMPACT_PREFIX) {
            if let Ok(n) = rest.parse::<u8>() {
                decoded.impact = n;
            }
        }
    }

    decoded
}

/// Whether a label is one of the score-encoding labels.
pub fn is_score_label(label: &str) -> bool {
    label.starts_with(IMPACT_PREFIX)
        || label.starts_with(URGENCY_PREFIX)
        || label.starts_with(ENERGY_PREFIX)
}

/// Drop stale score labels, keeping everything else in order.
pub fn strip_score_labels(labels: &[String]) -> Vec<String> {
    labels
        .iter()
        .filter(|l| !is_score_label(l))
        .cloned()
        .collect()
}

//! daybrief-core: pure scheduling logic for the daily brief engine.
//!
//! Everything in this crate is a deterministic function of its inputs; the
//! clock is always an explicit parameter. I/O lives in the store, api, and
//! cli crates.

pub mod brief;
pub mod classify;
pub mod gate;
pub mod labels;
pub mod retry;
pub mod score;
pub mod sort;
pub mod task;
pub mod time;

pub use brief::{
    group_for_picker, select_brief_tasks, BriefBuckets, PickerGroups, PlanEntry,
    DEFAULT_MAX_UNDATED_P1,
};
pub use classify::{extract_duration, is_deep_work, DEEP_WORK_KEYWORDS};
pub use gate::{within_window, Cadence, Schedule, DEFAULT_WINDOW_TOLERANCE_MIN};
pub use labels::{
    decode_score_labels, encode_score_labels, strip_score_labels, DecodedScores, CARRYOVER_LABEL,
    DEEP_WORK_LABEL, REV_DRIVER_LABEL,
};
pub use retry::RetryPolicy;
pub use score::{parse_score_input, total_score, Energy, ScoreInput};
pub use sort::{priority_score, sort_tasks};
pub use task::{Due, Task};
pub use time::{local_now, parse_tz};

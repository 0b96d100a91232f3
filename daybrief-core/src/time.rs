//! Time utilities: timezone resolution and user-local clocks.

use anyhow::Result;
use chrono::{DateTime, NaiveDateTime, Utc};
use chrono_tz::Tz;

/// Parse an IANA timezone name like "America/Chicago".
pub fn parse_tz(name: &str) -> Result<Tz> {
    name.parse()
        .map_err(|_| anyhow::anyhow!("invalid timezone: {name}"))
}

/// A UTC instant as the user's local naive datetime.
pub fn local_now(now: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    now.with_timezone(&tz).naive_local()
}

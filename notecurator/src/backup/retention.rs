//! Retention strings such as `30d`, `2w`, `12h` or `6m`.

use chrono::{Duration, Utc};
use regex::Regex;
use std::sync::LazyLock;

static RETENTION_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)([dwhm])$").unwrap());

/// Days in a retention "month"
const DAYS_PER_MONTH: i64 = 30;

pub fn is_valid_retention(value: &str) -> bool {
    parse_retention(value).is_ok()
}

/// Parse a retention string into a duration.
pub fn parse_retention(value: &str) -> Result<Duration, String> {
    let cap = RETENTION_RE
        .captures(value.trim())
        .ok_or_else(|| format!("invalid retention '{}': expected <number><d|w|h|m>", value))?;
    let amount: i64 = cap[1]
        .parse()
        .map_err(|_| format!("retention amount out of range: '{}'", value))?;

    let duration = match &cap[2] {
        "h" => Duration::try_hours(amount),
        "d" => Duration::try_days(amount),
        "w" => Duration::try_weeks(amount),
        _ => amount.checked_mul(DAYS_PER_MONTH).and_then(Duration::try_days),
    };
    duration
        .filter(|d| Utc::now().checked_sub_signed(*d).is_some())
        .ok_or_else(|| format!("retention amount out of range: '{}'", value))
}

use chrono::NaiveDate;
use regex::Regex;
use std::sync::OnceLock;

use crate::error::{Result, TrackerError};
use crate::models::DATE_FORMAT;

/// Interactive entry gives up after this many consecutive bad deadlines
pub const MAX_DEADLINE_ATTEMPTS: usize = 3;

// Day 00 and day 31 of short months pass here and are caught by the date parse.
const DEADLINE_PATTERN: &str = r"^(20[2-9][0-9])-(0[0-9]|1[0-2])-([0-2][0-9]|3[0-1])$";

fn deadline_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(DEADLINE_PATTERN).expect("deadline pattern is a valid regex"))
}

/// Checks a `YYYY-MM-DD` deadline against the pattern, the calendar and `today`
pub fn validate_deadline(value: &str, today: NaiveDate) -> Result<NaiveDate> {
    let invalid = |reason: &str| TrackerError::InvalidDeadline {
        value: value.to_string(),
        reason: reason.to_string(),
    };

    if !deadline_regex().is_match(value) {
        return Err(invalid(
            "expected YYYY-MM-DD with a year from 2020 to 2099, e.g. 2025-01-30",
        ));
    }
    let date =
        NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|_| invalid("not a calendar date"))?;
    if date < today {
        return Err(invalid("deadline must be today or later"));
    }
    Ok(date)
}

pub fn is_valid_deadline(value: &str, today: NaiveDate) -> bool {
    validate_deadline(value, today).is_ok()
}

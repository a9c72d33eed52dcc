// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for calendar-day arithmetic.
//!
//! All "due today" and habit-log computations work on **local wall-clock**
//! calendar days, never UTC instants, to avoid timezone-boundary
//! mismatches around midnight.

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

/// Current wall-clock time as unix seconds.
pub fn unix_now() -> i64 {
    Utc::now().timestamp()
}

/// Today's calendar day in the local timezone.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Canonical habit-log key for a calendar day ("YYYY-MM-DD").
pub fn day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Parse a habit-log key back into a calendar day.
pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, "%Y-%m-%d").ok()
}

/// Start of a calendar day as a local instant.
///
/// Falls back to the earliest valid instant on days with a DST gap at
/// midnight.
pub fn start_of_local_day(day: NaiveDate) -> DateTime<Local> {
    match Local.from_local_datetime(&day.and_hms_opt(0, 0, 0).expect("00:00:00 is valid")) {
        chrono::LocalResult::Single(dt) | chrono::LocalResult::Ambiguous(dt, _) => dt,
        chrono::LocalResult::None => day
            .and_hms_opt(1, 0, 0)
            .and_then(|ndt| Local.from_local_datetime(&ndt).earliest())
            .unwrap_or_else(Local::now),
    }
}

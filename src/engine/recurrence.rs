// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Thin wrapper over the recurrence-rule engine.
//!
//! A habit is "due" on a day iff its next occurrence at-or-after the
//! start of that day falls on the same **local wall-clock** calendar day.
//! The comparison is start-of-day, never exact-instant: a rule firing at
//! 14:00 counts as due for the whole day.

use chrono::{DateTime, Duration, Local, NaiveDate};
use rrule::{RRuleSet, Tz};
use std::collections::HashMap;

use crate::models::Habit;
use crate::time_utils::start_of_local_day;

/// First occurrence of `rule` at or after `from`.
pub fn next_occurrence(rule: &RRuleSet, from: DateTime<Local>) -> Option<DateTime<Local>> {
    // The iterator bound is exclusive; back off one second so an
    // occurrence exactly at `from` is included.
    let bound = (from - Duration::seconds(1)).with_timezone(&Tz::LOCAL);
    rule.clone()
        .after(bound)
        .all(1)
        .dates
        .into_iter()
        .next()
        .map(|occurrence| occurrence.with_timezone(&Local))
}

/// Whether `rule` has an occurrence on the given local calendar day.
pub fn due_on(rule: &RRuleSet, day: NaiveDate) -> bool {
    next_occurrence(rule, start_of_local_day(day))
        .is_some_and(|occurrence| occurrence.date_naive() == day)
}

/// Subset of `habits` due on the given day, keyed by habit id.
pub fn habits_due_on(habits: &HashMap<String, Habit>, day: NaiveDate) -> HashMap<String, Habit> {
    habits
        .iter()
        .filter(|(_, habit)| due_on(&habit.rule, day))
        .map(|(id, habit)| (id.clone(), habit.clone()))
        .collect()
}

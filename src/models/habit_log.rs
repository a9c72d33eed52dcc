//! Per-day, per-habit completion records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::time_utils::day_key;

/// Completion record for one calendar day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/lib/generated/")
)]
pub struct DayRecord {
    /// Set once the backfill pass has applied reward/penalty effects for
    /// this day; guards against reapplying them.
    #[serde(default)]
    pub calculated: bool,
    /// Completion flags keyed by habit id. An absent entry reads as
    /// "not completed".
    #[serde(default)]
    pub habits: HashMap<String, bool>,
}

/// Habit completion log: ISO date string ("YYYY-MM-DD") -> day record.
///
/// Ordered so day walks and serialized snapshots are deterministic.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HabitLog {
    days: BTreeMap<String, DayRecord>,
}

impl HabitLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn day(&self, day: NaiveDate) -> Option<&DayRecord> {
        self.days.get(&day_key(day))
    }

    pub fn days(&self) -> impl Iterator<Item = (&String, &DayRecord)> {
        self.days.iter()
    }

    /// Whether the backfill pass has already processed this day.
    pub fn is_calculated(&self, day: NaiveDate) -> bool {
        self.day(day).is_some_and(|record| record.calculated)
    }

    pub fn mark_calculated(&mut self, day: NaiveDate) {
        self.days.entry(day_key(day)).or_default().calculated = true;
    }

    /// Completion flag for a habit on a day; absent entries read false.
    pub fn is_completed(&self, day: NaiveDate, habit_id: &str) -> bool {
        self.day(day)
            .and_then(|record| record.habits.get(habit_id))
            .copied()
            .unwrap_or(false)
    }

    /// Record a completion toggle. Never flips `calculated`.
    pub fn set_completion(&mut self, day: NaiveDate, habit_id: &str, completed: bool) {
        self.days
            .entry(day_key(day))
            .or_default()
            .habits
            .insert(habit_id.to_string(), completed);
    }

    /// Merge day records in, last write wins per day.
    pub fn append(&mut self, entries: BTreeMap<String, DayRecord>) {
        self.days.extend(entries);
    }
}

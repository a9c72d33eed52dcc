// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Consecutive-completed-day streaks with memoized partial results.

use chrono::NaiveDate;
use dashmap::DashMap;
use std::collections::HashMap;

use crate::models::HabitLog;
use crate::time_utils::day_key;

/// Wire shape persisted under `{uid}-latestStreaks`: habit id -> a
/// single-entry map of date string -> streak count at that date.
pub type StreakMemoWire = HashMap<String, HashMap<String, u32>>;

#[derive(Debug, Clone)]
struct MemoEntry {
    date: String,
    count: u32,
}

/// Streak calculator.
///
/// The memo holds exactly one entry per habit (the most recent completed
/// walk), so repeated queries for a fixed reference date cost one lookup
/// instead of re-walking the whole prefix, with bounded memory.
#[derive(Debug, Default)]
pub struct StreakTracker {
    memo: DashMap<String, MemoEntry>,
}

impl StreakTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consecutive completed days for `habit_id` ending at (and including,
    /// if completed) `reference`.
    pub fn calculate(&self, log: &HabitLog, habit_id: &str, reference: NaiveDate) -> u32 {
        let memoized = self
            .memo
            .get(habit_id)
            .map(|entry| (entry.date.clone(), entry.count));

        let mut total = 0u32;
        let mut day = reference;
        loop {
            let key = day_key(day);
            if let Some((date, count)) = &memoized {
                if *date == key {
                    total += count;
                    break;
                }
            }
            if !log.is_completed(day, habit_id) {
                break;
            }
            total += 1;
            match day.pred_opt() {
                Some(previous) => day = previous,
                None => break,
            }
        }

        // Replaces, not accumulates: one memo entry per habit at a time.
        self.memo.insert(
            habit_id.to_string(),
            MemoEntry {
                date: day_key(reference),
                count: total,
            },
        );
        total
    }

    pub fn is_empty(&self) -> bool {
        self.memo.is_empty()
    }

    /// Export for persistence to the local cache store.
    pub fn to_wire(&self) -> StreakMemoWire {
        self.memo
            .iter()
            .map(|entry| {
                (
                    entry.key().clone(),
                    HashMap::from([(entry.value().date.clone(), entry.value().count)]),
                )
            })
            .collect()
    }

    /// Restore a persisted memo; extra entries per habit beyond the first
    /// are ignored (the memo is single-entry by construction).
    pub fn load_wire(&self, wire: StreakMemoWire) {
        for (habit_id, dates) in wire {
            if let Some((date, count)) = dates.into_iter().next() {
                self.memo.insert(habit_id, MemoEntry { date, count });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn log_with_run(habit_id: &str, end: NaiveDate, len: u32) -> HabitLog {
        let mut log = HabitLog::new();
        let mut day = end;
        for _ in 0..len {
            log.set_completion(day, habit_id, true);
            day = day.pred_opt().unwrap();
        }
        log
    }

    #[test]
    fn test_five_day_run_counts_five() {
        let reference = d(2024, 5, 10);
        let log = log_with_run("habit-1", reference, 5);
        let tracker = StreakTracker::new();

        assert_eq!(tracker.calculate(&log, "habit-1", reference), 5);
    }

    #[test]
    fn test_repeat_call_hits_memo_on_first_iteration() {
        let reference = d(2024, 5, 10);
        let log = log_with_run("habit-1", reference, 5);
        let tracker = StreakTracker::new();

        assert_eq!(tracker.calculate(&log, "habit-1", reference), 5);

        // Second call must short-circuit off the memo, not re-walk: an
        // empty log would return 0 if the walk actually ran.
        let empty = HabitLog::new();
        assert_eq!(tracker.calculate(&empty, "habit-1", reference), 5);
    }

    #[test]
    fn test_memo_extends_instead_of_rewalking() {
        let reference = d(2024, 5, 10);
        let log = log_with_run("habit-1", reference, 5);
        let tracker = StreakTracker::new();
        tracker.calculate(&log, "habit-1", reference);

        let next_day = d(2024, 5, 11);
        let mut extended = log.clone();
        extended.set_completion(next_day, "habit-1", true);

        assert_eq!(tracker.calculate(&extended, "habit-1", next_day), 6);
    }

    #[test]
    fn test_uncompleted_reference_day_is_zero() {
        let log = log_with_run("habit-1", d(2024, 5, 9), 3);
        let tracker = StreakTracker::new();

        assert_eq!(tracker.calculate(&log, "habit-1", d(2024, 5, 10)), 0);
    }

    #[test]
    fn test_gap_breaks_streak() {
        let reference = d(2024, 5, 10);
        let mut log = log_with_run("habit-1", reference, 2);
        // 2024-05-08 missing, then more completions further back
        log.set_completion(d(2024, 5, 7), "habit-1", true);
        let tracker = StreakTracker::new();

        assert_eq!(tracker.calculate(&log, "habit-1", reference), 2);
    }

    #[test]
    fn test_streaks_are_per_habit() {
        let reference = d(2024, 5, 10);
        let mut log = log_with_run("habit-1", reference, 4);
        log.set_completion(reference, "habit-2", true);
        let tracker = StreakTracker::new();

        assert_eq!(tracker.calculate(&log, "habit-1", reference), 4);
        assert_eq!(tracker.calculate(&log, "habit-2", reference), 1);
    }

    #[test]
    fn test_wire_round_trip() {
        let reference = d(2024, 5, 10);
        let log = log_with_run("habit-1", reference, 5);
        let tracker = StreakTracker::new();
        tracker.calculate(&log, "habit-1", reference);

        let restored = StreakTracker::new();
        restored.load_wire(tracker.to_wire());

        // Memo survives: empty log still answers from the restored memo.
        let empty = HabitLog::new();
        assert_eq!(restored.calculate(&empty, "habit-1", reference), 5);
    }
}

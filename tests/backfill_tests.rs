// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backfill: retroactive reward/penalty application for elapsed days.

mod common;

use common::{daily_habit, days_ago, harness, marked_user_data, TestHarness, UID};
use habitforge::models::UserData;
use habitforge::time_utils::local_today;

/// Local-only snapshot with one habit and a completion pattern.
fn snapshot_with_habit(
    habit_id: &str,
    activity_id: &str,
    neglection: bool,
    completed_days_ago: &[u64],
) -> UserData {
    let mut data = marked_user_data(1000, "baseline");
    let habit = daily_habit(habit_id, activity_id, neglection);
    data.habits.insert(habit_id.to_string(), habit.clone());
    data.current_habits.insert(habit_id.to_string(), habit);
    for days in completed_days_ago {
        data.habit_data
            .set_completion(days_ago(*days), habit_id, true);
    }
    data
}

async fn loaded_with(data: UserData, created_days_ago: u64) -> TestHarness {
    let h = harness(days_ago(created_days_ago), 1000);
    h.local.write_snapshot(UID, &data).await.unwrap();
    h.engine.load().await.unwrap();
    h
}

#[tokio::test]
async fn backfill_replays_rewards_and_penalties() {
    // Account 5 days old; completed the last 3 days, missed the 2 before.
    let data = snapshot_with_habit("habit-1", "default-workout", true, &[1, 2, 3]);
    let h = loaded_with(data, 5).await;

    let summary = h.engine.run_backfill().await.unwrap();

    assert_eq!(summary.days_processed, 5);
    assert_eq!(summary.rewards_applied, 3);
    assert_eq!(summary.penalties_applied, 2);

    // Difficulty 3: +10 xp / +20 gold per completion, -10 xp and no gold
    // per neglected miss. Three rewards cross two level thresholds.
    let stats = h.engine.stats();
    assert_eq!(stats.gold, 60);
    assert_eq!(stats.level, 3);
    assert_eq!(stats.xp, 0);
    assert_ne!(stats.discipline, 50.0);
    assert_ne!(stats.physical, 50.0);

    // Every walked day is now guarded; today is untouched.
    let log = h.engine.habit_log();
    for days in 1..=5 {
        assert!(log.is_calculated(days_ago(days)), "day -{days}");
    }
    assert!(!log.is_calculated(local_today()));
}

#[tokio::test]
async fn backfill_is_idempotent() {
    let data = snapshot_with_habit("habit-1", "default-workout", true, &[1, 2]);
    let h = loaded_with(data, 4).await;

    let first = h.engine.run_backfill().await.unwrap();
    assert!(!first.is_noop());
    let stats_after_first = h.engine.stats();

    let second = h.engine.run_backfill().await.unwrap();

    assert!(second.is_noop());
    assert_eq!(second.total_effects(), 0);
    assert_eq!(h.engine.stats(), stats_after_first);
}

#[tokio::test]
async fn missed_days_without_neglection_cost_nothing() {
    // Habit never completed, neglection off: days are skipped silently.
    let data = snapshot_with_habit("habit-1", "default-workout", false, &[]);
    let h = loaded_with(data, 4).await;
    let before = h.engine.stats();

    let summary = h.engine.run_backfill().await.unwrap();

    assert_eq!(summary.days_processed, 4);
    assert_eq!(summary.rewards_applied, 0);
    assert_eq!(summary.penalties_applied, 0);

    let after = h.engine.stats();
    assert_eq!(after.discipline, before.discipline);
    assert_eq!(after.xp, before.xp);
    assert_eq!(after.gold, before.gold);
}

#[tokio::test]
async fn walk_stops_at_first_calculated_day() {
    let mut data = snapshot_with_habit("habit-1", "default-workout", true, &[1, 2]);
    // Day -3 already processed by a previous session; the walk must stop
    // there and leave the older uncalculated days alone.
    data.habit_data.mark_calculated(days_ago(3));
    let h = loaded_with(data, 10).await;

    let summary = h.engine.run_backfill().await.unwrap();

    assert_eq!(summary.days_processed, 2);
    let log = h.engine.habit_log();
    assert!(log.is_calculated(days_ago(1)));
    assert!(log.is_calculated(days_ago(2)));
    assert!(!log.is_calculated(days_ago(4)), "beyond the stop point");
}

#[tokio::test]
async fn brand_new_account_is_a_noop() {
    let h = harness(local_today(), 1000);
    h.engine.load().await.unwrap();

    let summary = h.engine.run_backfill().await.unwrap();

    assert!(summary.is_noop());
}

#[tokio::test]
async fn dangling_activity_reference_is_skipped_not_fatal() {
    let data = snapshot_with_habit("habit-1", "ghost-activity", true, &[1]);
    let h = loaded_with(data, 3).await;
    let before = h.engine.stats();

    let summary = h.engine.run_backfill().await.unwrap();

    // Days still get marked so the walk terminates on later launches.
    assert_eq!(summary.days_processed, 3);
    assert_eq!(summary.total_effects(), 0);
    assert_eq!(h.engine.stats(), before);
}

#[tokio::test]
async fn retired_habits_are_not_backfilled() {
    // The habit exists in history but was removed from the active set;
    // backfill consults only current habits.
    let mut data = snapshot_with_habit("habit-1", "default-workout", true, &[1, 2]);
    data.current_habits.clear();
    let h = loaded_with(data, 4).await;
    let before = h.engine.stats();

    let summary = h.engine.run_backfill().await.unwrap();

    assert_eq!(summary.days_processed, 4);
    assert_eq!(summary.total_effects(), 0);
    assert_eq!(h.engine.stats(), before);
}

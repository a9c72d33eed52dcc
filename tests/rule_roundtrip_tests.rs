// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Serialization round-trips for rule-bearing models.

mod common;

use habitforge::models::{Habit, Todo};
use rrule::RRuleSet;

fn occurrences(rule: &RRuleSet, count: u16) -> Vec<String> {
    rule.clone()
        .all(count)
        .dates
        .into_iter()
        .map(|date| date.to_rfc3339())
        .collect()
}

#[test]
fn habit_round_trip_reproduces_occurrences() {
    let habit = common::daily_habit("habit-1", "default-workout", true);

    let json = serde_json::to_string(&habit).unwrap();
    let revived: Habit = serde_json::from_str(&json).unwrap();

    // The revived rule must generate the same schedule, not just parse.
    assert_eq!(occurrences(&habit.rule, 10), occurrences(&revived.rule, 10));
}

#[test]
fn complex_weekly_rule_survives_round_trip() {
    let mut habit = common::daily_habit("habit-1", "default-workout", false);
    habit.rule = "DTSTART:20240101T090000Z\nRRULE:FREQ=WEEKLY;BYDAY=MO,WE,FR;INTERVAL=2"
        .parse()
        .unwrap();

    let json = serde_json::to_string(&habit).unwrap();
    let revived: Habit = serde_json::from_str(&json).unwrap();

    assert_eq!(occurrences(&habit.rule, 10), occurrences(&revived.rule, 10));
}

#[test]
fn reminder_rule_round_trips_when_present() {
    let mut habit = common::daily_habit("habit-1", "default-workout", false);
    habit.reminder = Some(
        "DTSTART:20240101T200000Z\nRRULE:FREQ=DAILY"
            .parse()
            .unwrap(),
    );

    let json = serde_json::to_value(&habit).unwrap();
    assert!(json["reminder"].is_string());

    let revived: Habit = serde_json::from_value(json).unwrap();
    let reminder = revived.reminder.expect("reminder revived");
    assert_eq!(
        occurrences(habit.reminder.as_ref().unwrap(), 5),
        occurrences(&reminder, 5)
    );
}

#[test]
fn absent_reminder_stays_absent() {
    let habit = common::daily_habit("habit-1", "default-workout", false);
    let json = serde_json::to_value(&habit).unwrap();
    assert!(json.get("reminder").is_none());

    let revived: Habit = serde_json::from_value(json).unwrap();
    assert!(revived.reminder.is_none());
}

#[test]
fn todo_dates_revive_as_instants() {
    let todo = Todo {
        id: "todo-1".to_string(),
        activity_id: "default-reading".to_string(),
        neglection: false,
        due: "2024-06-01T14:30:00Z".parse().unwrap(),
        reminder: Some("2024-06-01T09:00:00Z".parse().unwrap()),
        name: None,
        description: None,
        icon: None,
    };

    let json = serde_json::to_string(&todo).unwrap();
    let revived: Todo = serde_json::from_str(&json).unwrap();

    assert_eq!(revived.due, todo.due);
    assert_eq!(revived.reminder, todo.reminder);
}

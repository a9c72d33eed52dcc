// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! The atomic sync blob and its schema migrations.
//!
//! The habit/todo shape evolved across app revisions; blobs loaded from
//! the local cache or the remote store pass through explicit versioned
//! migration functions instead of ad-hoc optional-field guessing.

use chrono::DateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::error::{AppError, Result};
use crate::models::{Activity, Habit, HabitLog, Todo};

/// Current schema version written by this build.
pub const SCHEMA_VERSION: u32 = 2;

fn current_schema_version() -> u32 {
    SCHEMA_VERSION
}

/// Everything synchronized as one unit: whichever side (local/remote) has
/// the larger `last_updated` wins whole, no field-level merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserData {
    #[serde(default = "current_schema_version")]
    pub schema_version: u32,
    pub activities: HashMap<String, Activity>,
    /// Historical record of every habit ever created.
    pub habits: HashMap<String, Habit>,
    /// Active subset; removal evicts from here only.
    pub current_habits: HashMap<String, Habit>,
    pub todos: HashMap<String, Todo>,
    pub habit_data: HabitLog,
    /// Unix seconds; monotonic per user.
    pub last_updated: i64,
}

/// Parse a raw blob (any known schema version) into the current shape.
pub fn migrate_user_data(mut value: Value) -> Result<UserData> {
    let version = value
        .get("schemaVersion")
        .and_then(Value::as_u64)
        .unwrap_or(1) as u32;

    if version > SCHEMA_VERSION {
        return Err(AppError::BadRequest(format!(
            "user data schema {version} is newer than supported {SCHEMA_VERSION}"
        )));
    }

    if version < 2 {
        migrate_v1_to_v2(&mut value);
    }

    if let Some(obj) = value.as_object_mut() {
        obj.insert("schemaVersion".to_string(), SCHEMA_VERSION.into());
    }

    Ok(serde_json::from_value(value)?)
}

/// v1 -> v2: todo due/reminder timestamps were unix seconds, and habit
/// rules could be stored without their DTSTART line.
fn migrate_v1_to_v2(value: &mut Value) {
    if let Some(todos) = value.get_mut("todos").and_then(Value::as_object_mut) {
        for todo in todos.values_mut() {
            for field in ["due", "reminder"] {
                let Some(slot) = todo.get_mut(field) else {
                    continue;
                };
                if let Some(secs) = slot.as_i64() {
                    if let Some(dt) = DateTime::from_timestamp(secs, 0) {
                        *slot = Value::String(dt.to_rfc3339());
                    }
                }
            }
        }
    }

    for key in ["habits", "currentHabits"] {
        if let Some(habits) = value.get_mut(key).and_then(Value::as_object_mut) {
            for habit in habits.values_mut() {
                for field in ["rule", "reminder"] {
                    let Some(slot) = habit.get_mut(field) else {
                        continue;
                    };
                    if let Some(raw) = slot.as_str() {
                        let upgraded = upgrade_bare_rule(raw);
                        if upgraded != raw {
                            *slot = Value::String(upgraded);
                        }
                    }
                }
            }
        }
    }
}

/// Early revisions persisted only the RRULE options string.
fn upgrade_bare_rule(raw: &str) -> String {
    if raw.contains("DTSTART") {
        return raw.to_string();
    }
    let options = raw.strip_prefix("RRULE:").unwrap_or(raw);
    format!("DTSTART:19700101T000000Z\nRRULE:{options}")
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod activity;
pub mod habit;
pub mod habit_log;
pub mod stats;
pub mod user_data;

pub use activity::{default_catalog, Activity, ActivityKind, StatKind};
pub use habit::{Habit, Todo};
pub use habit_log::{DayRecord, HabitLog};
pub use stats::{Stats, StatsUpdate};
pub use user_data::{migrate_user_data, UserData, SCHEMA_VERSION};

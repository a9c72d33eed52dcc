// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Activity templates referenced by habits and todos.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

/// Direction of an activity: completing it is either good or bad for you.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/lib/generated/")
)]
pub enum ActivityKind {
    Positive,
    Negative,
}

/// The six improvable stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/lib/generated/")
)]
pub enum StatKind {
    Discipline,
    Physical,
    Mental,
    Spiritual,
    Social,
    Skill,
}

/// Reusable activity template.
///
/// Immutable once referenced; habits and todos point at it by id and keep
/// their own cached name/icon/description so a deleted activity degrades
/// gracefully instead of breaking referents.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/lib/generated/")
)]
pub struct Activity {
    pub id: String,
    #[validate(length(min = 1, max = 80))]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    /// Improvable stats this activity moves (at most two; discipline moves
    /// on every logged occurrence regardless).
    #[validate(length(max = 2))]
    pub stats: Vec<StatKind>,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
    /// Difficulty scale 1..=5, drives the reward basis.
    #[validate(range(min = 1, max = 5))]
    pub difficulty: u8,
}

impl Activity {
    fn builtin(
        id: &str,
        name: &str,
        description: &str,
        icon: &str,
        stats: &[StatKind],
        kind: ActivityKind,
        difficulty: u8,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            description: description.to_string(),
            icon: icon.to_string(),
            stats: stats.to_vec(),
            kind,
            difficulty,
        }
    }
}

/// Built-in activity catalog seeded for brand-new accounts.
pub fn default_catalog() -> HashMap<String, Activity> {
    let defaults = [
        Activity::builtin(
            "default-workout",
            "Workout",
            "Strength or cardio session",
            "dumbbell",
            &[StatKind::Physical],
            ActivityKind::Positive,
            3,
        ),
        Activity::builtin(
            "default-meditation",
            "Meditation",
            "Ten quiet minutes",
            "flower",
            &[StatKind::Spiritual, StatKind::Mental],
            ActivityKind::Positive,
            2,
        ),
        Activity::builtin(
            "default-reading",
            "Reading",
            "Read a chapter",
            "book-open",
            &[StatKind::Mental, StatKind::Skill],
            ActivityKind::Positive,
            2,
        ),
        Activity::builtin(
            "default-socialize",
            "Socialize",
            "Reach out to a friend",
            "users",
            &[StatKind::Social],
            ActivityKind::Positive,
            2,
        ),
        Activity::builtin(
            "default-junk-food",
            "Junk food",
            "Fast food or sugary snacks",
            "pizza",
            &[StatKind::Physical],
            ActivityKind::Negative,
            2,
        ),
        Activity::builtin(
            "default-doomscrolling",
            "Doomscrolling",
            "Aimless feed scrolling",
            "smartphone",
            &[StatKind::Mental],
            ActivityKind::Negative,
            1,
        ),
    ];

    defaults.into_iter().map(|a| (a.id.clone(), a)).collect()
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reward engine: converts a logged occurrence into XP/gold/stat deltas.

use std::sync::Arc;

use crate::models::activity::{Activity, ActivityKind, StatKind};
use crate::models::stats::{apply_xp, decrease_stat, increase_stat, Stats, StatsUpdate};

/// Callback the UI shell registers to present transient reward feedback.
/// Never invoked for backfilled days.
pub type FeedbackHook = Arc<dyn Fn(&RewardOutcome) + Send + Sync>;

/// Base `(xp, gold)` reward by difficulty.
pub fn reward_basis(difficulty: u8) -> (i64, i64) {
    match difficulty.clamp(1, 5) {
        1 => (2, 5),
        2 => (5, 10),
        3 => (10, 20),
        4 => (17, 35),
        _ => (25, 50),
    }
}

/// Whether this occurrence counts against the user.
///
/// The boolean algebra is a tested contract: a negative activity logged
/// normally, or any activity neglected, flips the reward direction —
/// both at once cancel out.
pub fn is_effective_negative_occurrence(kind: ActivityKind, neglected: i8) -> bool {
    (kind == ActivityKind::Negative) != (neglected == 1)
}

/// One stat movement within a reward.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatChange {
    pub kind: StatKind,
    pub from: f64,
    pub to: f64,
}

/// Everything a logged occurrence changed, for feedback display.
#[derive(Debug, Clone)]
pub struct RewardOutcome {
    pub activity_id: String,
    pub negative: bool,
    pub xp_gain: i64,
    pub gold_gain: i64,
    pub new_level: u32,
    pub leveled_up: bool,
    pub stat_changes: Vec<StatChange>,
}

/// Compute the full effect of logging `activity` against `stats`.
///
/// Pure: the resulting [`StatsUpdate`] merges every delta (xp, level,
/// gold, touched stats) so the caller persists exactly one atomic update.
/// `last_updated` is stamped at apply time.
pub fn compute_reward(
    stats: &Stats,
    activity: &Activity,
    neglected: i8,
) -> (StatsUpdate, RewardOutcome) {
    let (base_xp, base_gold) = reward_basis(activity.difficulty);
    let negative = is_effective_negative_occurrence(activity.kind, neglected);

    // Stat movement always happens; monetary reward only for genuine
    // positive progress.
    let (xp_gain, gold_gain) = if negative { (-base_xp, 0) } else { (base_xp, base_gold) };

    let (new_xp, new_level) = apply_xp(stats.xp, stats.level, xp_gain);
    let new_gold = (stats.gold + gold_gain).max(0);

    let scale = f64::from(activity.difficulty);
    let mut kinds = activity.stats.clone();
    if !kinds.contains(&StatKind::Discipline) {
        kinds.push(StatKind::Discipline);
    }

    let mut touched = Vec::with_capacity(kinds.len());
    let mut stat_changes = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let from = stats.stat(kind);
        let to = if negative {
            decrease_stat(from, scale)
        } else {
            increase_stat(from, scale)
        };
        touched.push((kind, to));
        stat_changes.push(StatChange { kind, from, to });
    }

    let update = StatsUpdate {
        last_updated: 0,
        xp: Some(new_xp),
        level: Some(new_level),
        gold: Some(new_gold),
        gems: None,
        stats: touched,
    };

    let outcome = RewardOutcome {
        activity_id: activity.id.clone(),
        negative,
        xp_gain,
        gold_gain,
        new_level,
        leveled_up: new_level > stats.level,
        stat_changes,
    };

    (update, outcome)
}

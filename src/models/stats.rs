//! User stats and the gamification math.
//!
//! The curves here are a replayed contract: backfill re-applies them for
//! historical days, so any change silently rewrites users' histories.
//! Keep them deterministic and side-effect free.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

use crate::models::activity::StatKind;

/// Lower and upper bounds for every improvable stat.
pub const STAT_MIN: f64 = 1.0;
pub const STAT_MAX: f64 = 100.0;

/// Gamified user stats, one row per user.
///
/// The six improvable stats are bounded to `[1, 100]` with 3-decimal
/// precision; `xp` and `gold` are floored at zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "app/lib/generated/")
)]
pub struct Stats {
    pub uid: String,
    /// Unix seconds; drives last-write-wins on load.
    #[serde(rename = "lastUpdated")]
    pub last_updated: i64,
    pub xp: i64,
    pub level: u32,
    pub gold: i64,
    pub gems: i64,
    pub discipline: f64,
    pub physical: f64,
    pub mental: f64,
    pub spiritual: f64,
    pub social: f64,
    pub skill: f64,
}

impl Stats {
    /// Fresh stats for a new account: level 1, empty purse, all stats at
    /// the scale midpoint.
    pub fn new(uid: &str, now: i64) -> Self {
        Self {
            uid: uid.to_string(),
            last_updated: now,
            xp: 0,
            level: 1,
            gold: 0,
            gems: 0,
            discipline: 50.0,
            physical: 50.0,
            mental: 50.0,
            spiritual: 50.0,
            social: 50.0,
            skill: 50.0,
        }
    }

    pub fn stat(&self, kind: StatKind) -> f64 {
        match kind {
            StatKind::Discipline => self.discipline,
            StatKind::Physical => self.physical,
            StatKind::Mental => self.mental,
            StatKind::Spiritual => self.spiritual,
            StatKind::Social => self.social,
            StatKind::Skill => self.skill,
        }
    }

    pub fn set_stat(&mut self, kind: StatKind, value: f64) {
        let slot = match kind {
            StatKind::Discipline => &mut self.discipline,
            StatKind::Physical => &mut self.physical,
            StatKind::Mental => &mut self.mental,
            StatKind::Spiritual => &mut self.spiritual,
            StatKind::Social => &mut self.social,
            StatKind::Skill => &mut self.skill,
        };
        *slot = value;
    }

    /// Merge a partial update into this row.
    pub fn apply_update(&mut self, update: &StatsUpdate) {
        self.last_updated = update.last_updated;
        if let Some(xp) = update.xp {
            self.xp = xp;
        }
        if let Some(level) = update.level {
            self.level = level;
        }
        if let Some(gold) = update.gold {
            self.gold = gold;
        }
        if let Some(gems) = update.gems {
            self.gems = gems;
        }
        for (kind, value) in &update.stats {
            self.set_stat(*kind, *value);
        }
    }
}

/// Partial stats update, applied atomically: every reward merges its xp,
/// gold, and stat deltas into one of these before anything is persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StatsUpdate {
    #[serde(rename = "lastUpdated")]
    pub last_updated: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gold: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gems: Option<i64>,
    /// Absolute new values for touched stats (not deltas).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub stats: Vec<(StatKind, f64)>,
}

// ─── Leveling curve ──────────────────────────────────────────

/// XP required to level up from `level`.
pub fn level_threshold(level: u32) -> i64 {
    let raw = 5.0 * f64::from(level + 1).powf(1.15) / 5.0;
    raw.round() as i64 * 5
}

/// Apply an XP gain (or loss) to `(xp, level)`.
///
/// XP never goes negative. Excess carries over, looping across as many
/// thresholds as the gain covers, so the resulting xp is always strictly
/// below the next threshold.
pub fn apply_xp(xp: i64, level: u32, gain: i64) -> (i64, u32) {
    let mut xp = (xp + gain).max(0);
    let mut level = level;
    loop {
        let threshold = level_threshold(level);
        if xp < threshold {
            break;
        }
        xp -= threshold;
        level += 1;
    }
    (xp, level)
}

// ─── Stat curves ─────────────────────────────────────────────

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Raise a stat with diminishing returns as it approaches 100.
pub fn increase_stat(current: f64, scale: f64) -> f64 {
    let current = current.clamp(STAT_MIN, STAT_MAX);
    let gain = 2.5 * (scale / 5.0) * ((STAT_MAX - current) / 100.0).powf(1.005);
    round3((current + gain).clamp(STAT_MIN, STAT_MAX))
}

/// Lower a stat with diminishing losses as it approaches 1.
pub fn decrease_stat(current: f64, scale: f64) -> f64 {
    let current = current.clamp(STAT_MIN, STAT_MAX);
    let loss = 2.5 * (scale / 5.0) * ((current - STAT_MIN) / 100.0).powf(1.005);
    round3((current - loss).clamp(STAT_MIN, STAT_MAX))
}

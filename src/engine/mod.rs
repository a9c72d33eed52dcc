// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Engine module - reconciliation, rewards, backfill, and streaks.

pub mod backfill;
pub mod reconcile;
pub mod recurrence;
pub mod rewards;
pub mod stats_sync;
pub mod streaks;

pub use backfill::BackfillSummary;
pub use reconcile::{HabitEngine, SyncOutcome, UserState, DEBOUNCE_WINDOW_SECS, RETRY_INTERVAL_SECS};
pub use rewards::{compute_reward, is_effective_negative_occurrence, FeedbackHook, RewardOutcome};
pub use stats_sync::StatsEngine;
pub use streaks::StreakTracker;

use std::sync::Arc;

/// Wall-clock source in unix seconds.
///
/// Defaults to the system clock; injectable so sync-debounce arithmetic
/// can be exercised deterministically in tests.
#[derive(Clone)]
pub struct Clock(Arc<dyn Fn() -> i64 + Send + Sync>);

impl Clock {
    pub fn system() -> Self {
        Self(Arc::new(crate::time_utils::unix_now))
    }

    pub fn from_fn(f: impl Fn() -> i64 + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn now(&self) -> i64 {
        (self.0)()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::system()
    }
}

impl std::fmt::Debug for Clock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Clock").field(&self.now()).finish()
    }
}

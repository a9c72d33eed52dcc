// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Retroactive reward/penalty application for elapsed days.
//!
//! Walks backward from yesterday to the account-creation date, replaying
//! reward effects for every day the app was not opened. Days already
//! marked `calculated` stop the walk, which is what makes the pass
//! idempotent and cheap on every launch after the first.
//!
//! Known gaps carried over from the shipped behavior (see DESIGN.md):
//! overdue todos are never penalized, reminders are not evaluated, and
//! the pass uses the *current* active-habit set rather than a historical
//! reconstruction of which habits existed on each past day.

use std::sync::Arc;

use crate::engine::reconcile::HabitEngine;
use crate::error::Result;
use crate::time_utils::local_today;

/// Result of one backfill pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillSummary {
    /// Days newly marked calculated.
    pub days_processed: u32,
    /// Positive occurrences replayed.
    pub rewards_applied: u32,
    /// Negative occurrences applied for neglected habits.
    pub penalties_applied: u32,
}

impl BackfillSummary {
    /// True when the walk found nothing to do (every day was already
    /// calculated, or the account is brand new).
    pub fn is_noop(&self) -> bool {
        self.days_processed == 0
    }

    /// Total reward-engine invocations.
    pub fn total_effects(&self) -> u32 {
        self.rewards_applied + self.penalties_applied
    }
}

impl HabitEngine {
    /// Run the backfill pass. Invoked once after load completes; safe to
    /// re-run because processed days are guarded by `calculated`.
    pub async fn run_backfill(self: &Arc<Self>) -> Result<BackfillSummary> {
        let mut summary = BackfillSummary::default();

        let Some(yesterday) = local_today().pred_opt() else {
            return Ok(summary);
        };
        let created_at = self.created_at();

        // Collect the uncalculated suffix, newest first; the walk stops
        // at the first already-calculated day or before account creation.
        let mut pending_days = Vec::new();
        let mut day = yesterday;
        {
            let state = self.state_handle().read().unwrap();
            while day >= created_at && !state.habit_log.is_calculated(day) {
                pending_days.push(day);
                match day.pred_opt() {
                    Some(previous) => day = previous,
                    None => break,
                }
            }
        }

        if pending_days.is_empty() {
            return Ok(summary);
        }

        let habits: Vec<_> = self.current_habits().into_values().collect();
        tracing::info!(
            uid = %self.uid(),
            days = pending_days.len(),
            habits = habits.len(),
            "Backfilling missed days"
        );

        for day in pending_days {
            for habit in &habits {
                let completed = self
                    .state_handle()
                    .read()
                    .unwrap()
                    .habit_log
                    .is_completed(day, &habit.id);

                if completed {
                    match self.log_activity(&habit.activity_id, 0, false).await {
                        Ok(_) => summary.rewards_applied += 1,
                        Err(err) => tracing::warn!(
                            uid = %self.uid(),
                            habit_id = %habit.id,
                            day = %day,
                            error = %err,
                            "Skipping backfill reward"
                        ),
                    }
                } else if habit.neglection {
                    match self.log_activity(&habit.activity_id, 1, false).await {
                        Ok(_) => summary.penalties_applied += 1,
                        Err(err) => tracing::warn!(
                            uid = %self.uid(),
                            habit_id = %habit.id,
                            day = %day,
                            error = %err,
                            "Skipping backfill penalty"
                        ),
                    }
                }
                // Missed without neglection: skipped, no discipline change.
            }

            self.state_handle()
                .write()
                .unwrap()
                .habit_log
                .mark_calculated(day);
            summary.days_processed += 1;
        }

        tracing::info!(
            uid = %self.uid(),
            days = summary.days_processed,
            rewards = summary.rewards_applied,
            penalties = summary.penalties_applied,
            "Backfill complete"
        );

        self.trigger_sync();
        Ok(summary)
    }
}

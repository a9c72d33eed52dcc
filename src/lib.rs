// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Habitforge: gamified habit tracking with offline-first sync.
//!
//! This crate is the engine behind a habit/productivity tracker: XP,
//! gold, and stats layered over recurrence-rule habits and one-off
//! todos, reconciled between a device-local cache and a remote backend
//! using last-write-wins timestamp versioning. It is a library consumed
//! by a UI shell, not a standalone service.

pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod store;
pub mod telemetry;
pub mod time_utils;

use chrono::NaiveDate;

pub use engine::{BackfillSummary, HabitEngine, RewardOutcome, SyncOutcome};
pub use error::{AppError, Result};

/// Explicit session handle owned by the application root.
///
/// Built by the shell once authentication resolves and handed to
/// [`HabitEngine`]; the account-creation date bounds the backfill walk.
#[derive(Debug, Clone)]
pub struct UserSession {
    pub uid: String,
    pub created_at: NaiveDate,
}

impl UserSession {
    pub fn new(uid: impl Into<String>, created_at: NaiveDate) -> Self {
        Self {
            uid: uid.into(),
            created_at,
        }
    }
}

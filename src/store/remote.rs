// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Remote state store contract.
//!
//! One row per user holding the whole `UserData` blob plus its
//! `lastUpdated` column, and a separate stats row with individual numeric
//! columns supporting partial-field updates. Last writer wins at the
//! storage layer; a missing row is `Ok(None)`, never an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::models::{Stats, StatsUpdate, UserData};

/// A fetched user-data row.
///
/// The blob stays raw JSON here so schema migration happens exactly once,
/// at adoption time in the reconciliation engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserDataRow {
    pub uid: String,
    #[serde(rename = "lastUpdated")]
    pub last_updated: i64,
    pub data: Value,
}

/// Narrow contract to the remote backend.
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch only the `lastUpdated` column for a user's data row.
    async fn fetch_last_updated(&self, uid: &str) -> Result<Option<i64>>;

    /// Fetch the full data row.
    async fn fetch_user_data(&self, uid: &str) -> Result<Option<UserDataRow>>;

    /// Create or replace the user's data row.
    async fn upsert_user_data(&self, uid: &str, data: &UserData) -> Result<()>;

    /// Fetch the user's stats row.
    async fn fetch_stats(&self, uid: &str) -> Result<Option<Stats>>;

    /// Create or replace the user's stats row.
    async fn upsert_stats(&self, uid: &str, stats: &Stats) -> Result<()>;

    /// Apply a partial update to the user's stats row, creating it from
    /// defaults when absent.
    async fn update_stats(&self, uid: &str, update: &StatsUpdate) -> Result<()>;
}

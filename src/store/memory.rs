// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory remote store for tests and offline operation.

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::error::{AppError, Result};
use crate::models::{Stats, StatsUpdate, UserData};
use crate::store::remote::{RemoteStore, UserDataRow};

#[derive(Debug, Clone)]
struct StoredRow {
    last_updated: i64,
    data: Value,
}

/// In-memory `RemoteStore` with fault injection.
///
/// Rows live in process memory; `set_offline(true)` makes every call fail
/// with a transient remote error, for exercising the deferred-sync paths.
#[derive(Debug, Default)]
pub struct MemoryRemote {
    rows: DashMap<String, StoredRow>,
    stats: DashMap<String, Stats>,
    offline: AtomicBool,
    data_upserts: AtomicU64,
    stats_writes: AtomicU64,
}

impl MemoryRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate transient remote unavailability.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of user-data upserts performed (for debounce assertions).
    pub fn data_upserts(&self) -> u64 {
        self.data_upserts.load(Ordering::SeqCst)
    }

    /// Number of stats writes performed (full or partial).
    pub fn stats_writes(&self) -> u64 {
        self.stats_writes.load(Ordering::SeqCst)
    }

    /// Seed a user-data row directly, bypassing counters.
    pub fn seed_user_data(&self, uid: &str, last_updated: i64, data: Value) {
        self.rows.insert(
            uid.to_string(),
            StoredRow { last_updated, data },
        );
    }

    /// Seed a stats row directly, bypassing counters.
    pub fn seed_stats(&self, stats: Stats) {
        self.stats.insert(stats.uid.clone(), stats);
    }

    pub fn stored_last_updated(&self, uid: &str) -> Option<i64> {
        self.rows.get(uid).map(|row| row.last_updated)
    }

    pub fn stored_stats(&self, uid: &str) -> Option<Stats> {
        self.stats.get(uid).map(|s| s.value().clone())
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Remote("remote store offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for MemoryRemote {
    async fn fetch_last_updated(&self, uid: &str) -> Result<Option<i64>> {
        self.check_online()?;
        Ok(self.rows.get(uid).map(|row| row.last_updated))
    }

    async fn fetch_user_data(&self, uid: &str) -> Result<Option<UserDataRow>> {
        self.check_online()?;
        Ok(self.rows.get(uid).map(|row| UserDataRow {
            uid: uid.to_string(),
            last_updated: row.last_updated,
            data: row.data.clone(),
        }))
    }

    async fn upsert_user_data(&self, uid: &str, data: &UserData) -> Result<()> {
        self.check_online()?;
        self.rows.insert(
            uid.to_string(),
            StoredRow {
                last_updated: data.last_updated,
                data: serde_json::to_value(data)?,
            },
        );
        self.data_upserts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn fetch_stats(&self, uid: &str) -> Result<Option<Stats>> {
        self.check_online()?;
        Ok(self.stats.get(uid).map(|s| s.value().clone()))
    }

    async fn upsert_stats(&self, uid: &str, stats: &Stats) -> Result<()> {
        self.check_online()?;
        self.stats.insert(uid.to_string(), stats.clone());
        self.stats_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn update_stats(&self, uid: &str, update: &StatsUpdate) -> Result<()> {
        self.check_online()?;
        let mut entry = self
            .stats
            .entry(uid.to_string())
            .or_insert_with(|| Stats::new(uid, update.last_updated));
        entry.apply_update(update);
        self.stats_writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stats persistence: offline-first mirror plus remote row.
//!
//! Load follows the same last-updated comparison rule as the UserData
//! blob; every reward lands as one atomic update (in-memory merge, local
//! mirror write, remote partial upsert).

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::engine::Clock;
use crate::error::Result;
use crate::models::{Stats, StatsUpdate};
use crate::store::{LocalStore, RemoteStore};

pub struct StatsEngine {
    uid: String,
    local: LocalStore,
    remote: Arc<dyn RemoteStore>,
    clock: Clock,
    stats: RwLock<Stats>,
    /// Set when a remote write failed; the next apply pushes the full row
    /// instead of a partial update so the remote catches up.
    remote_dirty: AtomicBool,
}

impl StatsEngine {
    pub fn new(uid: &str, local: LocalStore, remote: Arc<dyn RemoteStore>, clock: Clock) -> Self {
        let now = clock.now();
        Self {
            uid: uid.to_string(),
            local,
            remote,
            clock,
            stats: RwLock::new(Stats::new(uid, now)),
            remote_dirty: AtomicBool::new(false),
        }
    }

    /// Current stats snapshot.
    pub fn current(&self) -> Stats {
        self.stats.read().unwrap().clone()
    }

    /// Load stats, picking the authoritative side by `lastUpdated`.
    pub async fn load(&self) -> Result<()> {
        let local_stats = self.local.read_stats(&self.uid).await;
        let remote_stats = match self.remote.fetch_stats(&self.uid).await {
            Ok(stats) => stats,
            Err(err) => {
                tracing::warn!(uid = %self.uid, error = %err, "Stats fetch failed, using local mirror");
                None
            }
        };

        let adopted = match (local_stats, remote_stats) {
            (None, None) => {
                let fresh = Stats::new(&self.uid, self.clock.now());
                self.local.write_stats(&self.uid, &fresh).await?;
                if let Err(err) = self.remote.upsert_stats(&self.uid, &fresh).await {
                    tracing::warn!(uid = %self.uid, error = %err, "Failed to create remote stats row");
                    self.remote_dirty.store(true, Ordering::SeqCst);
                }
                fresh
            }
            (Some(local), None) => {
                if let Err(err) = self.remote.upsert_stats(&self.uid, &local).await {
                    tracing::warn!(uid = %self.uid, error = %err, "Failed to repair remote stats row");
                    self.remote_dirty.store(true, Ordering::SeqCst);
                }
                local
            }
            (None, Some(remote)) => {
                self.local.write_stats(&self.uid, &remote).await?;
                remote
            }
            (Some(local), Some(remote)) => {
                if local.last_updated >= remote.last_updated {
                    if local.last_updated > remote.last_updated {
                        if let Err(err) = self.remote.upsert_stats(&self.uid, &local).await {
                            tracing::warn!(uid = %self.uid, error = %err, "Failed to repair remote stats row");
                            self.remote_dirty.store(true, Ordering::SeqCst);
                        }
                    }
                    local
                } else {
                    self.local.write_stats(&self.uid, &remote).await?;
                    remote
                }
            }
        };

        tracing::debug!(uid = %self.uid, level = adopted.level, "Stats loaded");
        *self.stats.write().unwrap() = adopted;
        Ok(())
    }

    /// Apply one atomic stats update.
    ///
    /// The in-memory row and local mirror always advance together; a
    /// failed remote write is logged and caught up on the next apply.
    pub async fn apply(&self, mut update: StatsUpdate) -> Result<Stats> {
        update.last_updated = self.clock.now();

        let snapshot = {
            let mut stats = self.stats.write().unwrap();
            stats.apply_update(&update);
            stats.clone()
        };

        self.local.write_stats(&self.uid, &snapshot).await?;

        let remote_result = if self.remote_dirty.load(Ordering::SeqCst) {
            self.remote.upsert_stats(&self.uid, &snapshot).await
        } else {
            self.remote.update_stats(&self.uid, &update).await
        };

        match remote_result {
            Ok(()) => self.remote_dirty.store(false, Ordering::SeqCst),
            Err(err) => {
                tracing::warn!(uid = %self.uid, error = %err, "Remote stats write failed, deferring");
                self.remote_dirty.store(true, Ordering::SeqCst);
            }
        }

        Ok(snapshot)
    }
}

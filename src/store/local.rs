// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Device-local cache store.
//!
//! A file-backed key-value store, one JSON document per `{uid}-{key}`
//! entry. Writes go through a temp file and an atomic rename so readers
//! never observe a partial document. A missing or malformed entry reads
//! as absent; the caller falls back to the remote store or defaults.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::models::{migrate_user_data, Stats, UserData};
use crate::store::keys;

/// File-backed local cache, scoped per user id at the key level.
#[derive(Debug, Clone)]
pub struct LocalStore {
    base_dir: PathBuf,
}

/// Envelope for the integrity-checked stats mirror: the payload is stored
/// as the exact serialized string the digest covers.
#[derive(Debug, serde::Serialize, serde::Deserialize)]
struct SealedEntry {
    payload: String,
    digest: String,
}

impl LocalStore {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn entry_path(&self, uid: &str, key: &str) -> PathBuf {
        let safe: String = format!("{uid}-{key}")
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect();
        self.base_dir.join(format!("{safe}.json"))
    }

    /// Read one key; `None` when missing or unparseable.
    pub async fn read_json<T: DeserializeOwned>(&self, uid: &str, key: &str) -> Option<T> {
        let path = self.entry_path(uid, key);
        let raw = match tokio::fs::read(&path).await {
            Ok(raw) => raw,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
            Err(err) => {
                tracing::warn!(uid, key, error = %err, "Failed to read cache entry");
                return None;
            }
        };

        match serde_json::from_slice(&raw) {
            Ok(value) => Some(value),
            Err(err) => {
                // Malformed cache reads as absent rather than crashing.
                tracing::warn!(uid, key, error = %err, "Discarding malformed cache entry");
                None
            }
        }
    }

    /// Write one key atomically (temp file + rename).
    pub async fn write_json<T: Serialize>(&self, uid: &str, key: &str, value: &T) -> Result<()> {
        tokio::fs::create_dir_all(&self.base_dir).await?;

        let path = self.entry_path(uid, key);
        let tmp = path.with_extension("json.tmp");
        let raw = serde_json::to_vec(value)?;

        tokio::fs::write(&tmp, &raw).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    pub async fn remove_key(&self, uid: &str, key: &str) -> Result<()> {
        let path = self.entry_path(uid, key);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }

    // ─── Snapshot Operations ─────────────────────────────────────

    /// Read the full cached snapshot for a user.
    ///
    /// Returns `None` unless **all** snapshot keys are present and parse:
    /// a partially-written cache is never trusted. The assembled blob runs
    /// through schema migration, so caches written by older app revisions
    /// load correctly.
    pub async fn read_snapshot(&self, uid: &str) -> Option<UserData> {
        let reads = keys::SNAPSHOT_KEYS
            .iter()
            .map(|key| self.read_json::<Value>(uid, key));
        let values = futures_util::future::join_all(reads).await;

        let mut blob = serde_json::Map::new();
        for (key, value) in keys::SNAPSHOT_KEYS.iter().zip(values) {
            blob.insert((*key).to_string(), value?);
        }

        match migrate_user_data(Value::Object(blob)) {
            Ok(data) => Some(data),
            Err(err) => {
                tracing::warn!(uid, error = %err, "Discarding unmigratable local snapshot");
                None
            }
        }
    }

    /// Persist the full snapshot, one key per slice.
    pub async fn write_snapshot(&self, uid: &str, data: &UserData) -> Result<()> {
        let (activities, habits, current_habits, todos, habit_data, last_updated) = (
            serde_json::to_value(&data.activities)?,
            serde_json::to_value(&data.habits)?,
            serde_json::to_value(&data.current_habits)?,
            serde_json::to_value(&data.todos)?,
            serde_json::to_value(&data.habit_data)?,
            Value::from(data.last_updated),
        );

        let writes = [
            self.write_json(uid, keys::ACTIVITIES, &activities),
            self.write_json(uid, keys::HABITS, &habits),
            self.write_json(uid, keys::CURRENT_HABITS, &current_habits),
            self.write_json(uid, keys::TODOS, &todos),
            self.write_json(uid, keys::HABIT_DATA, &habit_data),
            self.write_json(uid, keys::LAST_UPDATED, &last_updated),
        ];

        for result in futures_util::future::join_all(writes).await {
            result?;
        }
        Ok(())
    }

    // ─── Stats Mirror ────────────────────────────────────────────

    /// Read the integrity-checked stats mirror.
    ///
    /// A digest mismatch reads as absent, same as a malformed entry.
    pub async fn read_stats(&self, uid: &str) -> Option<Stats> {
        let sealed: SealedEntry = self.read_json(uid, keys::STATS).await?;

        if seal_digest(&sealed.payload) != sealed.digest {
            tracing::warn!(uid, "Stats mirror failed integrity check, discarding");
            return None;
        }

        match serde_json::from_str(&sealed.payload) {
            Ok(stats) => Some(stats),
            Err(err) => {
                tracing::warn!(uid, error = %err, "Discarding malformed stats mirror");
                None
            }
        }
    }

    /// Write the stats mirror with its integrity digest.
    pub async fn write_stats(&self, uid: &str, stats: &Stats) -> Result<()> {
        let payload = serde_json::to_string(stats)?;
        let sealed = SealedEntry {
            digest: seal_digest(&payload),
            payload,
        };
        self.write_json(uid, keys::STATS, &sealed).await
    }
}

fn seal_digest(payload: &str) -> String {
    hex::encode(Sha256::digest(payload.as_bytes()))
}

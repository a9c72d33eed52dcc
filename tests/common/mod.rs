// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use habitforge::engine::{Clock, HabitEngine};
use habitforge::models::{default_catalog, Habit, HabitLog, UserData, SCHEMA_VERSION};
use habitforge::store::{LocalStore, MemoryRemote, RemoteStore};
use habitforge::time_utils::local_today;
use habitforge::UserSession;

/// Settable wall clock shared between a test and its engine.
#[derive(Clone)]
#[allow(dead_code)]
pub struct ManualClock(Arc<AtomicI64>);

#[allow(dead_code)]
impl ManualClock {
    pub fn new(start: i64) -> Self {
        Self(Arc::new(AtomicI64::new(start)))
    }

    pub fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn as_clock(&self) -> Clock {
        let inner = Arc::clone(&self.0);
        Clock::from_fn(move || inner.load(Ordering::SeqCst))
    }
}

/// Engine wired to a temp-dir local store and an in-memory remote.
#[allow(dead_code)]
pub struct TestHarness {
    pub engine: Arc<HabitEngine>,
    pub remote: Arc<MemoryRemote>,
    pub local: LocalStore,
    pub clock: ManualClock,
    _dir: tempfile::TempDir,
}

#[allow(dead_code)]
pub const UID: &str = "user-1";

#[allow(dead_code)]
pub fn harness(created_at: NaiveDate, now: i64) -> TestHarness {
    let dir = tempfile::tempdir().expect("tempdir");
    let local = LocalStore::new(dir.path());
    let remote = Arc::new(MemoryRemote::new());
    let clock = ManualClock::new(now);

    let engine = HabitEngine::with_clock(
        UserSession::new(UID, created_at),
        local.clone(),
        Arc::clone(&remote) as Arc<dyn RemoteStore>,
        clock.as_clock(),
    );

    TestHarness {
        engine,
        remote,
        local,
        clock,
        _dir: dir,
    }
}

/// Days-ago helper relative to the local calendar.
#[allow(dead_code)]
pub fn days_ago(days: u64) -> NaiveDate {
    local_today() - chrono::Duration::days(days as i64)
}

/// A daily habit referencing a built-in activity.
#[allow(dead_code)]
pub fn daily_habit(id: &str, activity_id: &str, neglection: bool) -> Habit {
    Habit {
        id: id.to_string(),
        activity_id: activity_id.to_string(),
        neglection,
        rule: "DTSTART:20200101T120000Z\nRRULE:FREQ=DAILY"
            .parse()
            .expect("static rule parses"),
        reminder: None,
        name: None,
        description: None,
        icon: None,
    }
}

/// A sync blob carrying the default catalog plus a marker activity so
/// tests can tell which side won reconciliation.
#[allow(dead_code)]
pub fn marked_user_data(last_updated: i64, marker: &str) -> UserData {
    let mut activities = default_catalog();
    let mut marker_activity = activities
        .get("default-workout")
        .expect("builtin activity")
        .clone();
    marker_activity.id = marker.to_string();
    marker_activity.name = marker.to_string();
    activities.insert(marker.to_string(), marker_activity);

    UserData {
        schema_version: SCHEMA_VERSION,
        activities,
        habits: HashMap::new(),
        current_habits: HashMap::new(),
        todos: HashMap::new(),
        habit_data: HabitLog::new(),
        last_updated,
    }
}

/// Seed the remote store with a marked blob.
#[allow(dead_code)]
pub fn seed_remote(remote: &MemoryRemote, last_updated: i64, marker: &str) {
    let data = marked_user_data(last_updated, marker);
    remote.seed_user_data(
        UID,
        last_updated,
        serde_json::to_value(&data).expect("blob serializes"),
    );
}

/// Seed the local cache with a marked blob.
#[allow(dead_code)]
pub async fn seed_local(local: &LocalStore, last_updated: i64, marker: &str) {
    local
        .write_snapshot(UID, &marked_user_data(last_updated, marker))
        .await
        .expect("local seed");
}

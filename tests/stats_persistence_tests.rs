// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Stats engine: last-write-wins load and atomic updates.

mod common;

use common::{ManualClock, UID};
use std::sync::Arc;

use habitforge::engine::StatsEngine;
use habitforge::models::{StatKind, Stats, StatsUpdate};
use habitforge::store::{LocalStore, MemoryRemote, RemoteStore};

struct StatsHarness {
    engine: StatsEngine,
    remote: Arc<MemoryRemote>,
    local: LocalStore,
    _dir: tempfile::TempDir,
}

fn stats_harness(now: i64) -> StatsHarness {
    let dir = tempfile::tempdir().expect("tempdir");
    let local = LocalStore::new(dir.path());
    let remote = Arc::new(MemoryRemote::new());
    let clock = ManualClock::new(now);

    let engine = StatsEngine::new(
        UID,
        local.clone(),
        Arc::clone(&remote) as Arc<dyn RemoteStore>,
        clock.as_clock(),
    );

    StatsHarness {
        engine,
        remote,
        local,
        _dir: dir,
    }
}

fn stats_at(last_updated: i64, gold: i64) -> Stats {
    let mut stats = Stats::new(UID, last_updated);
    stats.gold = gold;
    stats
}

#[tokio::test]
async fn both_absent_creates_defaults_everywhere() {
    let h = stats_harness(1000);

    h.engine.load().await.unwrap();

    let current = h.engine.current();
    assert_eq!(current.level, 1);
    assert_eq!(current.discipline, 50.0);
    assert_eq!(h.remote.stored_stats(UID).unwrap().level, 1);
    assert!(h.local.read_stats(UID).await.is_some());
}

#[tokio::test]
async fn newer_local_mirror_wins_and_repairs_remote() {
    let h = stats_harness(2000);
    h.local.write_stats(UID, &stats_at(1500, 70)).await.unwrap();
    h.remote.seed_stats(stats_at(1000, 5));

    h.engine.load().await.unwrap();

    assert_eq!(h.engine.current().gold, 70);
    assert_eq!(h.remote.stored_stats(UID).unwrap().gold, 70);
}

#[tokio::test]
async fn newer_remote_wins_and_overwrites_mirror() {
    let h = stats_harness(2000);
    h.local.write_stats(UID, &stats_at(1000, 70)).await.unwrap();
    h.remote.seed_stats(stats_at(1500, 5));

    h.engine.load().await.unwrap();

    assert_eq!(h.engine.current().gold, 5);
    assert_eq!(h.local.read_stats(UID).await.unwrap().gold, 5);
}

#[tokio::test]
async fn equal_timestamps_prefer_local_without_write() {
    let h = stats_harness(2000);
    h.local.write_stats(UID, &stats_at(1500, 70)).await.unwrap();
    h.remote.seed_stats(stats_at(1500, 5));

    h.engine.load().await.unwrap();

    assert_eq!(h.engine.current().gold, 70);
    assert_eq!(h.remote.stats_writes(), 0);
}

#[tokio::test]
async fn tampered_mirror_falls_back_to_remote() {
    let h = stats_harness(2000);
    h.local.write_stats(UID, &stats_at(1900, 70)).await.unwrap();
    h.remote.seed_stats(stats_at(1000, 5));

    // Alter the sealed payload without refreshing its digest.
    let path = h.local.base_dir().join(format!("{UID}-stats.json"));
    let raw = std::fs::read_to_string(&path).unwrap();
    let mut sealed: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let tampered = sealed["payload"]
        .as_str()
        .unwrap()
        .replace("\"gold\":70", "\"gold\":71");
    sealed["payload"] = serde_json::Value::String(tampered);
    std::fs::write(&path, serde_json::to_vec(&sealed).unwrap()).unwrap();

    h.engine.load().await.unwrap();

    assert_eq!(h.engine.current().gold, 5);
}

#[tokio::test]
async fn apply_lands_in_memory_mirror_and_remote_together() {
    let h = stats_harness(1000);
    h.engine.load().await.unwrap();

    let update = StatsUpdate {
        last_updated: 0, // stamped by the engine
        xp: Some(12),
        level: Some(1),
        gold: Some(40),
        gems: None,
        stats: vec![(StatKind::Physical, 51.25)],
    };
    let snapshot = h.engine.apply(update).await.unwrap();

    assert_eq!(snapshot.last_updated, 1000);
    assert_eq!(snapshot.gold, 40);
    assert_eq!(snapshot.physical, 51.25);

    assert_eq!(h.local.read_stats(UID).await.unwrap(), snapshot);
    assert_eq!(h.remote.stored_stats(UID).unwrap(), snapshot);
}

#[tokio::test]
async fn failed_remote_write_catches_up_on_next_apply() {
    let h = stats_harness(1000);
    h.engine.load().await.unwrap();

    h.remote.set_offline(true);
    let offline_update = StatsUpdate {
        gold: Some(25),
        ..Default::default()
    };
    h.engine.apply(offline_update).await.unwrap();

    // Mirror advanced even though the remote write failed.
    assert_eq!(h.local.read_stats(UID).await.unwrap().gold, 25);
    assert_eq!(h.remote.stored_stats(UID).unwrap().gold, 0);

    h.remote.set_offline(false);
    let next_update = StatsUpdate {
        xp: Some(3),
        ..Default::default()
    };
    h.engine.apply(next_update).await.unwrap();

    // The catch-up push carries the full row, including the missed gold.
    let remote_row = h.remote.stored_stats(UID).unwrap();
    assert_eq!(remote_row.gold, 25);
    assert_eq!(remote_row.xp, 3);
}

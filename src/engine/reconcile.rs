// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Reconciliation engine.
//!
//! Merges the device-local cache and the remote store on load using
//! last-write-wins timestamp versioning, serves the in-memory state to
//! the UI shell, and pushes mutations back out: local cache on every
//! change, remote at most once per debounce window.
//!
//! Sync workflow:
//! 1. Persist the full snapshot to the local cache (unconditional)
//! 2. Resolve the remote row's `lastUpdated` (fetch if unknown)
//! 3. Outside the debounce window: push the snapshot to the remote
//! 4. Inside it: arm a timer for the instant the window reopens
//!
//! At most one sync timer is pending per engine; cancel-and-reschedule is
//! the only mutation on that slot.

use chrono::NaiveDate;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use validator::Validate;

use crate::engine::recurrence;
use crate::engine::rewards::{compute_reward, FeedbackHook, RewardOutcome};
use crate::engine::stats_sync::StatsEngine;
use crate::engine::streaks::{StreakMemoWire, StreakTracker};
use crate::engine::Clock;
use crate::error::{AppError, Result};
use crate::models::{
    default_catalog, migrate_user_data, Activity, DayRecord, Habit, HabitLog, Stats, Todo,
    UserData, SCHEMA_VERSION,
};
use crate::store::{keys, LocalStore, RemoteStore};
use crate::time_utils::local_today;
use crate::UserSession;

/// Remote writes are debounced to at most one per this window.
pub const DEBOUNCE_WINDOW_SECS: i64 = 600;

/// Deferred-sync retry cadence.
pub const RETRY_INTERVAL_SECS: i64 = 300;

/// The five top-level state slices plus the habit log.
#[derive(Debug, Clone, Default)]
pub struct UserState {
    pub activities: HashMap<String, Activity>,
    pub habits: HashMap<String, Habit>,
    pub current_habits: HashMap<String, Habit>,
    pub todos: HashMap<String, Todo>,
    pub habit_log: HabitLog,
}

/// What a sync-routine invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Snapshot pushed to the remote store.
    Pushed,
    /// Inside the debounce window (or remote unavailable); a retry timer
    /// is armed for `retry_in_secs` from now.
    Deferred { retry_in_secs: i64 },
    /// Engine shut down; nothing written.
    SkippedClosed,
}

/// Per-session habit/stats reconciliation engine.
pub struct HabitEngine {
    session: UserSession,
    local: LocalStore,
    remote: Arc<dyn RemoteStore>,
    clock: Clock,
    state: RwLock<UserState>,
    stats: StatsEngine,
    streaks: StreakTracker,
    remote_last_updated: Mutex<Option<i64>>,
    loaded: AtomicBool,
    closed: AtomicBool,
    sync_timer: Mutex<Option<JoinHandle<()>>>,
    /// Excludes concurrently in-flight sync routines; together with the
    /// single-timer slot this guarantees at most one sync is running at
    /// a time under a multi-threaded runtime.
    sync_gate: tokio::sync::Mutex<()>,
    feedback: RwLock<Option<FeedbackHook>>,
}

impl HabitEngine {
    pub fn new(session: UserSession, local: LocalStore, remote: Arc<dyn RemoteStore>) -> Arc<Self> {
        Self::with_clock(session, local, remote, Clock::system())
    }

    pub fn with_clock(
        session: UserSession,
        local: LocalStore,
        remote: Arc<dyn RemoteStore>,
        clock: Clock,
    ) -> Arc<Self> {
        let stats = StatsEngine::new(&session.uid, local.clone(), Arc::clone(&remote), clock.clone());
        Arc::new(Self {
            session,
            local,
            remote,
            clock,
            state: RwLock::new(UserState::default()),
            stats,
            streaks: StreakTracker::new(),
            remote_last_updated: Mutex::new(None),
            loaded: AtomicBool::new(false),
            closed: AtomicBool::new(false),
            sync_timer: Mutex::new(None),
            sync_gate: tokio::sync::Mutex::new(()),
            feedback: RwLock::new(None),
        })
    }

    pub fn uid(&self) -> &str {
        &self.session.uid
    }

    pub fn created_at(&self) -> NaiveDate {
        self.session.created_at
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(Ordering::SeqCst)
    }

    /// Register the UI shell's transient-feedback callback.
    pub fn set_feedback_hook(&self, hook: FeedbackHook) {
        *self.feedback.write().unwrap() = Some(hook);
    }

    // ─── Load Protocol ───────────────────────────────────────────

    /// Load and reconcile stats and user data, then run the backfill
    /// pass. The usual entry point for a fresh session.
    pub async fn initialize(self: &Arc<Self>) -> Result<()> {
        self.load().await?;
        self.run_backfill().await?;
        Ok(())
    }

    /// Reconcile local cache against the remote store and adopt the
    /// authoritative side. Must complete before mutations sync and before
    /// the backfill pass runs.
    pub async fn load(self: &Arc<Self>) -> Result<()> {
        let uid = self.session.uid.clone();

        self.stats.load().await?;

        // A partially-present cache is treated as absent entirely.
        let local_snapshot = self.local.read_snapshot(&uid).await;
        let remote_last_updated = match self.remote.fetch_last_updated(&uid).await {
            Ok(lu) => lu,
            Err(err) => {
                tracing::warn!(uid = %uid, error = %err, "Remote timestamp fetch failed, treating remote as absent");
                None
            }
        };

        match (local_snapshot, remote_last_updated) {
            (None, Some(remote_lu)) => match self.remote.fetch_user_data(&uid).await? {
                Some(row) => {
                    let data = migrate_user_data(row.data)?;
                    tracing::info!(uid = %uid, last_updated = remote_lu, "Adopting remote state (no local cache)");
                    self.adopt(&data);
                    *self.remote_last_updated.lock().unwrap() = Some(remote_lu);
                    // Cache warm
                    self.local.write_snapshot(&uid, &data).await?;
                }
                None => self.first_run(&uid).await?,
            },
            (None, None) => self.first_run(&uid).await?,
            (Some(local_data), remote_lu) => {
                if remote_lu.is_some_and(|lu| lu > local_data.last_updated) {
                    match self.remote.fetch_user_data(&uid).await? {
                        Some(row) => {
                            let data = migrate_user_data(row.data)?;
                            tracing::info!(
                                uid = %uid,
                                local = local_data.last_updated,
                                remote = data.last_updated,
                                "Adopting newer remote state"
                            );
                            self.adopt(&data);
                            *self.remote_last_updated.lock().unwrap() = remote_lu;
                            self.local.write_snapshot(&uid, &data).await?;
                        }
                        None => {
                            // Row vanished between the two reads; trust local.
                            self.adopt_local(&uid, local_data, None).await;
                        }
                    }
                } else {
                    self.adopt_local(&uid, local_data, remote_lu).await;
                }
            }
        }

        if let Some(wire) = self.local.read_json::<StreakMemoWire>(&uid, keys::LATEST_STREAKS).await {
            self.streaks.load_wire(wire);
        }

        self.loaded.store(true, Ordering::SeqCst);
        tracing::debug!(uid = %uid, "Load complete");
        Ok(())
    }

    /// Both sides absent: seed defaults and establish the first remote
    /// record immediately.
    async fn first_run(self: &Arc<Self>, uid: &str) -> Result<()> {
        tracing::info!(uid = %uid, "First run, seeding default catalog");
        {
            let mut state = self.state.write().unwrap();
            *state = UserState {
                activities: default_catalog(),
                ..UserState::default()
            };
        }

        let data = self.snapshot(self.clock.now());
        self.local.write_snapshot(uid, &data).await?;
        match self.remote.upsert_user_data(uid, &data).await {
            Ok(()) => *self.remote_last_updated.lock().unwrap() = Some(data.last_updated),
            Err(err) => {
                tracing::warn!(uid = %uid, error = %err, "Failed to create remote record, deferring to sync");
            }
        }
        Ok(())
    }

    /// Local snapshot wins: adopt it, and repair a remote that fell
    /// behind (or never existed) by pushing the local blob verbatim.
    async fn adopt_local(&self, uid: &str, local_data: UserData, remote_lu: Option<i64>) {
        let needs_push = match remote_lu {
            Some(lu) => lu < local_data.last_updated,
            None => true,
        };
        tracing::info!(
            uid = %uid,
            last_updated = local_data.last_updated,
            needs_push,
            "Adopting local state"
        );

        self.adopt(&local_data);
        *self.remote_last_updated.lock().unwrap() = remote_lu.or(Some(local_data.last_updated));

        if needs_push {
            match self.remote.upsert_user_data(uid, &local_data).await {
                Ok(()) => {
                    *self.remote_last_updated.lock().unwrap() = Some(local_data.last_updated);
                }
                Err(err) => {
                    tracing::warn!(uid = %uid, error = %err, "Failed to repair remote record, deferring to sync");
                }
            }
        }
    }

    fn adopt(&self, data: &UserData) {
        let mut state = self.state.write().unwrap();
        *state = UserState {
            activities: data.activities.clone(),
            habits: data.habits.clone(),
            current_habits: data.current_habits.clone(),
            todos: data.todos.clone(),
            habit_log: data.habit_data.clone(),
        };
    }

    // ─── Mutation Protocol ───────────────────────────────────────

    /// Create or replace an activity template.
    pub fn set_activity(self: &Arc<Self>, activity: Activity) -> Result<()> {
        activity
            .validate()
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        self.state
            .write()
            .unwrap()
            .activities
            .insert(activity.id.clone(), activity);
        self.trigger_sync();
        Ok(())
    }

    /// Delete an activity template. Habits and todos referencing it keep
    /// their own cached name/icon/description.
    pub fn remove_activity(self: &Arc<Self>, activity_id: &str) {
        self.state.write().unwrap().activities.remove(activity_id);
        self.trigger_sync();
    }

    /// Create or replace a habit in both the historical and active maps.
    pub fn set_habit(self: &Arc<Self>, habit: Habit) {
        {
            let mut state = self.state.write().unwrap();
            state.habits.insert(habit.id.clone(), habit.clone());
            state.current_habits.insert(habit.id.clone(), habit);
        }
        self.trigger_sync();
    }

    /// Retire a habit: evicts it from the active set only, preserving the
    /// historical record.
    pub fn remove_habit(self: &Arc<Self>, habit_id: &str) {
        self.state.write().unwrap().current_habits.remove(habit_id);
        self.trigger_sync();
    }

    pub fn set_todo(self: &Arc<Self>, todo: Todo) {
        self.state
            .write()
            .unwrap()
            .todos
            .insert(todo.id.clone(), todo);
        self.trigger_sync();
    }

    pub fn remove_todo(self: &Arc<Self>, todo_id: &str) {
        self.state.write().unwrap().todos.remove(todo_id);
        self.trigger_sync();
    }

    /// Record a completion toggle for a habit on a day.
    pub fn set_habit_completion(self: &Arc<Self>, day: NaiveDate, habit_id: &str, completed: bool) {
        self.state
            .write()
            .unwrap()
            .habit_log
            .set_completion(day, habit_id, completed);
        self.trigger_sync();
    }

    /// Merge day records into the habit log, last write wins per day.
    pub fn append_habit_data(self: &Arc<Self>, entries: BTreeMap<String, DayRecord>) {
        self.state.write().unwrap().habit_log.append(entries);
        self.trigger_sync();
    }

    /// Change-detection hook: every mutation lands here, but nothing
    /// syncs until load has completed (a premature sync would clobber
    /// not-yet-loaded remote state with defaults).
    pub(crate) fn trigger_sync(self: &Arc<Self>) {
        if !self.loaded.load(Ordering::SeqCst) || self.closed.load(Ordering::SeqCst) {
            return;
        }
        let engine = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(err) = engine.update_data().await {
                tracing::warn!(uid = %engine.session.uid, error = %err, "Sync routine failed");
            }
        });
    }

    // ─── Sync Routine ────────────────────────────────────────────

    /// Persist the current snapshot locally, and push it to the remote
    /// store if the debounce window allows; otherwise arm a timer for the
    /// instant it reopens.
    pub async fn update_data(self: &Arc<Self>) -> Result<SyncOutcome> {
        let _gate = self.sync_gate.lock().await;

        if self.closed.load(Ordering::SeqCst) {
            return Ok(SyncOutcome::SkippedClosed);
        }

        let uid = self.session.uid.clone();
        let now = self.clock.now();
        let data = self.snapshot(now);

        // Local cache is written on every invocation, change or retry.
        self.local.write_snapshot(&uid, &data).await?;
        self.local
            .write_json(&uid, keys::LATEST_STREAKS, &self.streaks.to_wire())
            .await?;

        let known = *self.remote_last_updated.lock().unwrap();
        let remote_lu = match known {
            Some(lu) => lu,
            None => match self.remote.fetch_last_updated(&uid).await {
                Ok(Some(lu)) => {
                    *self.remote_last_updated.lock().unwrap() = Some(lu);
                    lu
                }
                Ok(None) => {
                    tracing::debug!(uid = %uid, "Remote record missing, retrying later");
                    return Ok(self.defer(RETRY_INTERVAL_SECS));
                }
                Err(err) => {
                    tracing::warn!(uid = %uid, error = %err, "Remote timestamp fetch failed, retrying later");
                    return Ok(self.defer(RETRY_INTERVAL_SECS));
                }
            },
        };

        let delta = now - remote_lu;
        if delta > DEBOUNCE_WINDOW_SECS {
            match self.remote.upsert_user_data(&uid, &data).await {
                Ok(()) => {
                    *self.remote_last_updated.lock().unwrap() = Some(now);
                    tracing::debug!(uid = %uid, last_updated = now, "Snapshot pushed to remote");
                    self.schedule_sync(RETRY_INTERVAL_SECS);
                    Ok(SyncOutcome::Pushed)
                }
                Err(err) => {
                    tracing::warn!(uid = %uid, error = %err, "Remote push failed, retrying later");
                    Ok(self.defer(RETRY_INTERVAL_SECS))
                }
            }
        } else {
            // Re-attempt exactly when the window reopens.
            Ok(self.defer(DEBOUNCE_WINDOW_SECS - delta + 1))
        }
    }

    fn defer(self: &Arc<Self>, retry_in_secs: i64) -> SyncOutcome {
        self.schedule_sync(retry_in_secs);
        SyncOutcome::Deferred { retry_in_secs }
    }

    /// Arm the single sync timer, cancelling any pending one.
    fn schedule_sync(self: &Arc<Self>, delay_secs: i64) {
        let mut slot = self.sync_timer.lock().unwrap();
        if let Some(pending) = slot.take() {
            pending.abort();
        }

        let engine = Arc::clone(self);
        *slot = Some(tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(delay_secs.max(0) as u64)).await;
            // Hand the slot back before running so the routine's own
            // rescheduling never aborts the running task.
            *engine.sync_timer.lock().unwrap() = None;
            if let Err(err) = engine.update_data().await {
                tracing::warn!(uid = %engine.session.uid, error = %err, "Scheduled sync failed");
            }
        }));
    }

    /// Whether a sync timer is currently armed.
    pub fn sync_pending(&self) -> bool {
        self.sync_timer
            .lock()
            .unwrap()
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Session teardown: cancel the pending sync timer and refuse further
    /// work. The final snapshot already sits in the local cache.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::SeqCst);
        if let Some(pending) = self.sync_timer.lock().unwrap().take() {
            pending.abort();
        }
        tracing::debug!(uid = %self.session.uid, "Engine shut down");
    }

    // ─── Rewards ─────────────────────────────────────────────────

    /// Convert a logged occurrence into XP/gold/stat deltas and persist
    /// them as one atomic stats update.
    pub async fn log_activity(
        &self,
        activity_id: &str,
        neglected: i8,
        emit_feedback: bool,
    ) -> Result<RewardOutcome> {
        let activity = self
            .state
            .read()
            .unwrap()
            .activities
            .get(activity_id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("activity {activity_id}")))?;

        let current = self.stats.current();
        let (update, outcome) = compute_reward(&current, &activity, neglected);
        self.stats.apply(update).await?;

        if emit_feedback {
            if let Some(hook) = self.feedback.read().unwrap().as_ref() {
                hook(&outcome);
            }
        }

        tracing::debug!(
            uid = %self.session.uid,
            activity_id,
            xp = outcome.xp_gain,
            gold = outcome.gold_gain,
            negative = outcome.negative,
            "Activity logged"
        );
        Ok(outcome)
    }

    // ─── Queries ─────────────────────────────────────────────────

    pub fn activities(&self) -> HashMap<String, Activity> {
        self.state.read().unwrap().activities.clone()
    }

    pub fn habits(&self) -> HashMap<String, Habit> {
        self.state.read().unwrap().habits.clone()
    }

    pub fn current_habits(&self) -> HashMap<String, Habit> {
        self.state.read().unwrap().current_habits.clone()
    }

    pub fn todos(&self) -> HashMap<String, Todo> {
        self.state.read().unwrap().todos.clone()
    }

    pub fn habit_log(&self) -> HabitLog {
        self.state.read().unwrap().habit_log.clone()
    }

    /// Active habits whose recurrence rule fires today.
    pub fn habits_due_today(&self) -> HashMap<String, Habit> {
        let state = self.state.read().unwrap();
        recurrence::habits_due_on(&state.current_habits, local_today())
    }

    /// Consecutive completed days ending at `reference`.
    pub fn calculate_streak(&self, habit_id: &str, reference: NaiveDate) -> u32 {
        let state = self.state.read().unwrap();
        self.streaks.calculate(&state.habit_log, habit_id, reference)
    }

    /// Streak ending today.
    pub fn current_streak(&self, habit_id: &str) -> u32 {
        self.calculate_streak(habit_id, local_today())
    }

    pub fn stats(&self) -> Stats {
        self.stats.current()
    }

    pub(crate) fn state_handle(&self) -> &RwLock<UserState> {
        &self.state
    }

    /// Last known remote `lastUpdated` (for diagnostics and tests).
    pub fn remote_last_updated(&self) -> Option<i64> {
        *self.remote_last_updated.lock().unwrap()
    }

    /// Assemble the atomic sync blob from current in-memory state.
    fn snapshot(&self, last_updated: i64) -> UserData {
        let state = self.state.read().unwrap();
        UserData {
            schema_version: SCHEMA_VERSION,
            activities: state.activities.clone(),
            habits: state.habits.clone(),
            current_habits: state.current_habits.clone(),
            todos: state.todos.clone(),
            habit_data: state.habit_log.clone(),
            last_updated,
        }
    }
}

impl Drop for HabitEngine {
    fn drop(&mut self) {
        if let Some(pending) = self.sync_timer.lock().unwrap().take() {
            pending.abort();
        }
    }
}

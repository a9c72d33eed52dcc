//! Storage layer: device-local cache and remote state store.

pub mod firestore;
pub mod local;
pub mod memory;
pub mod remote;

pub use firestore::FirestoreRemote;
pub use local::LocalStore;
pub use memory::MemoryRemote;
pub use remote::{RemoteStore, UserDataRow};

/// Per-user cache key names (`{uid}-{key}` on disk).
pub mod keys {
    pub const ACTIVITIES: &str = "activities";
    pub const HABITS: &str = "habits";
    pub const CURRENT_HABITS: &str = "currentHabits";
    pub const TODOS: &str = "todos";
    pub const HABIT_DATA: &str = "habitData";
    pub const LAST_UPDATED: &str = "lastUpdated";
    pub const LATEST_STREAKS: &str = "latestStreaks";
    pub const STATS: &str = "stats";

    /// The keys that must all be present for a local snapshot to count.
    pub const SNAPSHOT_KEYS: [&str; 6] = [
        ACTIVITIES,
        HABITS,
        CURRENT_HABITS,
        TODOS,
        HABIT_DATA,
        LAST_UPDATED,
    ];
}

/// Remote collection names as constants.
pub mod collections {
    /// UserData blob rows (keyed by uid)
    pub const USER_DATA: &str = "user_data";
    /// Stats rows with individual numeric columns (keyed by uid)
    pub const USER_STATS: &str = "user_stats";
}

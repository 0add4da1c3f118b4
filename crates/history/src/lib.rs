//! Recent-usage history for anti-repetition cooldowns.
//!
//! The store is an explicit, injectable object — handlers receive it by
//! reference instead of reaching for ambient module state — so it can be
//! swapped for a persistent backend and exercised directly in tests.

use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// One recorded draw: which text and state a user received, and when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Composite sacred key (`corpus.id`).
    pub sacred_id: String,
    pub state_key: String,
    pub at_ms: u64,
}

/// Storage contract for "recent N within the last D days" queries.
pub trait UsageStore: Send + Sync {
    fn record(&self, user: &str, record: UsageRecord);

    /// Most-recent-first records for `user`, at most `limit`, no older than
    /// `now_ms - within_ms`.
    fn recent(&self, user: &str, limit: usize, within_ms: u64, now_ms: u64) -> Vec<UsageRecord>;

    fn recent_sacred_ids(
        &self,
        user: &str,
        limit: usize,
        within_ms: u64,
        now_ms: u64,
    ) -> Vec<String> {
        self.recent(user, limit, within_ms, now_ms)
            .into_iter()
            .map(|r| r.sacred_id)
            .collect()
    }

    fn recent_state_keys(
        &self,
        user: &str,
        limit: usize,
        within_ms: u64,
        now_ms: u64,
    ) -> Vec<String> {
        self.recent(user, limit, within_ms, now_ms)
            .into_iter()
            .map(|r| r.state_key)
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct HistoryConfig {
    /// Distinct users kept in memory before the least-recently-seen is dropped.
    pub max_users: usize,
    /// Records kept per user.
    pub per_user_capacity: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_users: 1024,
            per_user_capacity: 32,
        }
    }
}

/// In-memory [`UsageStore`] bounded by user count and per-user capacity.
pub struct MemoryUsageStore {
    per_user_capacity: usize,
    users: Mutex<LruCache<String, VecDeque<UsageRecord>>>,
}

impl MemoryUsageStore {
    pub fn new(config: HistoryConfig) -> Self {
        let max_users = NonZeroUsize::new(config.max_users.max(1)).expect("max(1) is nonzero");
        Self {
            per_user_capacity: config.per_user_capacity.max(1),
            users: Mutex::new(LruCache::new(max_users)),
        }
    }
}

impl Default for MemoryUsageStore {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

impl UsageStore for MemoryUsageStore {
    fn record(&self, user: &str, record: UsageRecord) {
        let mut users = self.users.lock().expect("history mutex poisoned");
        let entries = users.get_or_insert_mut(user.to_string(), VecDeque::new);
        entries.push_front(record);
        while entries.len() > self.per_user_capacity {
            entries.pop_back();
        }
    }

    fn recent(&self, user: &str, limit: usize, within_ms: u64, now_ms: u64) -> Vec<UsageRecord> {
        let cutoff = now_ms.saturating_sub(within_ms);
        let mut users = self.users.lock().expect("history mutex poisoned");
        let Some(entries) = users.get(user) else {
            return Vec::new();
        };
        entries
            .iter()
            .filter(|r| r.at_ms >= cutoff)
            .take(limit)
            .cloned()
            .collect()
    }
}

/// Milliseconds since the Unix epoch, saturating at zero on clock skew.
#[must_use]
pub fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const DAY_MS: u64 = 86_400_000;

    fn store() -> MemoryUsageStore {
        MemoryUsageStore::new(HistoryConfig {
            max_users: 4,
            per_user_capacity: 3,
        })
    }

    fn usage(sacred: &str, state: &str, at_ms: u64) -> UsageRecord {
        UsageRecord {
            sacred_id: sacred.to_string(),
            state_key: state.to_string(),
            at_ms,
        }
    }

    #[test]
    fn recent_is_most_recent_first() {
        let store = store();
        store.record("u1", usage("yoga_sutras.YS.1.1", "anxiety", 1_000));
        store.record("u1", usage("yoga_sutras.YS.2.16", "grief", 2_000));

        let ids = store.recent_sacred_ids("u1", 10, DAY_MS, 3_000);
        assert_eq!(
            ids,
            vec![
                "yoga_sutras.YS.2.16".to_string(),
                "yoga_sutras.YS.1.1".to_string()
            ]
        );
    }

    #[test]
    fn window_excludes_stale_records() {
        let store = store();
        store.record("u1", usage("legacy.LEG.BG.2.47", "avoidance", 0));
        store.record("u1", usage("puranas.PUR.BHA.1.2.6", "anxiety", 10 * DAY_MS));

        let recent = store.recent("u1", 10, DAY_MS, 10 * DAY_MS + 1);
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].sacred_id, "puranas.PUR.BHA.1.2.6");
    }

    #[test]
    fn per_user_capacity_evicts_oldest() {
        let store = store();
        for i in 0..5u64 {
            store.record("u1", usage(&format!("legacy.X.{i}"), "anxiety", i));
        }
        let recent = store.recent("u1", 10, DAY_MS, 10);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[0].sacred_id, "legacy.X.4");
        assert_eq!(recent[2].sacred_id, "legacy.X.2");
    }

    #[test]
    fn unknown_user_has_no_history() {
        let store = store();
        assert!(store.recent("ghost", 10, DAY_MS, 1_000).is_empty());
    }

    #[test]
    fn user_capacity_evicts_least_recently_seen_user() {
        let store = store();
        for user in ["a", "b", "c", "d", "e"] {
            store.record(user, usage("legacy.X.0", "anxiety", 1));
        }
        // "a" was the least recently used of the five; capacity is four.
        assert!(store.recent("a", 10, DAY_MS, 2).is_empty());
        assert_eq!(store.recent("e", 10, DAY_MS, 2).len(), 1);
    }

    #[test]
    fn limit_caps_results() {
        let store = store();
        store.record("u1", usage("legacy.X.0", "anxiety", 1));
        store.record("u1", usage("legacy.X.1", "anxiety", 2));
        assert_eq!(store.recent_state_keys("u1", 1, DAY_MS, 3).len(), 1);
    }
}

//! Bounded replay-detection cache.
//!
//! The cache remembers `"<provider>-<timestamp>"` keys for timestamped
//! providers. Capacity is enforced FIFO: inserting into a full cache evicts
//! the earliest-inserted key regardless of its timestamp. Independently,
//! [`ReplayCache::sweep`] drops entries whose timestamp has aged past a
//! cutoff.
//!
//! In-memory and process-local; a restart forgets every key.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Insertion-ordered set of consumed replay keys.
#[derive(Debug)]
pub struct ReplayCache {
    max_entries: usize,
    entries: Mutex<Entries>,
}

#[derive(Debug, Default)]
struct Entries {
    seen: HashMap<String, i64>,
    // Insertion order; always holds exactly the keys of `seen`.
    order: VecDeque<String>,
}

impl ReplayCache {
    /// Creates an empty cache holding at most `max_entries` keys.
    #[must_use]
    pub fn new(max_entries: usize) -> Self {
        Self {
            max_entries: max_entries.max(1),
            entries: Mutex::new(Entries::default()),
        }
    }

    /// Records `key` if it has not been seen.
    ///
    /// Returns `true` when the key is fresh and was recorded, `false` when it
    /// is already present (a replay). The lookup and insert happen under one
    /// lock, so two concurrent callers with the same key cannot both succeed.
    pub fn check_and_insert(&self, key: String, timestamp: i64) -> bool {
        let mut entries = self.lock();
        if entries.seen.contains_key(&key) {
            return false;
        }

        while entries.seen.len() >= self.max_entries {
            let Some(oldest) = entries.order.pop_front() else {
                break;
            };
            entries.seen.remove(&oldest);
            tracing::debug!(evicted = %oldest, "Replay cache full, evicted oldest entry");
        }

        entries.order.push_back(key.clone());
        entries.seen.insert(key, timestamp);
        true
    }

    /// Returns whether `key` is currently recorded.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.lock().seen.contains_key(key)
    }

    /// Removes every entry whose timestamp is more than `max_age_secs`
    /// behind `now`, returning the number of entries left.
    pub fn sweep(&self, now: i64, max_age_secs: u64) -> usize {
        let mut entries = self.lock();
        let Entries { seen, order } = &mut *entries;
        seen.retain(|_, timestamp| !is_expired(*timestamp, now, max_age_secs));
        order.retain(|key| seen.contains_key(key));
        seen.len()
    }

    /// Forgets every recorded key.
    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.seen.clear();
        entries.order.clear();
    }

    /// Returns the number of recorded keys.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().seen.len()
    }

    /// Returns whether the cache is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the capacity.
    #[must_use]
    pub const fn max_entries(&self) -> usize {
        self.max_entries
    }

    fn lock(&self) -> MutexGuard<'_, Entries> {
        // The entries stay consistent even if a holder panicked mid-update,
        // at worst keeping one extra key, so poisoning is ignored.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn is_expired(timestamp: i64, now: i64, max_age_secs: u64) -> bool {
    now > timestamp && now.abs_diff(timestamp) > max_age_secs
}

//! Time-boxed reputation cache.
//!
//! The only mutable state shared across batch workers. Backed by a
//! [`DashMap`] so writes (keyed by user id) contend minimally. Entries are
//! owned by the engine and never handed out for external mutation; reads
//! clone the stored result.

use chrono::{DateTime, Utc};
use dashmap::DashMap;

use kudos_core::types::{NodeId, ReputationResult};

/// One cached result with its computation timestamp.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    pub result: ReputationResult,
    pub computed_at: DateTime<Utc>,
}

/// Concurrency-safe per-user result cache.
#[derive(Debug, Default)]
pub struct ReputationCache {
    entries: DashMap<NodeId, CacheEntry>,
}

impl ReputationCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Store a result keyed by its user id, stamped with `computed_at`.
    pub fn insert(&self, result: ReputationResult, computed_at: DateTime<Utc>) {
        self.entries.insert(
            result.user_id.clone(),
            CacheEntry {
                result,
                computed_at,
            },
        );
    }

    /// Entry for `user` if it is at most `max_age_minutes` old at `now`.
    ///
    /// Stale or absent entries read as `None`; never an error. Age is
    /// compared in whole minutes, so `max_age_minutes = 0` still returns
    /// entries written within the current minute.
    pub fn fresh(
        &self,
        user: &str,
        max_age_minutes: i64,
        now: DateTime<Utc>,
    ) -> Option<ReputationResult> {
        let entry = self.entries.get(user)?;
        if (now - entry.computed_at).num_minutes() <= max_age_minutes {
            Some(entry.result.clone())
        } else {
            None
        }
    }

    /// Drop a single entry (used when a user's edges are known to have
    /// changed).
    pub fn evict(&self, user: &str) {
        self.entries.remove(user);
    }

    /// Number of cached entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.clear();
    }
}

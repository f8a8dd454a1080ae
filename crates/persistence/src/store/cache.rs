//! Volatile in-process tier of the last-position store.
//!
//! A TTL map keyed by device id. Entries are only ever written by the
//! upsert that also wrote the durable tier, so an expired or missing entry
//! costs one durable read and can never serve wrong data.

use std::collections::HashMap;
use std::sync::RwLock;
use std::time::{Duration, Instant};

use domain::models::LastPosition;

struct CacheEntry {
    position: LastPosition,
    expires_at: Instant,
}

/// TTL cache of last positions.
pub struct PositionCache {
    entries: RwLock<HashMap<i64, CacheEntry>>,
    ttl: Duration,
}

impl PositionCache {
    /// Create a cache whose entries live for `ttl` after each write.
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// Fetch a live entry. Expired entries read as absent.
    pub fn get(&self, device_id: i64) -> Option<LastPosition> {
        let entries = self.entries.read().unwrap();
        entries
            .get(&device_id)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.position.clone())
    }

    /// Insert or replace the entry for a device, restarting its TTL.
    pub fn insert(&self, position: LastPosition) {
        let mut entries = self.entries.write().unwrap();
        entries.insert(
            position.device_id,
            CacheEntry {
                position,
                expires_at: Instant::now() + self.ttl,
            },
        );
    }

    /// Drop expired entries. Returns how many were evicted.
    pub fn sweep(&self) -> usize {
        let mut entries = self.entries.write().unwrap();
        let now = Instant::now();
        let before = entries.len();
        entries.retain(|_, entry| entry.expires_at > now);
        before - entries.len()
    }

    /// Number of entries currently held, including not-yet-swept expired ones.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().unwrap().is_empty()
    }
}

//! Read-through/write-through composition of the two store tiers.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use domain::models::LastPosition;

use crate::repositories::PositionUpdate;

use super::{LastPositionStore, PositionCache};

/// Two-tier position store.
///
/// Upserts go to the durable tier first; only after that commit is the
/// cache written. Reads consult the cache and fall back to the durable
/// tier on a miss without refilling the cache: entries are only ever
/// populated by the upsert path, so the cache can be stale-absent but
/// never wrong.
pub struct TieredLastPositionStore {
    cache: PositionCache,
    durable: Arc<dyn LastPositionStore>,
}

impl TieredLastPositionStore {
    pub fn new(durable: Arc<dyn LastPositionStore>, cache_ttl: Duration) -> Self {
        Self {
            cache: PositionCache::new(cache_ttl),
            durable,
        }
    }

    /// The volatile tier, exposed for the periodic sweep job.
    pub fn cache(&self) -> &PositionCache {
        &self.cache
    }
}

#[async_trait]
impl LastPositionStore for TieredLastPositionStore {
    async fn upsert(&self, update: &PositionUpdate) -> Result<LastPosition, sqlx::Error> {
        let position = self.durable.upsert(update).await?;
        self.cache.insert(position.clone());
        Ok(position)
    }

    async fn get(&self, device_id: i64) -> Result<Option<LastPosition>, sqlx::Error> {
        if let Some(position) = self.cache.get(device_id) {
            return Ok(Some(position));
        }
        debug!(device_id, "Position cache miss, reading durable tier");
        self.durable.get(device_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    /// In-memory durable tier standing in for Postgres.
    #[derive(Default)]
    struct FakeDurableStore {
        rows: Mutex<HashMap<i64, LastPosition>>,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl LastPositionStore for FakeDurableStore {
        async fn upsert(&self, update: &PositionUpdate) -> Result<LastPosition, sqlx::Error> {
            let position = LastPosition {
                device_id: update.device_id,
                bus_id: update.bus_id,
                latitude: update.latitude,
                longitude: update.longitude,
                accuracy: update.accuracy,
                altitude: update.altitude,
                speed: update.speed,
                heading: update.heading,
                provider: update.provider.clone(),
                battery_level: update.battery_level,
                network_type: update.network_type.clone(),
                timestamp: update.timestamp,
                updated_at: Utc::now(),
            };
            self.rows
                .lock()
                .unwrap()
                .insert(update.device_id, position.clone());
            Ok(position)
        }

        async fn get(&self, device_id: i64) -> Result<Option<LastPosition>, sqlx::Error> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.rows.lock().unwrap().get(&device_id).cloned())
        }
    }

    fn update(device_id: i64, latitude: f64, speed: Option<f64>) -> PositionUpdate {
        PositionUpdate {
            device_id,
            bus_id: Some(7),
            latitude,
            longitude: 9.19,
            accuracy: 5.0,
            altitude: None,
            speed,
            heading: None,
            provider: Some("gps".to_string()),
            battery_level: Some(80),
            network_type: None,
            timestamp: Utc::now(),
        }
    }

    fn tiered(ttl: Duration) -> (Arc<FakeDurableStore>, TieredLastPositionStore) {
        let durable = Arc::new(FakeDurableStore::default());
        let store = TieredLastPositionStore::new(durable.clone(), ttl);
        (durable, store)
    }

    #[tokio::test]
    async fn test_upsert_writes_through_to_cache() {
        let (durable, store) = tiered(Duration::from_secs(60));

        store.upsert(&update(1, 45.46, None)).await.unwrap();

        // Served from cache: no durable read happens.
        let position = store.get(1).await.unwrap().unwrap();
        assert_eq!(position.latitude, 45.46);
        assert_eq!(durable.reads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_get_miss_falls_back_without_refill() {
        let (durable, store) = tiered(Duration::from_millis(10));

        store.upsert(&update(1, 45.46, None)).await.unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Expired cache entry: both reads go to the durable tier, because
        // reads never repopulate the cache.
        assert!(store.get(1).await.unwrap().is_some());
        assert!(store.get(1).await.unwrap().is_some());
        assert_eq!(durable.reads.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_get_unknown_device_is_absent() {
        let (_, store) = tiered(Duration::from_secs(60));
        assert!(store.get(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_last_writer_wins_full_replacement() {
        let (_, store) = tiered(Duration::from_secs(60));

        let mut first = update(1, 45.46, Some(20.0));
        first.battery_level = Some(90);
        store.upsert(&first).await.unwrap();

        // Second write carries an older client timestamp and fewer fields;
        // it still fully replaces the row. Nothing merges.
        let mut second = update(1, 45.47, None);
        second.timestamp = first.timestamp - chrono::Duration::minutes(10);
        second.battery_level = None;
        store.upsert(&second).await.unwrap();

        let position = store.get(1).await.unwrap().unwrap();
        assert_eq!(position.latitude, 45.47);
        assert_eq!(position.speed, None);
        assert_eq!(position.battery_level, None);
        assert_eq!(position.timestamp, second.timestamp);
    }

    #[tokio::test]
    async fn test_upsert_updates_cache_entry() {
        let (durable, store) = tiered(Duration::from_secs(60));

        store.upsert(&update(1, 45.46, None)).await.unwrap();
        store.upsert(&update(1, 45.47, None)).await.unwrap();

        let position = store.get(1).await.unwrap().unwrap();
        assert_eq!(position.latitude, 45.47);
        assert_eq!(durable.reads.load(Ordering::SeqCst), 0);
    }
}

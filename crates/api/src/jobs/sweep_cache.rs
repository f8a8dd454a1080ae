//! Position-cache sweep background job.
//!
//! Expired cache entries already read as absent; the sweep reclaims their
//! memory.

use std::sync::Arc;

use tracing::info;

use persistence::store::TieredLastPositionStore;

use super::scheduler::{Job, JobFrequency};

/// Background job evicting expired entries from the volatile position tier.
pub struct SweepPositionCacheJob {
    store: Arc<TieredLastPositionStore>,
}

impl SweepPositionCacheJob {
    pub fn new(store: Arc<TieredLastPositionStore>) -> Self {
        Self { store }
    }
}

#[async_trait::async_trait]
impl Job for SweepPositionCacheJob {
    fn name(&self) -> &'static str {
        "sweep_position_cache"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(5)
    }

    async fn execute(&self) -> Result<(), String> {
        let evicted = self.store.cache().sweep();
        if evicted > 0 {
            info!(evicted, "Expired position cache entries removed");
        }
        Ok(())
    }
}

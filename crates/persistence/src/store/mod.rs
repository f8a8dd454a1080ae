//! The last-position store: authoritative per-device latest fix.
//!
//! Two swappable tiers behind one trait:
//! - [`PgLastPositionStore`] is the durable source of truth;
//! - [`PositionCache`] is a volatile in-process tier with per-entry TTL;
//! - [`TieredLastPositionStore`] composes the two, write-through on upsert
//!   and read-through (cache first, durable on miss) on get.
//!
//! Consumers depend on [`LastPositionStore`] and stay unaware of caching.

mod cache;
mod durable;
mod tiered;

pub use cache::PositionCache;
pub use durable::PgLastPositionStore;
pub use tiered::TieredLastPositionStore;

use async_trait::async_trait;
use domain::models::LastPosition;

use crate::repositories::PositionUpdate;

/// Authoritative per-device position storage.
#[async_trait]
pub trait LastPositionStore: Send + Sync {
    /// Replace the device's row with the given fix and stamp `updated_at`.
    /// Last-writer-wins: no field is merged from the prior row.
    async fn upsert(&self, update: &PositionUpdate) -> Result<LastPosition, sqlx::Error>;

    /// Fetch the device's last position, absent if it never reported.
    async fn get(&self, device_id: i64) -> Result<Option<LastPosition>, sqlx::Error>;
}

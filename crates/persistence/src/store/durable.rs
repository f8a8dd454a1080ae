//! Durable tier of the last-position store, backed by Postgres.

use async_trait::async_trait;
use sqlx::PgPool;

use domain::models::LastPosition;

use crate::repositories::{LastPositionRepository, PositionUpdate};

use super::LastPositionStore;

/// Postgres-backed position store; the source of truth across restarts.
#[derive(Clone)]
pub struct PgLastPositionStore {
    repo: LastPositionRepository,
}

impl PgLastPositionStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: LastPositionRepository::new(pool),
        }
    }
}

#[async_trait]
impl LastPositionStore for PgLastPositionStore {
    async fn upsert(&self, update: &PositionUpdate) -> Result<LastPosition, sqlx::Error> {
        let entity = self.repo.upsert(update).await?;
        Ok(entity.into())
    }

    async fn get(&self, device_id: i64) -> Result<Option<LastPosition>, sqlx::Error> {
        let entity = self.repo.get(device_id).await?;
        Ok(entity.map(Into::into))
    }
}

//! Expired-nonce cleanup background job.
//!
//! The check-and-set reclaims an expired row in place, so this sweep only
//! bounds table growth; correctness does not depend on it.

use sqlx::PgPool;
use tracing::info;

use persistence::repositories::NonceRepository;

use super::scheduler::{Job, JobFrequency};

/// Background job deleting replay-nonce rows past their TTL.
pub struct CleanupNoncesJob {
    repo: NonceRepository,
}

impl CleanupNoncesJob {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: NonceRepository::new(pool),
        }
    }
}

#[async_trait::async_trait]
impl Job for CleanupNoncesJob {
    fn name(&self) -> &'static str {
        "cleanup_nonces"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(15)
    }

    async fn execute(&self) -> Result<(), String> {
        let deleted = self
            .repo
            .delete_expired()
            .await
            .map_err(|e| format!("Failed to delete expired nonces: {}", e))?;

        if deleted > 0 {
            info!(deleted, "Expired nonces removed");
        }

        Ok(())
    }
}

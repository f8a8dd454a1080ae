//! Connection-pool metrics background job.

use sqlx::PgPool;

use crate::middleware::metrics::record_connection_pool_metrics;

use super::scheduler::{Job, JobFrequency};

/// Background job exporting database connection pool gauges.
pub struct PoolMetricsJob {
    pool: PgPool,
}

impl PoolMetricsJob {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl Job for PoolMetricsJob {
    fn name(&self) -> &'static str {
        "pool_metrics"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Minutes(1)
    }

    async fn execute(&self) -> Result<(), String> {
        let size = self.pool.size();
        let idle = self.pool.num_idle() as u32;
        record_connection_pool_metrics(size.saturating_sub(idle), idle);
        Ok(())
    }
}

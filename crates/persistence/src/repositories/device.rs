//! Device repository for database operations.
//!
//! Device registration and lifecycle management live in the admin
//! subsystem; the ingestion path only resolves identities and touches the
//! last-seen marker.

use sqlx::PgPool;
use uuid::Uuid;

use crate::entities::DeviceEntity;

/// Repository for device-related database operations.
#[derive(Clone)]
pub struct DeviceRepository {
    pool: PgPool,
}

impl DeviceRepository {
    /// Creates a new DeviceRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a device by its external UUID.
    pub async fn find_by_uuid(&self, uuid: Uuid) -> Result<Option<DeviceEntity>, sqlx::Error> {
        sqlx::query_as::<_, DeviceEntity>(
            r#"
            SELECT id, uuid, platform, app_version, device_model, os_version,
                   status, last_seen_at, created_at
            FROM devices
            WHERE uuid = $1
            "#,
        )
        .bind(uuid)
        .fetch_optional(&self.pool)
        .await
    }

    /// Stamp the device's last-seen marker with the current server time.
    /// Returns the number of rows affected (0 if the device is gone).
    pub async fn touch_last_seen(&self, device_id: i64) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE devices
            SET last_seen_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(device_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }
}

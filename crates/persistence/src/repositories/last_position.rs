//! Last-position repository: the durable tier of the position store.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::entities::LastPositionEntity;

/// All fields written by a position upsert.
///
/// The upsert replaces the full row; no field is merged from the prior
/// value, which is what makes concurrent writers for one device converge
/// to whichever write lands last.
#[derive(Debug, Clone)]
pub struct PositionUpdate {
    pub device_id: i64,
    pub bus_id: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    pub altitude: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub provider: Option<String>,
    pub battery_level: Option<i32>,
    pub network_type: Option<String>,
    /// Client-reported capture time.
    pub timestamp: DateTime<Utc>,
}

/// Repository for the last_positions table.
#[derive(Clone)]
pub struct LastPositionRepository {
    pool: PgPool,
}

impl LastPositionRepository {
    /// Creates a new LastPositionRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Atomically replace the device's row and stamp `updated_at`.
    /// Returns the stored row.
    pub async fn upsert(
        &self,
        update: &PositionUpdate,
    ) -> Result<LastPositionEntity, sqlx::Error> {
        sqlx::query_as::<_, LastPositionEntity>(
            r#"
            INSERT INTO last_positions (
                device_id, bus_id, latitude, longitude, accuracy, altitude,
                speed, heading, provider, battery_level, network_type,
                timestamp, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, NOW())
            ON CONFLICT (device_id) DO UPDATE SET
                bus_id = EXCLUDED.bus_id,
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude,
                accuracy = EXCLUDED.accuracy,
                altitude = EXCLUDED.altitude,
                speed = EXCLUDED.speed,
                heading = EXCLUDED.heading,
                provider = EXCLUDED.provider,
                battery_level = EXCLUDED.battery_level,
                network_type = EXCLUDED.network_type,
                timestamp = EXCLUDED.timestamp,
                updated_at = NOW()
            RETURNING device_id, bus_id, latitude, longitude, accuracy, altitude,
                      speed, heading, provider, battery_level, network_type,
                      timestamp, updated_at
            "#,
        )
        .bind(update.device_id)
        .bind(update.bus_id)
        .bind(update.latitude)
        .bind(update.longitude)
        .bind(update.accuracy)
        .bind(update.altitude)
        .bind(update.speed)
        .bind(update.heading)
        .bind(update.provider.as_deref())
        .bind(update.battery_level)
        .bind(update.network_type.as_deref())
        .bind(update.timestamp)
        .fetch_one(&self.pool)
        .await
    }

    /// Fetch a device's last position, if it has ever reported.
    pub async fn get(&self, device_id: i64) -> Result<Option<LastPositionEntity>, sqlx::Error> {
        sqlx::query_as::<_, LastPositionEntity>(
            r#"
            SELECT device_id, bus_id, latitude, longitude, accuracy, altitude,
                   speed, heading, provider, battery_level, network_type,
                   timestamp, updated_at
            FROM last_positions
            WHERE device_id = $1
            "#,
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await
    }
}

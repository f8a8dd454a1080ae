//! Location archive repository.
//!
//! The locations table is the append-only history of every accepted fix.
//! It is off the live path: writes are best-effort from the ingestion
//! pipeline and reads serve the history endpoint only.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::entities::LocationEntity;
use crate::repositories::PositionUpdate;

/// Parameters for a cursor-paginated history query.
#[derive(Debug, Clone)]
pub struct LocationHistoryQuery {
    pub device_id: i64,
    pub cursor_timestamp: Option<DateTime<Utc>>,
    pub cursor_id: Option<i64>,
    pub from_timestamp: Option<DateTime<Utc>>,
    pub to_timestamp: Option<DateTime<Utc>>,
    pub limit: i32,
    pub ascending: bool,
}

/// Repository for the locations archive.
#[derive(Clone)]
pub struct LocationRepository {
    pool: PgPool,
}

impl LocationRepository {
    /// Creates a new LocationRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Append one accepted fix to the archive. Returns the new row id.
    pub async fn append(&self, update: &PositionUpdate) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO locations (
                device_id, bus_id, latitude, longitude, accuracy, altitude,
                speed, heading, provider, battery_level, network_type, timestamp
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
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
        .await?;

        Ok(row.0)
    }

    /// Cursor-paginated history for a device.
    ///
    /// Fetches one row past the limit to detect whether more results exist;
    /// the extra row is dropped from the returned page.
    pub async fn history(
        &self,
        query: LocationHistoryQuery,
    ) -> Result<(Vec<LocationEntity>, bool), sqlx::Error> {
        let sql = if query.ascending {
            r#"
            SELECT id, device_id, bus_id, latitude, longitude, accuracy, altitude,
                   speed, heading, provider, battery_level, network_type,
                   timestamp, created_at
            FROM locations
            WHERE device_id = $1
              AND ($2::timestamptz IS NULL OR timestamp >= $2)
              AND ($3::timestamptz IS NULL OR timestamp <= $3)
              AND ($4::timestamptz IS NULL OR (timestamp, id) > ($4, $5))
            ORDER BY timestamp ASC, id ASC
            LIMIT $6
            "#
        } else {
            r#"
            SELECT id, device_id, bus_id, latitude, longitude, accuracy, altitude,
                   speed, heading, provider, battery_level, network_type,
                   timestamp, created_at
            FROM locations
            WHERE device_id = $1
              AND ($2::timestamptz IS NULL OR timestamp >= $2)
              AND ($3::timestamptz IS NULL OR timestamp <= $3)
              AND ($4::timestamptz IS NULL OR (timestamp, id) < ($4, $5))
            ORDER BY timestamp DESC, id DESC
            LIMIT $6
            "#
        };

        let mut rows = sqlx::query_as::<_, LocationEntity>(sql)
            .bind(query.device_id)
            .bind(query.from_timestamp)
            .bind(query.to_timestamp)
            .bind(query.cursor_timestamp)
            .bind(query.cursor_id)
            .bind(query.limit as i64 + 1)
            .fetch_all(&self.pool)
            .await?;

        let has_more = rows.len() > query.limit as usize;
        rows.truncate(query.limit as usize);

        Ok((rows, has_more))
    }
}

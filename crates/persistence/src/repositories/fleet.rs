//! Fleet topology reads consumed by the ingestion pipeline and the
//! snapshot builder. Topology itself (lines, buses, assignments) is
//! maintained by the admin subsystem.

use sqlx::PgPool;

use crate::entities::{BusAssignment, LiveBusRowEntity};

/// Repository for bus/line topology queries.
#[derive(Clone)]
pub struct FleetRepository {
    pool: PgPool,
}

impl FleetRepository {
    /// Creates a new FleetRepository with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Resolve the active bus a device is currently mounted in, if any.
    pub async fn bus_for_device(
        &self,
        device_id: i64,
    ) -> Result<Option<BusAssignment>, sqlx::Error> {
        sqlx::query_as::<_, BusAssignment>(
            r#"
            SELECT id AS bus_id, line_id
            FROM buses
            WHERE device_id = $1 AND status = 'active'
            "#,
        )
        .bind(device_id)
        .fetch_optional(&self.pool)
        .await
    }

    /// Resolve the device mounted in a bus, if any.
    pub async fn device_for_bus(&self, bus_id: i64) -> Result<Option<i64>, sqlx::Error> {
        let row: Option<(Option<i64>,)> =
            sqlx::query_as("SELECT device_id FROM buses WHERE id = $1")
                .bind(bus_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.and_then(|(device_id,)| device_id))
    }

    /// All active buses with their line and last-position columns, ordered
    /// by display label. The optional line filter is part of the query;
    /// movement status is derived by the caller.
    pub async fn live_rows(
        &self,
        line_id: Option<i64>,
    ) -> Result<Vec<LiveBusRowEntity>, sqlx::Error> {
        sqlx::query_as::<_, LiveBusRowEntity>(
            r#"
            SELECT
                b.id AS bus_id,
                b.label,
                b.plate,
                l.id AS line_id,
                l.name AS line_name,
                l.code AS line_code,
                l.color AS line_color,
                lp.latitude,
                lp.longitude,
                lp.speed,
                lp.heading,
                lp.battery_level,
                lp.timestamp AS gps_timestamp,
                lp.updated_at
            FROM buses b
            LEFT JOIN lines l ON b.line_id = l.id
            LEFT JOIN devices d ON b.device_id = d.id
            LEFT JOIN last_positions lp ON d.id = lp.device_id
            WHERE b.status = 'active'
              AND ($1::bigint IS NULL OR b.line_id = $1)
            ORDER BY b.label
            "#,
        )
        .bind(line_id)
        .fetch_all(&self.pool)
        .await
    }
}

//! Last-position entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use domain::models::LastPosition;

/// Database row mapping for the last_positions table.
///
/// Keyed by device id; exactly one row per device that has ever reported.
#[derive(Debug, Clone, FromRow)]
pub struct LastPositionEntity {
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
    pub timestamp: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<LastPositionEntity> for LastPosition {
    fn from(entity: LastPositionEntity) -> Self {
        Self {
            device_id: entity.device_id,
            bus_id: entity.bus_id,
            latitude: entity.latitude,
            longitude: entity.longitude,
            accuracy: entity.accuracy,
            altitude: entity.altitude,
            speed: entity.speed,
            heading: entity.heading,
            provider: entity.provider,
            battery_level: entity.battery_level,
            network_type: entity.network_type,
            timestamp: entity.timestamp,
            updated_at: entity.updated_at,
        }
    }
}

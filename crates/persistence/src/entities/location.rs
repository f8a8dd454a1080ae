//! Archived location entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Database row mapping for the locations archive table.
#[derive(Debug, Clone, FromRow)]
pub struct LocationEntity {
    pub id: i64,
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
    pub created_at: DateTime<Utc>,
}

impl From<LocationEntity> for domain::models::telemetry::HistoryItem {
    fn from(entity: LocationEntity) -> Self {
        Self {
            id: entity.id,
            latitude: entity.latitude,
            longitude: entity.longitude,
            accuracy: entity.accuracy,
            speed: entity.speed,
            heading: entity.heading,
            timestamp: entity.timestamp,
        }
    }
}

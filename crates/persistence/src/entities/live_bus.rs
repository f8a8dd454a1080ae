//! Row mappings for the live fleet join.

use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A device's current bus assignment, resolved from topology.
#[derive(Debug, Clone, Copy, FromRow)]
pub struct BusAssignment {
    pub bus_id: i64,
    pub line_id: Option<i64>,
}

/// One row of the active-buses join: topology columns plus the (possibly
/// absent) last-position columns. Status derivation happens in code, not
/// in the query.
#[derive(Debug, Clone, FromRow)]
pub struct LiveBusRowEntity {
    pub bus_id: i64,
    pub label: String,
    pub plate: Option<String>,
    pub line_id: Option<i64>,
    pub line_name: Option<String>,
    pub line_code: Option<String>,
    pub line_color: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub battery_level: Option<i32>,
    pub gps_timestamp: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

//! Telemetry domain models: reported fixes, last positions, broadcast events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Request payload for a single fix submission.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SubmitFixRequest {
    /// External device identity.
    pub device_id: Uuid,

    /// Client timestamp in milliseconds since epoch.
    #[validate(custom(function = "shared::validation::validate_timestamp"))]
    pub timestamp: i64,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(custom(function = "shared::validation::validate_accuracy"))]
    pub accuracy: f64,

    pub altitude: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_speed"))]
    pub speed: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_heading"))]
    pub heading: Option<f64>,

    pub provider: Option<String>,

    #[validate(custom(function = "shared::validation::validate_battery_level"))]
    pub battery_level: Option<i32>,

    pub network_type: Option<String>,

    /// One-time replay-protection token.
    #[validate(custom(function = "shared::validation::validate_nonce"))]
    pub nonce: Option<String>,
}

impl From<SubmitFixRequest> for FixData {
    fn from(req: SubmitFixRequest) -> Self {
        Self {
            timestamp: req.timestamp,
            latitude: req.latitude,
            longitude: req.longitude,
            accuracy: req.accuracy,
            altitude: req.altitude,
            speed: req.speed,
            heading: req.heading,
            provider: req.provider,
            battery_level: req.battery_level,
            network_type: req.network_type,
            nonce: req.nonce,
        }
    }
}

/// Request payload for batch fix submission.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct BatchSubmitRequest {
    pub device_id: Uuid,

    #[validate(length(min = 1, max = 100, message = "Batch must contain 1-100 fixes"))]
    pub fixes: Vec<FixData>,
}

/// One reported location observation.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FixData {
    /// Client timestamp in milliseconds since epoch.
    #[validate(custom(function = "shared::validation::validate_timestamp"))]
    pub timestamp: i64,

    #[validate(custom(function = "shared::validation::validate_latitude"))]
    pub latitude: f64,

    #[validate(custom(function = "shared::validation::validate_longitude"))]
    pub longitude: f64,

    #[validate(custom(function = "shared::validation::validate_accuracy"))]
    pub accuracy: f64,

    pub altitude: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_speed"))]
    pub speed: Option<f64>,

    #[validate(custom(function = "shared::validation::validate_heading"))]
    pub heading: Option<f64>,

    pub provider: Option<String>,

    #[validate(custom(function = "shared::validation::validate_battery_level"))]
    pub battery_level: Option<i32>,

    pub network_type: Option<String>,

    #[validate(custom(function = "shared::validation::validate_nonce"))]
    pub nonce: Option<String>,
}

/// Response for a single accepted submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubmitFixResponse {
    /// Archive row id; absent when the best-effort archive write failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub status: String,
    pub received_at: DateTime<Utc>,
    pub next_expected_at: DateTime<Utc>,
}

/// Response for a batch submission: per-fix outcomes, tallied.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSubmitResponse {
    pub accepted: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub ids: Vec<i64>,
    pub received_at: DateTime<Utc>,
    pub next_expected_at: DateTime<Utc>,
}

/// Authoritative last known position of a device.
///
/// One row per device; replaced wholesale on every accepted fix. The
/// `updated_at` stamp is server-assigned at upsert time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LastPosition {
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
    /// Server time of the accepting upsert.
    pub updated_at: DateTime<Utc>,
}

/// Transient event carried on the live feed; never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BroadcastMessage {
    pub device_id: i64,
    pub bus_id: Option<i64>,
    pub latitude: f64,
    pub longitude: f64,
    pub speed: Option<f64>,
    pub heading: Option<f64>,
    pub battery_level: Option<i32>,
    pub timestamp: DateTime<Utc>,
}

impl BroadcastMessage {
    /// Build the broadcast event for an accepted position update.
    pub fn from_position(position: &LastPosition) -> Self {
        Self {
            device_id: position.device_id,
            bus_id: position.bus_id,
            latitude: position.latitude,
            longitude: position.longitude,
            speed: position.speed,
            heading: position.heading,
            battery_level: position.battery_level,
            timestamp: position.timestamp,
        }
    }
}

// ============================================================================
// Location history (GET /api/v1/telemetry/history)
// ============================================================================

/// Sort order for history queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl<'de> serde::Deserialize<'de> for SortOrder {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            _ => Err(serde::de::Error::custom("order must be 'asc' or 'desc'")),
        }
    }
}

/// Query parameters for the history endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct GetHistoryQuery {
    pub bus_id: i64,

    /// Opaque cursor (base64-encoded timestamp:id).
    pub cursor: Option<String>,

    /// Number of results per page (1-1000, default 100).
    pub limit: Option<i32>,

    /// Start timestamp filter (milliseconds since epoch).
    pub from: Option<i64>,

    /// End timestamp filter (milliseconds since epoch).
    pub to: Option<i64>,

    #[serde(default)]
    pub order: SortOrder,
}

impl GetHistoryQuery {
    pub const DEFAULT_LIMIT: i32 = 100;
    pub const MAX_LIMIT: i32 = 1000;
    pub const MIN_LIMIT: i32 = 1;

    /// Returns the effective limit, clamped to valid range.
    pub fn effective_limit(&self) -> i32 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(Self::MIN_LIMIT, Self::MAX_LIMIT)
    }
}

/// Single archived fix in a history response.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryItem {
    pub id: i64,
    pub latitude: f64,
    pub longitude: f64,
    pub accuracy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// Pagination info for cursor-based pagination.
#[derive(Debug, Clone, Serialize)]
pub struct PaginationInfo {
    pub next_cursor: Option<String>,
    pub has_more: bool,
}

/// Response payload for the history endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct HistoryResponse {
    pub bus_id: i64,
    pub locations: Vec<HistoryItem>,
    pub pagination: PaginationInfo,
}

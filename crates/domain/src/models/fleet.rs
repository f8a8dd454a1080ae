//! Fleet view models: the live-bus join and its filters.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::status::{MovementStatus, SignalStrength};

/// Status filter for the live fleet view, applied after derivation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    Moving,
    Stopped,
    Offline,
    All,
}

impl StatusFilter {
    /// Whether a derived movement status passes this filter.
    pub fn matches(&self, status: MovementStatus) -> bool {
        match self {
            StatusFilter::All => true,
            StatusFilter::Moving => status == MovementStatus::Moving,
            StatusFilter::Stopped => status == MovementStatus::Stopped,
            StatusFilter::Offline => status == MovementStatus::Offline,
        }
    }
}

/// Query parameters for the live fleet view.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LiveBusQuery {
    pub line_id: Option<i64>,
    pub status: Option<StatusFilter>,
}

/// One bus in the live fleet view.
///
/// Derived and ephemeral: topology joined with the device's last position
/// and the status classification. Buses whose device has never reported
/// appear with null geo fields and derive offline.
#[derive(Debug, Clone, Serialize)]
pub struct LiveBusView {
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
    pub last_update: Option<DateTime<Utc>>,
    pub status: MovementStatus,
    pub signal_strength: SignalStrength,
}

/// Response envelope for the live fleet view.
#[derive(Debug, Clone, Serialize)]
pub struct FleetLiveResponse {
    /// The shared snapshot instant all rows were classified against.
    pub timestamp: DateTime<Utc>,
    pub buses: Vec<LiveBusView>,
}

/// Aggregate movement counts over the active fleet.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct BusStats {
    pub total: usize,
    pub active: usize,
    pub moving: usize,
    pub stopped: usize,
    pub offline: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_filter_matches() {
        assert!(StatusFilter::All.matches(MovementStatus::Moving));
        assert!(StatusFilter::All.matches(MovementStatus::Offline));
        assert!(StatusFilter::Moving.matches(MovementStatus::Moving));
        assert!(!StatusFilter::Moving.matches(MovementStatus::Stopped));
        assert!(StatusFilter::Offline.matches(MovementStatus::Offline));
        assert!(!StatusFilter::Stopped.matches(MovementStatus::Offline));
    }

    #[test]
    fn test_live_bus_query_deserialization() {
        let q: LiveBusQuery = serde_json::from_str(r#"{"line_id": 3, "status": "moving"}"#).unwrap();
        assert_eq!(q.line_id, Some(3));
        assert_eq!(q.status, Some(StatusFilter::Moving));

        let q: LiveBusQuery = serde_json::from_str("{}").unwrap();
        assert!(q.line_id.is_none());
        assert!(q.status.is_none());
    }

    #[test]
    fn test_live_bus_view_serialization() {
        let view = LiveBusView {
            bus_id: 7,
            label: "B-07".to_string(),
            plate: Some("AB123CD".to_string()),
            line_id: Some(1),
            line_name: Some("Centro - Stazione".to_string()),
            line_code: Some("L1".to_string()),
            line_color: Some("#d62828".to_string()),
            latitude: Some(45.46),
            longitude: Some(9.19),
            speed: Some(14.0),
            heading: Some(180.0),
            battery_level: Some(72),
            last_update: Some(Utc::now()),
            status: MovementStatus::Moving,
            signal_strength: SignalStrength::Strong,
        };
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains("\"status\":\"moving\""));
        assert!(json.contains("\"signal_strength\":\"strong\""));
        assert!(json.contains("\"bus_id\":7"));
    }
}

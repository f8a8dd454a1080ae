//! Device domain model.
//!
//! Devices are owned by the registration subsystem; the core only reads
//! identity and lifecycle status, and touches the last-seen marker.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lifecycle status of a reporting device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceStatus {
    Active,
    Inactive,
    Revoked,
}

impl DeviceStatus {
    /// Parse from the database string representation.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(DeviceStatus::Active),
            "inactive" => Some(DeviceStatus::Inactive),
            "revoked" => Some(DeviceStatus::Revoked),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DeviceStatus::Active => "active",
            DeviceStatus::Inactive => "inactive",
            DeviceStatus::Revoked => "revoked",
        }
    }
}

/// Represents a registered reporting device.
#[derive(Debug, Clone, Serialize)]
pub struct Device {
    /// Internal numeric id, used as the storage key for positions.
    pub id: i64,
    /// Stable external identity presented by the mobile client.
    pub uuid: Uuid,
    pub platform: String,
    pub app_version: Option<String>,
    pub device_model: Option<String>,
    pub os_version: Option<String>,
    pub status: DeviceStatus,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Device {
    /// Whether the device may submit location fixes.
    pub fn can_report(&self) -> bool {
        self.status == DeviceStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_device(status: DeviceStatus) -> Device {
        Device {
            id: 1,
            uuid: Uuid::new_v4(),
            platform: "android".to_string(),
            app_version: Some("2.1.0".to_string()),
            device_model: None,
            os_version: None,
            status,
            last_seen_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_status_parse_roundtrip() {
        for status in [
            DeviceStatus::Active,
            DeviceStatus::Inactive,
            DeviceStatus::Revoked,
        ] {
            assert_eq!(DeviceStatus::parse(status.as_str()), Some(status));
        }
    }

    #[test]
    fn test_status_parse_unknown() {
        assert_eq!(DeviceStatus::parse("maintenance"), None);
        assert_eq!(DeviceStatus::parse(""), None);
    }

    #[test]
    fn test_can_report() {
        assert!(test_device(DeviceStatus::Active).can_report());
        assert!(!test_device(DeviceStatus::Inactive).can_report());
        assert!(!test_device(DeviceStatus::Revoked).can_report());
    }

    #[test]
    fn test_status_serialization() {
        let json = serde_json::to_string(&DeviceStatus::Revoked).unwrap();
        assert_eq!(json, "\"revoked\"");
    }
}

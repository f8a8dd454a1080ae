//! Device entity (database row mapping).

use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use domain::models::{Device, DeviceStatus};

/// Database row mapping for the devices table.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceEntity {
    pub id: i64,
    pub uuid: Uuid,
    pub platform: String,
    pub app_version: Option<String>,
    pub device_model: Option<String>,
    pub os_version: Option<String>,
    pub status: String,
    pub last_seen_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<DeviceEntity> for Device {
    fn from(entity: DeviceEntity) -> Self {
        // A status value outside the known lifecycle set must not grant
        // reporting rights.
        let status = DeviceStatus::parse(&entity.status).unwrap_or(DeviceStatus::Inactive);
        Self {
            id: entity.id,
            uuid: entity.uuid,
            platform: entity.platform,
            app_version: entity.app_version,
            device_model: entity.device_model,
            os_version: entity.os_version,
            status,
            last_seen_at: entity.last_seen_at,
            created_at: entity.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_entity(status: &str) -> DeviceEntity {
        DeviceEntity {
            id: 1,
            uuid: Uuid::new_v4(),
            platform: "android".to_string(),
            app_version: None,
            device_model: None,
            os_version: None,
            status: status.to_string(),
            last_seen_at: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_entity_to_domain() {
        let device: Device = test_entity("active").into();
        assert_eq!(device.status, DeviceStatus::Active);
        assert!(device.can_report());
    }

    #[test]
    fn test_unknown_status_maps_to_inactive() {
        let device: Device = test_entity("decommissioned").into();
        assert_eq!(device.status, DeviceStatus::Inactive);
        assert!(!device.can_report());
    }
}

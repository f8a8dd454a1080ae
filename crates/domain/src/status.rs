//! Movement and signal-freshness classification.
//!
//! Pure policy: given the server-side `updated_at` of a device's last
//! position and its reported speed, derive the movement status shown on the
//! live map and a staleness tier ("signal strength"). Callers rendering
//! multiple rows must reuse one `now` snapshot so that rows on a threshold
//! boundary do not flap within a single response.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Age beyond which a device is considered offline.
pub const OFFLINE_AFTER_SECS: i64 = 300;

/// Age beyond which the signal tier degrades to weak.
pub const WEAK_AFTER_SECS: i64 = 180;

/// Age beyond which the signal tier degrades to medium.
pub const MEDIUM_AFTER_SECS: i64 = 150;

/// Reported speeds below this count as stopped (unit as submitted, km/h).
pub const MOVING_SPEED_FLOOR: f64 = 1.0;

/// Expected interval between device reports, in seconds.
pub const REPORT_INTERVAL_SECS: i64 = 120;

/// Derived movement state of a bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementStatus {
    Moving,
    Stopped,
    Offline,
}

impl MovementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementStatus::Moving => "moving",
            MovementStatus::Stopped => "stopped",
            MovementStatus::Offline => "offline",
        }
    }
}

/// Staleness tier of a device's last report. Not radio signal quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStrength {
    Strong,
    Medium,
    Weak,
    None,
}

/// Output of [`classify`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DerivedStatus {
    pub status: MovementStatus,
    pub signal_strength: SignalStrength,
}

/// Classify a last position into movement status and signal tier.
///
/// `updated_at` is the server stamp of the most recent accepted fix, absent
/// when the device has never reported. Idempotent: identical inputs always
/// yield identical output.
pub fn classify(
    updated_at: Option<DateTime<Utc>>,
    speed: Option<f64>,
    now: DateTime<Utc>,
) -> DerivedStatus {
    let updated_at = match updated_at {
        Some(ts) => ts,
        None => {
            return DerivedStatus {
                status: MovementStatus::Offline,
                signal_strength: SignalStrength::None,
            }
        }
    };

    let age = now - updated_at;

    if age > Duration::seconds(OFFLINE_AFTER_SECS) {
        return DerivedStatus {
            status: MovementStatus::Offline,
            signal_strength: SignalStrength::None,
        };
    }

    let status = match speed {
        Some(s) if s >= MOVING_SPEED_FLOOR => MovementStatus::Moving,
        _ => MovementStatus::Stopped,
    };

    let signal_strength = if age > Duration::seconds(WEAK_AFTER_SECS) {
        SignalStrength::Weak
    } else if age > Duration::seconds(MEDIUM_AFTER_SECS) {
        SignalStrength::Medium
    } else {
        SignalStrength::Strong
    };

    DerivedStatus {
        status,
        signal_strength,
    }
}

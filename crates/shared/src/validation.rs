//! Common validation utilities for reported location fixes.

use chrono::{TimeZone, Utc};
use validator::ValidationError;

/// Maximum age of a client timestamp in days.
const MAX_TIMESTAMP_AGE_DAYS: i64 = 7;

/// Maximum allowed future timestamp tolerance in seconds (clock skew).
const MAX_FUTURE_TOLERANCE_SECS: i64 = 300;

/// Validates that a latitude value is within valid range (-90 to 90).
pub fn validate_latitude(lat: f64) -> Result<(), ValidationError> {
    if (-90.0..=90.0).contains(&lat) {
        Ok(())
    } else {
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        Err(err)
    }
}

/// Validates that a longitude value is within valid range (-180 to 180).
pub fn validate_longitude(lon: f64) -> Result<(), ValidationError> {
    if (-180.0..=180.0).contains(&lon) {
        Ok(())
    } else {
        let mut err = ValidationError::new("longitude_range");
        err.message = Some("Longitude must be between -180 and 180".into());
        Err(err)
    }
}

/// Validates that accuracy is non-negative.
pub fn validate_accuracy(accuracy: f64) -> Result<(), ValidationError> {
    if accuracy >= 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("accuracy_range");
        err.message = Some("Accuracy must be non-negative".into());
        Err(err)
    }
}

/// Validates that heading is within valid range (0 to 360).
pub fn validate_heading(heading: f64) -> Result<(), ValidationError> {
    if (0.0..=360.0).contains(&heading) {
        Ok(())
    } else {
        let mut err = ValidationError::new("heading_range");
        err.message = Some("Heading must be between 0 and 360".into());
        Err(err)
    }
}

/// Validates that speed is non-negative.
pub fn validate_speed(speed: f64) -> Result<(), ValidationError> {
    if speed >= 0.0 {
        Ok(())
    } else {
        let mut err = ValidationError::new("speed_range");
        err.message = Some("Speed must be non-negative".into());
        Err(err)
    }
}

/// Validates that battery level is within valid range (0 to 100).
pub fn validate_battery_level(level: i32) -> Result<(), ValidationError> {
    if (0..=100).contains(&level) {
        Ok(())
    } else {
        let mut err = ValidationError::new("battery_range");
        err.message = Some("Battery level must be between 0 and 100".into());
        Err(err)
    }
}

/// Validates that a timestamp (in milliseconds since epoch) is within acceptable range.
/// - Must not be more than 5 minutes in the future (allows for clock skew)
/// - Must not be older than 7 days
pub fn validate_timestamp(timestamp_millis: i64) -> Result<(), ValidationError> {
    let now = Utc::now();

    let timestamp = match Utc.timestamp_millis_opt(timestamp_millis).single() {
        Some(ts) => ts,
        None => {
            let mut err = ValidationError::new("timestamp_invalid");
            err.message = Some("Invalid timestamp format".into());
            return Err(err);
        }
    };

    let future_limit = now + chrono::Duration::seconds(MAX_FUTURE_TOLERANCE_SECS);
    if timestamp > future_limit {
        let mut err = ValidationError::new("timestamp_future");
        err.message = Some("Timestamp cannot be in the future".into());
        return Err(err);
    }

    let past_limit = now - chrono::Duration::days(MAX_TIMESTAMP_AGE_DAYS);
    if timestamp < past_limit {
        let mut err = ValidationError::new("timestamp_old");
        err.message = Some("Timestamp cannot be older than 7 days".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a client-supplied nonce string (opaque token, bounded length).
pub fn validate_nonce(nonce: &str) -> Result<(), ValidationError> {
    if nonce.is_empty() || nonce.len() > 128 {
        let mut err = ValidationError::new("nonce_length");
        err.message = Some("Nonce must be 1-128 characters".into());
        return Err(err);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_latitude() {
        assert!(validate_latitude(0.0).is_ok());
        assert!(validate_latitude(90.0).is_ok());
        assert!(validate_latitude(-90.0).is_ok());
        assert!(validate_latitude(45.46).is_ok());
        assert!(validate_latitude(90.1).is_err());
        assert!(validate_latitude(-90.1).is_err());
    }

    #[test]
    fn test_validate_longitude() {
        assert!(validate_longitude(0.0).is_ok());
        assert!(validate_longitude(180.0).is_ok());
        assert!(validate_longitude(-180.0).is_ok());
        assert!(validate_longitude(9.19).is_ok());
        assert!(validate_longitude(180.1).is_err());
        assert!(validate_longitude(-180.1).is_err());
    }

    #[test]
    fn test_validate_accuracy() {
        assert!(validate_accuracy(0.0).is_ok());
        assert!(validate_accuracy(5.0).is_ok());
        assert!(validate_accuracy(1000.0).is_ok());
        assert!(validate_accuracy(-0.1).is_err());
    }

    #[test]
    fn test_validate_heading() {
        assert!(validate_heading(0.0).is_ok());
        assert!(validate_heading(180.0).is_ok());
        assert!(validate_heading(360.0).is_ok());
        assert!(validate_heading(360.1).is_err());
        assert!(validate_heading(-1.0).is_err());
    }

    #[test]
    fn test_validate_speed() {
        assert!(validate_speed(0.0).is_ok());
        assert!(validate_speed(42.5).is_ok());
        assert!(validate_speed(-1.0).is_err());
    }

    #[test]
    fn test_validate_battery_level() {
        assert!(validate_battery_level(0).is_ok());
        assert!(validate_battery_level(100).is_ok());
        assert!(validate_battery_level(101).is_err());
        assert!(validate_battery_level(-1).is_err());
    }

    #[test]
    fn test_validate_timestamp_now() {
        assert!(validate_timestamp(Utc::now().timestamp_millis()).is_ok());
    }

    #[test]
    fn test_validate_timestamp_slight_skew_allowed() {
        let ts = Utc::now().timestamp_millis() + 60_000;
        assert!(validate_timestamp(ts).is_ok());
    }

    #[test]
    fn test_validate_timestamp_too_far_future() {
        let ts = Utc::now().timestamp_millis() + 3_600_000;
        assert!(validate_timestamp(ts).is_err());
    }

    #[test]
    fn test_validate_timestamp_too_old() {
        let ts = (Utc::now() - chrono::Duration::days(10)).timestamp_millis();
        assert!(validate_timestamp(ts).is_err());
    }

    #[test]
    fn test_validate_nonce() {
        assert!(validate_nonce("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_nonce("n1").is_ok());
        assert!(validate_nonce("").is_err());
        assert!(validate_nonce(&"x".repeat(129)).is_err());
    }
}

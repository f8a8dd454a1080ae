//! The fleet snapshot builder: the pull-based live view.
//!
//! Joins active buses with their device's last position in one query and
//! derives movement status in code, against a single `now` snapshot per
//! request. Independent of the push path: a snapshot never consumes feed
//! messages.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use domain::models::{BusStats, FleetLiveResponse, LiveBusQuery, LiveBusView};
use domain::status::{classify, MovementStatus};
use persistence::entities::LiveBusRowEntity;
use persistence::repositories::FleetRepository;

/// Builds live fleet views on demand.
pub struct FleetSnapshotBuilder {
    repo: FleetRepository,
}

impl FleetSnapshotBuilder {
    pub fn new(pool: PgPool) -> Self {
        Self {
            repo: FleetRepository::new(pool),
        }
    }

    /// The live fleet view. The line filter is pushed into the join; the
    /// status filter applies after derivation, since status is never
    /// stored. Rows come back ordered by bus label.
    pub async fn live_buses(&self, query: &LiveBusQuery) -> Result<FleetLiveResponse, sqlx::Error> {
        let rows = self.repo.live_rows(query.line_id).await?;
        let now = Utc::now();

        let buses = rows
            .into_iter()
            .map(|row| view_from_row(row, now))
            .filter(|bus| query.status.map_or(true, |filter| filter.matches(bus.status)))
            .collect();

        Ok(FleetLiveResponse {
            timestamp: now,
            buses,
        })
    }

    /// Aggregate movement counts over the whole active fleet.
    pub async fn stats(&self) -> Result<BusStats, sqlx::Error> {
        let rows = self.repo.live_rows(None).await?;
        Ok(fold_stats(&rows, Utc::now()))
    }
}

/// Derive one view row. Buses whose device never reported keep null geo
/// fields and classify as offline.
fn view_from_row(row: LiveBusRowEntity, now: DateTime<Utc>) -> LiveBusView {
    let derived = classify(row.updated_at, row.speed, now);
    LiveBusView {
        bus_id: row.bus_id,
        label: row.label,
        plate: row.plate,
        line_id: row.line_id,
        line_name: row.line_name,
        line_code: row.line_code,
        line_color: row.line_color,
        latitude: row.latitude,
        longitude: row.longitude,
        speed: row.speed,
        heading: row.heading,
        battery_level: row.battery_level,
        last_update: row.updated_at,
        status: derived.status,
        signal_strength: derived.signal_strength,
    }
}

/// Fold movement counts from the joined rows with one shared `now`.
fn fold_stats(rows: &[LiveBusRowEntity], now: DateTime<Utc>) -> BusStats {
    let mut stats = BusStats {
        total: rows.len(),
        active: 0,
        moving: 0,
        stopped: 0,
        offline: 0,
    };

    for row in rows {
        match classify(row.updated_at, row.speed, now).status {
            MovementStatus::Moving => {
                stats.moving += 1;
                stats.active += 1;
            }
            MovementStatus::Stopped => {
                stats.stopped += 1;
                stats.active += 1;
            }
            MovementStatus::Offline => stats.offline += 1,
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn row(
        bus_id: i64,
        updated_secs_ago: Option<i64>,
        speed: Option<f64>,
        now: DateTime<Utc>,
    ) -> LiveBusRowEntity {
        LiveBusRowEntity {
            bus_id,
            label: format!("B-{:02}", bus_id),
            plate: None,
            line_id: Some(1),
            line_name: Some("Centro - Stazione".to_string()),
            line_code: Some("L1".to_string()),
            line_color: None,
            latitude: updated_secs_ago.map(|_| 45.46),
            longitude: updated_secs_ago.map(|_| 9.19),
            speed,
            heading: None,
            battery_level: None,
            gps_timestamp: updated_secs_ago.map(|s| now - Duration::seconds(s)),
            updated_at: updated_secs_ago.map(|s| now - Duration::seconds(s)),
        }
    }

    #[test]
    fn test_view_from_row_fresh_moving() {
        let now = Utc::now();
        let view = view_from_row(row(1, Some(10), Some(25.0), now), now);
        assert_eq!(view.status, MovementStatus::Moving);
        assert_eq!(view.latitude, Some(45.46));
        assert!(view.last_update.is_some());
    }

    #[test]
    fn test_view_from_row_never_reported() {
        let now = Utc::now();
        let view = view_from_row(row(2, None, None, now), now);
        assert_eq!(view.status, MovementStatus::Offline);
        assert!(view.latitude.is_none());
        assert!(view.longitude.is_none());
        assert!(view.last_update.is_none());
    }

    #[test]
    fn test_view_from_row_stale_is_offline() {
        let now = Utc::now();
        let view = view_from_row(row(3, Some(301), Some(30.0), now), now);
        assert_eq!(view.status, MovementStatus::Offline);
        // Geo fields stay visible even when stale.
        assert_eq!(view.latitude, Some(45.46));
    }

    #[test]
    fn test_fold_stats_counts() {
        let now = Utc::now();
        let rows = vec![
            row(1, Some(10), Some(25.0), now), // moving
            row(2, Some(10), Some(0.2), now),  // stopped
            row(3, Some(10), None, now),       // stopped
            row(4, Some(400), Some(25.0), now), // offline (stale)
            row(5, None, None, now),           // offline (never reported)
        ];

        let stats = fold_stats(&rows, now);
        assert_eq!(
            stats,
            BusStats {
                total: 5,
                active: 3,
                moving: 1,
                stopped: 2,
                offline: 2,
            }
        );
    }

    #[test]
    fn test_fold_stats_empty_fleet() {
        let stats = fold_stats(&[], Utc::now());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.active, 0);
    }
}

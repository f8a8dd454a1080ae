//! The ingestion pipeline: validate, deduplicate, persist, fan out.
//!
//! Step order for one fix:
//! 1. structural validation (no side effects on failure)
//! 2. nonce guard (no side effects on replay)
//! 3. resolve the device's bus assignment
//! 4. append to the archive (best-effort)
//! 5. upsert the last-position store (the only fatal step)
//! 6. touch the device's last-seen marker (spawned, best-effort)
//! 7. publish to the live feed (best-effort)
//!
//! A submission is accepted once step 5 commits, whatever the best-effort
//! steps did.

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use sqlx::PgPool;
use tracing::warn;
use validator::Validate;

use domain::models::telemetry::FixData;
use domain::models::BroadcastMessage;
use persistence::repositories::{
    DeviceRepository, FleetRepository, LocationRepository, NonceRepository, PositionUpdate,
};
use persistence::store::LastPositionStore;

use crate::error::{validation_message, ApiError};
use crate::middleware::metrics::{
    record_duplicate_nonce, record_fix_ingested, record_fix_rejected,
};
use crate::services::feed::LiveFeed;
use crate::services::tasks::spawn_best_effort;

/// Per-fix result of a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The fix is now the device's last position. The archive id is absent
    /// when the best-effort archive append failed.
    Accepted { archive_id: Option<i64> },
    /// The nonce was already consumed within its TTL window.
    Duplicate,
    /// Structural validation failed; nothing was written.
    Invalid(String),
}

/// Tally of a batch submission. Individual failures never abort the batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchTally {
    pub accepted: usize,
    pub duplicates: usize,
    pub rejected: usize,
    pub ids: Vec<i64>,
}

/// One ingestion pass over the shared stores and the live feed.
pub struct IngestionPipeline {
    devices: DeviceRepository,
    locations: LocationRepository,
    fleet: FleetRepository,
    nonces: NonceRepository,
    store: Arc<dyn LastPositionStore>,
    feed: LiveFeed,
    nonce_ttl_secs: u64,
}

impl IngestionPipeline {
    pub fn new(
        pool: PgPool,
        store: Arc<dyn LastPositionStore>,
        feed: LiveFeed,
        nonce_ttl_secs: u64,
    ) -> Self {
        Self {
            devices: DeviceRepository::new(pool.clone()),
            locations: LocationRepository::new(pool.clone()),
            fleet: FleetRepository::new(pool.clone()),
            nonces: NonceRepository::new(pool),
            store,
            feed,
            nonce_ttl_secs,
        }
    }

    /// Submit one fix for an already-resolved, active device.
    pub async fn submit(
        &self,
        device_id: i64,
        fix: FixData,
    ) -> Result<SubmitOutcome, ApiError> {
        if let Err(errors) = fix.validate() {
            record_fix_rejected();
            return Ok(SubmitOutcome::Invalid(validation_message(&errors)));
        }

        let captured_at = match Utc.timestamp_millis_opt(fix.timestamp).single() {
            Some(ts) => ts,
            None => {
                record_fix_rejected();
                return Ok(SubmitOutcome::Invalid("Invalid timestamp".to_string()));
            }
        };

        if let Some(nonce) = fix.nonce.as_deref() {
            let fingerprint = shared::crypto::sha256_hex(nonce);
            let fresh = self
                .nonces
                .try_consume(&fingerprint, device_id, self.nonce_ttl_secs)
                .await
                .map_err(|e| ApiError::StoreUnavailable(format!("nonce guard: {}", e)))?;
            if !fresh {
                record_duplicate_nonce();
                return Ok(SubmitOutcome::Duplicate);
            }
        }

        // Topology is an independent read; an unreachable topology store
        // degrades to "no bus assigned" rather than failing the fix.
        let bus_id = match self.fleet.bus_for_device(device_id).await {
            Ok(assignment) => assignment.map(|a| a.bus_id),
            Err(e) => {
                warn!(device_id, error = %e, "Bus assignment lookup failed");
                None
            }
        };

        let update = PositionUpdate {
            device_id,
            bus_id,
            latitude: fix.latitude,
            longitude: fix.longitude,
            accuracy: fix.accuracy,
            altitude: fix.altitude,
            speed: fix.speed,
            heading: fix.heading,
            provider: fix.provider,
            battery_level: fix.battery_level,
            network_type: fix.network_type,
            timestamp: captured_at,
        };

        let archive_id = match self.locations.append(&update).await {
            Ok(id) => Some(id),
            Err(e) => {
                warn!(device_id, error = %e, "Archive append failed");
                None
            }
        };

        let position = self
            .store
            .upsert(&update)
            .await
            .map_err(|e| ApiError::StoreUnavailable(format!("last-position store: {}", e)))?;

        let devices = self.devices.clone();
        spawn_best_effort("device last-seen touch", async move {
            devices.touch_last_seen(device_id).await.map(|_| ())
        });

        self.feed.publish(BroadcastMessage::from_position(&position));

        record_fix_ingested();
        Ok(SubmitOutcome::Accepted { archive_id })
    }

    /// Submit a batch of fixes for one device, per-fix independently.
    ///
    /// Every element is attempted; a fatal store error for one fix counts
    /// it as rejected and the batch continues.
    pub async fn submit_batch(&self, device_id: i64, fixes: Vec<FixData>) -> BatchTally {
        let mut tally = BatchTally::default();

        for fix in fixes {
            match self.submit(device_id, fix).await {
                Ok(SubmitOutcome::Accepted { archive_id }) => {
                    tally.accepted += 1;
                    if let Some(id) = archive_id {
                        tally.ids.push(id);
                    }
                }
                Ok(SubmitOutcome::Duplicate) => tally.duplicates += 1,
                Ok(SubmitOutcome::Invalid(reason)) => {
                    warn!(device_id, reason = %reason, "Batch element rejected");
                    tally.rejected += 1;
                }
                Err(e) => {
                    warn!(device_id, error = %e, "Batch element failed");
                    tally.rejected += 1;
                }
            }
        }

        tally
    }
}

//! Telemetry endpoint handlers: fix submission and history.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Duration, TimeZone, Utc};
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use domain::models::telemetry::{
    BatchSubmitRequest, BatchSubmitResponse, GetHistoryQuery, HistoryResponse, PaginationInfo,
    SortOrder, SubmitFixRequest, SubmitFixResponse,
};
use domain::models::Device;
use domain::status::REPORT_INTERVAL_SECS;
use persistence::repositories::{
    DeviceRepository, FleetRepository, LocationHistoryQuery, LocationRepository,
};

use crate::app::AppState;
use crate::error::{validation_message, ApiError};
use crate::middleware::rate_limit::rate_limited_response;
use crate::services::ingest::{IngestionPipeline, SubmitOutcome};

/// Submit a single location fix.
///
/// POST /api/v1/telemetry/location
pub async fn submit_location(
    State(state): State<AppState>,
    Json(request): Json<SubmitFixRequest>,
) -> Result<Response, ApiError> {
    // Structural validation comes first: a malformed fix is rejected
    // before any lookup or side effect.
    request
        .validate()
        .map_err(|e| ApiError::InvalidFix(validation_message(&e)))?;

    let device_uuid = request.device_id;
    let device = find_reporting_device(&state, device_uuid).await?;

    if let Some(ref limiter) = state.rate_limiter {
        if let Err(retry_after) = limiter.check(device.id) {
            return Ok(rate_limited_response(limiter.limit_per_minute(), retry_after));
        }
    }

    let pipeline = ingestion_pipeline(&state);
    match pipeline.submit(device.id, request.into()).await? {
        SubmitOutcome::Accepted { archive_id } => {
            let received_at = Utc::now();

            info!(
                device_id = %device_uuid,
                archive_id = ?archive_id,
                "Location fix accepted"
            );

            let response = SubmitFixResponse {
                id: archive_id,
                status: "accepted".to_string(),
                received_at,
                next_expected_at: received_at + Duration::seconds(REPORT_INTERVAL_SECS),
            };
            Ok((StatusCode::ACCEPTED, Json(response)).into_response())
        }
        SubmitOutcome::Duplicate => Err(ApiError::DuplicateNonce),
        SubmitOutcome::Invalid(reason) => Err(ApiError::InvalidFix(reason)),
    }
}

/// Submit multiple fixes in a batch.
///
/// POST /api/v1/telemetry/location/batch
///
/// Elements are processed independently; a bad element never aborts the
/// rest of the batch.
pub async fn submit_batch(
    State(state): State<AppState>,
    Json(request): Json<BatchSubmitRequest>,
) -> Result<Response, ApiError> {
    // Envelope validation only (batch size); per-fix validation happens
    // inside the pipeline so one bad element is tallied, not fatal.
    request
        .validate()
        .map_err(|e| ApiError::Validation(validation_message(&e)))?;

    let device_uuid = request.device_id;
    let device = find_reporting_device(&state, device_uuid).await?;

    if let Some(ref limiter) = state.rate_limiter {
        if let Err(retry_after) = limiter.check(device.id) {
            return Ok(rate_limited_response(limiter.limit_per_minute(), retry_after));
        }
    }

    let pipeline = ingestion_pipeline(&state);
    let tally = pipeline.submit_batch(device.id, request.fixes).await;
    let received_at = Utc::now();

    info!(
        device_id = %device_uuid,
        accepted = tally.accepted,
        duplicates = tally.duplicates,
        rejected = tally.rejected,
        "Batch processed"
    );

    let response = BatchSubmitResponse {
        accepted: tally.accepted,
        duplicates: tally.duplicates,
        rejected: tally.rejected,
        ids: tally.ids,
        received_at,
        next_expected_at: received_at + Duration::seconds(REPORT_INTERVAL_SECS),
    };
    Ok((StatusCode::ACCEPTED, Json(response)).into_response())
}

/// Get archived fixes for a bus with cursor-based pagination.
///
/// GET /api/v1/telemetry/history
pub async fn get_history(
    State(state): State<AppState>,
    Query(query): Query<GetHistoryQuery>,
) -> Result<Json<HistoryResponse>, ApiError> {
    let fleet_repo = FleetRepository::new(state.pool.clone());
    let device_id = fleet_repo
        .device_for_bus(query.bus_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Bus not found or has no device assigned".to_string()))?;

    let (cursor_timestamp, cursor_id) = match &query.cursor {
        Some(cursor) => {
            let (ts, id) = shared::pagination::decode_cursor(cursor)
                .map_err(|_| ApiError::Validation("Invalid cursor format".to_string()))?;
            (Some(ts), Some(id))
        }
        None => (None, None),
    };

    let from_timestamp = match query.from {
        Some(ts) => Some(
            Utc.timestamp_millis_opt(ts)
                .single()
                .ok_or_else(|| ApiError::Validation(format!("Invalid 'from' timestamp: {}", ts)))?,
        ),
        None => None,
    };
    let to_timestamp = match query.to {
        Some(ts) => Some(
            Utc.timestamp_millis_opt(ts)
                .single()
                .ok_or_else(|| ApiError::Validation(format!("Invalid 'to' timestamp: {}", ts)))?,
        ),
        None => None,
    };

    let limit = query.effective_limit();

    let location_repo = LocationRepository::new(state.pool.clone());
    let (entities, has_more) = location_repo
        .history(LocationHistoryQuery {
            device_id,
            cursor_timestamp,
            cursor_id,
            from_timestamp,
            to_timestamp,
            limit,
            ascending: query.order == SortOrder::Asc,
        })
        .await?;

    let next_cursor = if has_more {
        entities
            .last()
            .map(|loc| shared::pagination::encode_cursor(loc.timestamp, loc.id))
    } else {
        None
    };

    let locations = entities.into_iter().map(Into::into).collect();

    Ok(Json(HistoryResponse {
        bus_id: query.bus_id,
        locations,
        pagination: PaginationInfo {
            next_cursor,
            has_more,
        },
    }))
}

/// Resolve a device allowed to report, by external UUID.
///
/// Unknown, inactive, and revoked devices all read as "not registered";
/// the distinction stays server-side.
async fn find_reporting_device(state: &AppState, uuid: Uuid) -> Result<Device, ApiError> {
    let repo = DeviceRepository::new(state.pool.clone());
    let device: Device = repo
        .find_by_uuid(uuid)
        .await?
        .ok_or_else(|| ApiError::NotFound("Device not registered".to_string()))?
        .into();

    if !device.can_report() {
        return Err(ApiError::NotFound("Device not registered".to_string()));
    }

    Ok(device)
}

fn ingestion_pipeline(state: &AppState) -> IngestionPipeline {
    IngestionPipeline::new(
        state.pool.clone(),
        state.store.clone(),
        state.feed.clone(),
        state.config.telemetry.nonce_ttl_secs,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_submit_response_shape() {
        let received_at = Utc::now();
        let response = SubmitFixResponse {
            id: Some(42),
            status: "accepted".to_string(),
            received_at,
            next_expected_at: received_at + Duration::seconds(REPORT_INTERVAL_SECS),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"id\":42"));
        assert!(json.contains("\"status\":\"accepted\""));
        assert!(json.contains("\"next_expected_at\""));
        assert_eq!(
            (response.next_expected_at - response.received_at).num_seconds(),
            120
        );
    }

    #[test]
    fn test_batch_response_shape() {
        let received_at = Utc::now();
        let response = BatchSubmitResponse {
            accepted: 2,
            duplicates: 1,
            rejected: 1,
            ids: vec![10, 11],
            received_at,
            next_expected_at: received_at + Duration::seconds(REPORT_INTERVAL_SECS),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"accepted\":2"));
        assert!(json.contains("\"duplicates\":1"));
        assert!(json.contains("\"rejected\":1"));
        assert!(json.contains("\"ids\":[10,11]"));
    }
}

//! Fleet monitoring endpoint handlers.

use axum::{
    extract::{Query, State},
    Json,
};

use domain::models::{BusStats, FleetLiveResponse, LiveBusQuery};

use crate::app::AppState;
use crate::error::ApiError;
use crate::services::fleet::FleetSnapshotBuilder;

/// Live positions and derived status of the active fleet.
///
/// GET /api/v1/fleet/live
pub async fn live_fleet(
    State(state): State<AppState>,
    Query(query): Query<LiveBusQuery>,
) -> Result<Json<FleetLiveResponse>, ApiError> {
    let builder = FleetSnapshotBuilder::new(state.pool.clone());
    let response = builder.live_buses(&query).await?;
    Ok(Json(response))
}

/// Aggregate movement counts over the active fleet.
///
/// GET /api/v1/fleet/stats
pub async fn fleet_stats(State(state): State<AppState>) -> Result<Json<BusStats>, ApiError> {
    let builder = FleetSnapshotBuilder::new(state.pool.clone());
    let stats = builder.stats().await?;
    Ok(Json(stats))
}

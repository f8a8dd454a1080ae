use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use persistence::store::TieredLastPositionStore;

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{fleet, health, stream, telemetry};
use crate::services::feed::LiveFeed;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub store: Arc<TieredLastPositionStore>,
    pub feed: LiveFeed,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
}

pub fn create_app(
    config: Config,
    pool: PgPool,
    store: Arc<TieredLastPositionStore>,
    feed: LiveFeed,
) -> Router {
    let config = Arc::new(config);

    // Submission rate limiting is per device; 0 disables it.
    let rate_limiter = if config.telemetry.submission_rate_per_minute > 0 {
        Some(Arc::new(RateLimiterState::new(
            config.telemetry.submission_rate_per_minute,
        )))
    } else {
        None
    };

    let state = AppState {
        pool,
        config: config.clone(),
        store,
        feed,
        rate_limiter,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        // Production: only allow specified origins
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Versioned API routes. Device/token authentication is terminated
    // upstream; handlers resolve devices from the request payload.
    let api_routes = Router::new()
        .route("/api/v1/telemetry/location", post(telemetry::submit_location))
        .route(
            "/api/v1/telemetry/location/batch",
            post(telemetry::submit_batch),
        )
        .route("/api/v1/telemetry/history", get(telemetry::get_history))
        .route("/api/v1/fleet/live", get(fleet::live_fleet))
        .route("/api/v1/fleet/stats", get(fleet::fleet_stats));

    // The live update stream
    let stream_routes = Router::new().route("/ws/fleet", get(stream::fleet_stream));

    // Public operational routes (no authentication anywhere upstream either)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(api_routes)
        .merge(stream_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}

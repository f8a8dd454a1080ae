use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing::info;

use bus_tracker_api::{app, config::Config, jobs, middleware, services::feed::LiveFeed};
use persistence::store::{PgLastPositionStore, TieredLastPositionStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = Config::load()?;

    // Initialize logging and metrics
    middleware::logging::init_logging(&config.logging);
    middleware::metrics::init_metrics();

    info!("Starting Bus Tracker API v{}", env!("CARGO_PKG_VERSION"));

    // Create database pool
    let pool = persistence::db::create_pool(&config.database_config()).await?;

    // Run migrations
    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    // The live feed and the two-tier position store live for the whole
    // process and are handed to the app by reference, not as globals.
    let feed = LiveFeed::new(config.telemetry.feed_capacity);
    let durable = Arc::new(PgLastPositionStore::new(pool.clone()));
    let store = Arc::new(TieredLastPositionStore::new(
        durable,
        Duration::from_secs(config.telemetry.position_cache_ttl_secs),
    ));

    // Background jobs
    let mut scheduler = jobs::JobScheduler::new();
    scheduler.register(jobs::CleanupNoncesJob::new(pool.clone()));
    scheduler.register(jobs::SweepPositionCacheJob::new(store.clone()));
    scheduler.register(jobs::PoolMetricsJob::new(pool.clone()));
    scheduler.start();

    // Build application
    let app = app::create_app(config.clone(), pool, store, feed);

    // Start server
    let addr = config.socket_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}

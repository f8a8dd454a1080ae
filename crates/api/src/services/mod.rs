//! Application services: the ingestion pipeline, the live broadcast feed,
//! and the fleet snapshot builder.

pub mod feed;
pub mod fleet;
pub mod ingest;
pub mod tasks;

pub use feed::{FeedSubscription, LiveFeed};
pub use fleet::FleetSnapshotBuilder;
pub use ingest::{IngestionPipeline, SubmitOutcome};

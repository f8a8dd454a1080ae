//! HTTP route handlers.

pub mod fleet;
pub mod health;
pub mod stream;
pub mod telemetry;

//! Domain layer for the Bus Tracker backend.
//!
//! This crate contains:
//! - Domain models (Device, LocationFix, LastPosition, fleet views)
//! - The pure movement/signal status derivation logic

pub mod models;
pub mod status;

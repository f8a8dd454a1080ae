//! Domain models for the Bus Tracker backend.

pub mod device;
pub mod fleet;
pub mod telemetry;

pub use device::{Device, DeviceStatus};
pub use fleet::{BusStats, FleetLiveResponse, LiveBusQuery, LiveBusView, StatusFilter};
pub use telemetry::{BroadcastMessage, FixData, LastPosition};

//! Repository implementations for database operations.

pub mod device;
pub mod fleet;
pub mod last_position;
pub mod location;
pub mod nonce;

pub use device::DeviceRepository;
pub use fleet::FleetRepository;
pub use last_position::{LastPositionRepository, PositionUpdate};
pub use location::{LocationHistoryQuery, LocationRepository};
pub use nonce::NonceRepository;

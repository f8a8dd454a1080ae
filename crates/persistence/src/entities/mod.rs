//! Entity definitions (database row mappings).

pub mod device;
pub mod last_position;
pub mod live_bus;
pub mod location;

pub use device::DeviceEntity;
pub use last_position::LastPositionEntity;
pub use live_bus::{BusAssignment, LiveBusRowEntity};
pub use location::LocationEntity;

// blueair-core: per-device state layer between blueair-api and consumers.
//
// One DeviceCoordinator per physical purifier: it owns the device's
// current snapshot, polls the cloud on an interval, and exposes typed
// accessors and command mutators with optimistic local updates.

pub mod coordinator;
pub mod error;
pub mod model;

pub use coordinator::{CoordinatorConfig, DeviceCoordinator, PollStatus};
pub use error::CoreError;
pub use model::{AttributeValue, DeviceSnapshot, model_name};

//! Link-layer trace observers.
//!
//! [`DeviceObserver`] folds one device's trace events into its running
//! statistics; [`TopologyObserver`] owns one of them per device and
//! answers the per-device and per-range queries.

mod device;
mod topology;

pub use self::{
    device::DeviceObserver,
    topology::{LinkEvent, RangeError, TopologyObserver},
};

//! Environmental sensors.
//!
//! Currently a single backend: the SHT31 temperature / humidity driver,
//! generic over any [`SensorBus`](crate::app::ports::SensorBus) and
//! [`Clock`](crate::app::ports::Clock).  Board wiring picks the bus
//! adapter; the driver itself has no target-specific code.

pub mod sht31;

pub use sht31::{AcquisitionState, SensorReading, Sht31};

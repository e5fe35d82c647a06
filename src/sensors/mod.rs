//! Sensor subsystem.
//!
//! Converting raw ADC samples to physical units belongs to the sensor
//! provider behind [`SensorPort`](crate::app::ports::SensorPort).  This
//! module ships two providers: [`UnwiredSensors`], the device default,
//! which reports every channel as faulted, and [`SimulatedSensors`] for
//! host tests and `sim-sensors` bench builds.

pub mod simulated;
pub mod unwired;

pub use simulated::{SimChannel, SimulatedSensors};
pub use unwired::UnwiredSensors;

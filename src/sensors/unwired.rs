//! Sensor provider for boards without a probe front-end.
//!
//! Every read reports a fault, so auto-control leaves both actuators
//! alone and telemetry carries absent channels.  Remote commands still
//! drive the relays.

use log::warn;

use crate::app::ports::SensorPort;

#[derive(Debug, Default)]
pub struct UnwiredSensors {
    warned: bool,
}

impl UnwiredSensors {
    pub fn new() -> Self {
        Self::default()
    }

    fn absent(&mut self) -> Option<f32> {
        if !self.warned {
            self.warned = true;
            warn!("SENSOR: no probes wired, every channel reads as faulted");
        }
        None
    }
}

impl SensorPort for UnwiredSensors {
    fn read_temperature(&mut self) -> Option<f32> {
        self.absent()
    }

    fn read_humidity(&mut self) -> Option<f32> {
        self.absent()
    }

    fn read_soil_moisture(&mut self) -> Option<f32> {
        self.absent()
    }
}

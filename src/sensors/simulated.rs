//! Deterministic simulated sensor channels.
//!
//! Each channel holds a current value and an optional per-read drift,
//! bounded to the channel's physical range.  A channel can be faulted,
//! in which case reads return `None` until it is restored.
//!
//! Values are plain state: no RNG, so host runs replay exactly.

use log::debug;

use crate::app::ports::SensorPort;

/// One simulated channel.
#[derive(Debug, Clone, Copy)]
pub struct SimChannel {
    value: f32,
    step: f32,
    min: f32,
    max: f32,
    faulted: bool,
}

impl SimChannel {
    pub const fn new(value: f32, min: f32, max: f32) -> Self {
        Self {
            value,
            step: 0.0,
            min,
            max,
            faulted: false,
        }
    }

    /// Per-read drift.  The direction flips at the range limits.
    pub fn with_drift(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    pub fn set(&mut self, value: f32) {
        self.value = value.clamp(self.min, self.max);
    }

    pub fn set_faulted(&mut self, faulted: bool) {
        self.faulted = faulted;
    }

    fn read(&mut self) -> Option<f32> {
        if self.faulted {
            return None;
        }
        let v = self.value;
        let next = self.value + self.step;
        if next > self.max || next < self.min {
            self.step = -self.step;
        }
        self.value = (self.value + self.step).clamp(self.min, self.max);
        Some(v)
    }
}

/// Simulated hub with the three greenhouse channels.
#[derive(Debug, Clone)]
pub struct SimulatedSensors {
    pub temperature: SimChannel,
    pub humidity: SimChannel,
    pub soil_moisture: SimChannel,
    reads: u32,
}

impl SimulatedSensors {
    /// Steady readings, no drift.
    pub fn steady(temperature: f32, humidity: f32, soil_moisture: f32) -> Self {
        Self {
            temperature: SimChannel::new(temperature, -40.0, 85.0),
            humidity: SimChannel::new(humidity, 0.0, 100.0),
            soil_moisture: SimChannel::new(soil_moisture, 0.0, 100.0),
            reads: 0,
        }
    }

    /// Slowly drifting greenhouse: warming air, drying soil.
    pub fn drifting() -> Self {
        let mut s = Self::steady(28.0, 60.0, 45.0);
        s.temperature = s.temperature.with_drift(0.3);
        s.humidity = s.humidity.with_drift(-0.2);
        s.soil_moisture = s.soil_moisture.with_drift(-0.4);
        s
    }

    /// Full read cycles so far.
    pub fn reads(&self) -> u32 {
        self.reads
    }
}

impl SensorPort for SimulatedSensors {
    fn read_temperature(&mut self) -> Option<f32> {
        self.reads = self.reads.wrapping_add(1);
        let v = self.temperature.read();
        debug!("SENSE(sim): temperature {:?}", v);
        v
    }

    fn read_humidity(&mut self) -> Option<f32> {
        self.humidity.read()
    }

    fn read_soil_moisture(&mut self) -> Option<f32> {
        self.soil_moisture.read()
    }
}

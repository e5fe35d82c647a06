//! Device state owned by the control core.
//!
//! [`DeviceState`] records the "last value sent / applied" for every
//! channel and actuator.  Change detection compares new readings against
//! it, and the override machine uses it to skip redundant actuator calls.

use core::fmt;

use crate::error::{Channel, SensorFault};

/// Seconds since boot (monotonic).
pub type Timestamp = u64;

// ---------------------------------------------------------------------------
// Actuators
// ---------------------------------------------------------------------------

/// The two actuators driven by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actuator {
    /// Irrigation pump.
    Pump,
    /// Ventilation fan.
    Fan,
}

impl Actuator {
    /// Fixed application order: pump before fan.
    pub const ALL: [Actuator; 2] = [Actuator::Pump, Actuator::Fan];
}

impl fmt::Display for Actuator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pump => write!(f, "pump"),
            Self::Fan => write!(f, "fan"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sensor reading
// ---------------------------------------------------------------------------

/// One poll cycle worth of sensor values.
///
/// `None` marks a read fault on that channel.  It is never a stand-in
/// for zero.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SensorReading {
    /// Air temperature (°C).
    pub temperature: Option<f32>,
    /// Relative humidity (%).
    pub humidity: Option<f32>,
    /// Soil moisture (%).
    pub soil_moisture: Option<f32>,
}

impl SensorReading {
    pub fn new(temperature: f32, humidity: f32, soil_moisture: f32) -> Self {
        Self {
            temperature: Some(temperature),
            humidity: Some(humidity),
            soil_moisture: Some(soil_moisture),
        }
    }

    /// Value for one channel.
    pub fn channel(&self, channel: Channel) -> Option<f32> {
        match channel {
            Channel::Temperature => self.temperature,
            Channel::Humidity => self.humidity,
            Channel::SoilMoisture => self.soil_moisture,
        }
    }

    /// Faults for every channel that came back empty.
    pub fn faults(&self) -> impl Iterator<Item = SensorFault> + '_ {
        CHANNELS
            .iter()
            .filter(|ch| self.channel(**ch).is_none())
            .map(|ch| SensorFault::Unavailable(*ch))
    }
}

/// Channel order used for change detection and logging.
pub const CHANNELS: [Channel; 3] = [Channel::Temperature, Channel::Humidity, Channel::SoilMoisture];

// ---------------------------------------------------------------------------
// Device state
// ---------------------------------------------------------------------------

/// Last values sent upstream and last actuator outputs applied.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DeviceState {
    pub last_temperature: Option<f32>,
    pub last_humidity: Option<f32>,
    pub last_soil: Option<f32>,
    pub pump_on: bool,
    pub fan_on: bool,
}

impl DeviceState {
    /// Boot state: nothing sent yet, both actuators off.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_on(&self, actuator: Actuator) -> bool {
        match actuator {
            Actuator::Pump => self.pump_on,
            Actuator::Fan => self.fan_on,
        }
    }

    pub fn set_on(&mut self, actuator: Actuator, on: bool) {
        match actuator {
            Actuator::Pump => self.pump_on = on,
            Actuator::Fan => self.fan_on = on,
        }
    }

    /// Last value sent upstream for a channel.
    pub fn last_sent(&self, channel: Channel) -> Option<f32> {
        match channel {
            Channel::Temperature => self.last_temperature,
            Channel::Humidity => self.last_humidity,
            Channel::SoilMoisture => self.last_soil,
        }
    }

    /// Record a successfully pushed reading.  Faulted channels keep their
    /// previous value so a single bad read does not re-arm "no prior value".
    pub fn commit_sent(&mut self, reading: &SensorReading) {
        if let Some(t) = reading.temperature {
            self.last_temperature = Some(t);
        }
        if let Some(h) = reading.humidity {
            self.last_humidity = Some(h);
        }
        if let Some(s) = reading.soil_moisture {
            self.last_soil = Some(s);
        }
    }
}

//! Hardware adapter — bridges the relay outputs to the actuator port.
//!
//! Owns both relay drivers and exposes them through [`ActuatorPort`].
//! The state getters report what the pins actually drive, which the
//! status cycle compares against the controller's view.

use embedded_hal::digital::OutputPin;
use log::debug;

use crate::app::ports::ActuatorPort;
use crate::drivers::relay::RelayDriver;

/// Concrete adapter that combines the pump and fan relays.
pub struct HardwareAdapter<P: OutputPin, F: OutputPin> {
    pump: RelayDriver<P>,
    fan: RelayDriver<F>,
}

impl<P: OutputPin, F: OutputPin> HardwareAdapter<P, F> {
    pub fn new(pump: RelayDriver<P>, fan: RelayDriver<F>) -> Self {
        Self { pump, fan }
    }

    pub fn pump(&self) -> &RelayDriver<P> {
        &self.pump
    }

    pub fn fan(&self) -> &RelayDriver<F> {
        &self.fan
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<P: OutputPin, F: OutputPin> ActuatorPort for HardwareAdapter<P, F> {
    fn set_pump(&mut self, on: bool) {
        if self.pump.set(on) {
            debug!("HW: pump relay {}", if on { "closed" } else { "open" });
        }
    }

    fn set_fan(&mut self, on: bool) {
        if self.fan.set(on) {
            debug!("HW: fan relay {}", if on { "closed" } else { "open" });
        }
    }

    fn pump_state(&self) -> bool {
        self.pump.is_on()
    }

    fn fan_state(&self) -> bool {
        self.fan.is_on()
    }
}

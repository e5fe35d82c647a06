//! Relay output driver for the pump and fan.
//!
//! Generic over any `embedded-hal` [`OutputPin`], with configurable
//! polarity: most relay boards switch on a LOW input.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: wraps an `esp_idf_hal::gpio::PinDriver` in output mode.
//! On host/test: wraps [`SimPin`], which records the level in memory.

use core::convert::Infallible;

use embedded_hal::digital::{ErrorType, OutputPin};
use log::warn;

pub struct RelayDriver<P: OutputPin> {
    pin: P,
    active_low: bool,
    on: bool,
    label: &'static str,
}

impl<P: OutputPin> RelayDriver<P> {
    /// Wrap `pin` and drive it to the OFF level.
    pub fn new(pin: P, active_low: bool, label: &'static str) -> Self {
        let mut relay = Self {
            pin,
            active_low,
            on: true,
            label,
        };
        relay.set(false);
        relay
    }

    /// Switch the relay.  A pin error is logged and leaves the recorded
    /// state unchanged, so a later status check reports the drift.
    pub fn set(&mut self, on: bool) -> bool {
        let high = on != self.active_low;
        let res = if high { self.pin.set_high() } else { self.pin.set_low() };
        match res {
            Ok(()) => {
                self.on = on;
                true
            }
            Err(e) => {
                warn!("Relay[{}]: pin write failed: {:?}", self.label, e);
                false
            }
        }
    }

    /// Last level successfully driven.
    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn pin(&self) -> &P {
        &self.pin
    }
}

// ───────────────────────────────────────────────────────────────
// Simulated pin
// ───────────────────────────────────────────────────────────────

/// In-memory output pin for host runs and tests.
#[derive(Debug, Default, Clone)]
pub struct SimPin {
    high: bool,
    writes: u32,
}

impl SimPin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_high(&self) -> bool {
        self.high
    }

    pub fn writes(&self) -> u32 {
        self.writes
    }
}

impl ErrorType for SimPin {
    type Error = Infallible;
}

impl OutputPin for SimPin {
    fn set_low(&mut self) -> Result<(), Infallible> {
        self.high = false;
        self.writes += 1;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Infallible> {
        self.high = true;
        self.writes += 1;
        Ok(())
    }
}

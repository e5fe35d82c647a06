//! Status LED driver and blink patterns.
//!
//! A single indicator LED renders every [`StatusSignal`] as a short
//! on/off sequence.  The status cycle plays a pattern step by step with
//! timer awaits between levels, so blinking never holds up other tasks.
//!
//! | Signal        | Pattern                       |
//! |---------------|-------------------------------|
//! | Startup       | 3 × (500 ms on, 500 ms off)   |
//! | LinkConnected | 2 s solid                     |
//! | Sending       | 2 × (100 ms on, 100 ms off)   |
//! | Error         | 3 × (1 s on, 200 ms off)      |
//! | Heartbeat     | 50 ms flash                   |
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives a `PinDriver` output.
//! On host/test: [`LogStatus`] only logs.

use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};

use crate::app::ports::{StatusPort, StatusSignal};

/// One pattern step: LED level and how long to hold it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub on: bool,
    pub hold_ms: u32,
}

const fn on(hold_ms: u32) -> Step {
    Step { on: true, hold_ms }
}

const fn off(hold_ms: u32) -> Step {
    Step { on: false, hold_ms }
}

const STARTUP: [Step; 6] = [on(500), off(500), on(500), off(500), on(500), off(500)];
const LINK_CONNECTED: [Step; 2] = [on(2000), off(0)];
const SENDING: [Step; 4] = [on(100), off(100), on(100), off(100)];
const ERROR: [Step; 6] = [on(1000), off(200), on(1000), off(200), on(1000), off(200)];
const HEARTBEAT: [Step; 2] = [on(50), off(0)];

/// Blink sequence for a signal.  Every pattern ends with the LED off.
pub fn pattern(signal: StatusSignal) -> &'static [Step] {
    match signal {
        StatusSignal::Startup => &STARTUP,
        StatusSignal::LinkConnected => &LINK_CONNECTED,
        StatusSignal::Sending => &SENDING,
        StatusSignal::Error => &ERROR,
        StatusSignal::Heartbeat => &HEARTBEAT,
    }
}

// ───────────────────────────────────────────────────────────────
// StatusLed
// ───────────────────────────────────────────────────────────────

/// Indicator LED on a GPIO.
pub struct StatusLed<P: OutputPin> {
    pin: P,
    lit: bool,
}

impl<P: OutputPin> StatusLed<P> {
    pub fn new(pin: P) -> Self {
        let mut led = Self { pin, lit: true };
        led.set_led(false);
        led
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }
}

impl<P: OutputPin> StatusPort for StatusLed<P> {
    fn show(&mut self, signal: StatusSignal) {
        if signal != StatusSignal::Heartbeat {
            info!("LED: {:?}", signal);
        }
    }

    fn set_led(&mut self, on: bool) {
        if on == self.lit {
            return;
        }
        let res = if on { self.pin.set_high() } else { self.pin.set_low() };
        match res {
            Ok(()) => self.lit = on,
            Err(e) => warn!("LED: pin write failed: {:?}", e),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// LogStatus
// ───────────────────────────────────────────────────────────────

/// Status feedback without an LED: logs each signal, counts them.
#[derive(Debug, Default)]
pub struct LogStatus {
    shown: Vec<StatusSignal>,
}

impl LogStatus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signals shown so far, oldest first.
    pub fn shown(&self) -> &[StatusSignal] {
        &self.shown
    }
}

impl StatusPort for LogStatus {
    fn show(&mut self, signal: StatusSignal) {
        debug!("LED(sim): {:?}", signal);
        self.shown.push(signal);
    }

    fn set_led(&mut self, _on: bool) {}
}

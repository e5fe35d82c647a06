//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ Controller (domain)
//! ```
//!
//! Driven adapters (sensors, actuators, link, status feedback, clock)
//! implement these traits.  The control core consumes them via generics,
//! so it never touches hardware directly.

use crate::error::{LinkFault, Result};

use super::commands::RemoteCommand;
use super::events::AppEvent;
use super::state::{Actuator, SensorReading, Timestamp};
use super::telemetry::TelemetryPayload;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port: the domain calls this to obtain sensor data.
///
/// Each read returns `None` on a fault.  Unit conversion happens behind
/// the port.
pub trait SensorPort {
    /// Air temperature in °C.
    fn read_temperature(&mut self) -> Option<f32>;

    /// Relative humidity in %.
    fn read_humidity(&mut self) -> Option<f32>;

    /// Soil moisture in %.
    fn read_soil_moisture(&mut self) -> Option<f32>;

    /// Read every channel once.
    fn read_all(&mut self) -> SensorReading {
        SensorReading {
            temperature: self.read_temperature(),
            humidity: self.read_humidity(),
            soil_moisture: self.read_soil_moisture(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to switch actuators.
pub trait ActuatorPort {
    fn set_pump(&mut self, on: bool);

    fn set_fan(&mut self, on: bool);

    /// Output level currently driven on the pump pin.
    fn pump_state(&self) -> bool;

    /// Output level currently driven on the fan pin.
    fn fan_state(&self) -> bool;

    /// Dispatch by actuator.
    fn set(&mut self, actuator: Actuator, on: bool) {
        match actuator {
            Actuator::Pump => self.set_pump(on),
            Actuator::Fan => self.set_fan(on),
        }
    }

    /// Dispatch by actuator.
    fn state(&self, actuator: Actuator) -> bool {
        match actuator {
            Actuator::Pump => self.pump_state(),
            Actuator::Fan => self.fan_state(),
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Backend port (driven adapter: domain ↔ remote backend)
// ───────────────────────────────────────────────────────────────

/// The two backend exchanges the node performs.
///
/// Implementations open a fresh connection per call and never retry
/// internally; callers retry on their own schedule.
pub trait BackendPort {
    /// Fetch pending remote commands.
    fn fetch_commands(&mut self) -> Result<RemoteCommand>;

    /// Push one telemetry payload.  `Ok` only on a verified 2xx.
    fn push_telemetry(&mut self, payload: &TelemetryPayload) -> Result<()>;
}

// ───────────────────────────────────────────────────────────────
// Link port (driven adapter: domain ↔ Wi-Fi)
// ───────────────────────────────────────────────────────────────

/// Network link status and recovery.
///
/// Recovery is split so the caller can wait without blocking: start an
/// attempt with [`begin_reconnect`](Self::begin_reconnect), then poll
/// [`is_connected`](Self::is_connected) until it reports up or the
/// caller's deadline passes.
pub trait LinkPort {
    fn is_connected(&self) -> bool;

    /// Kick off one association attempt and return immediately.
    /// `Err` means the driver refused to start it.
    fn begin_reconnect(&mut self) -> core::result::Result<(), LinkFault>;
}

// ───────────────────────────────────────────────────────────────
// Status feedback port (driven adapter: domain → LED / display)
// ───────────────────────────────────────────────────────────────

/// Indications rendered by the status-feedback collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusSignal {
    /// Boot sequence started.
    Startup,
    /// The link came (back) up.
    LinkConnected,
    /// A telemetry push succeeded.
    Sending,
    /// A task iteration failed.
    Error,
    /// Idle liveness pulse.
    Heartbeat,
}

/// Status-feedback collaborator.  The status cycle announces each
/// signal with [`show`](Self::show), then plays its blink pattern one
/// level at a time through [`set_led`](Self::set_led).
pub trait StatusPort {
    fn show(&mut self, signal: StatusSignal);

    fn set_led(&mut self, on: bool);
}

// ───────────────────────────────────────────────────────────────
// Memory port (driven adapter: domain → allocator / heap)
// ───────────────────────────────────────────────────────────────

/// Periodic memory reclaim hook.
pub trait MemoryPort {
    /// Reclaim what the platform can and report free heap bytes, if known.
    fn reclaim(&mut self) -> Option<usize>;
}

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic time source for override timeouts.
pub trait ClockPort {
    fn now(&self) -> Timestamp;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
/// Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

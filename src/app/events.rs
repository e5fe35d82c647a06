//! Outbound application events.
//!
//! The control core emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them.

use super::commands::RemoteCommand;
use super::state::{Actuator, Timestamp};
use super::telemetry::TelemetryPayload;

/// Who decided an actuator change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSource {
    /// Sensor-threshold auto-control.
    Auto,
    /// Remote override command.
    Remote,
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// An actuator output was switched.
    ActuatorChanged {
        actuator: Actuator,
        on: bool,
        source: ControlSource,
    },

    /// A remote command (re)armed the override for an actuator.
    OverrideActivated { actuator: Actuator, at: Timestamp },

    /// An override timed out; auto-control resumes on the next cycle.
    OverrideExpired { actuator: Actuator, at: Timestamp },

    /// The backend returned at least one command field.
    CommandsReceived(RemoteCommand),

    /// A telemetry payload was accepted by the backend.
    TelemetrySent(TelemetryPayload),

    /// A telemetry push failed; "last sent" was left unchanged.
    TelemetryFailed,

    /// The link supervisor saw the link drop.
    LinkLost,

    /// The link supervisor re-established the link.
    LinkRestored,

    /// Periodic memory reclaim ran.
    MemoryReclaimed { free_bytes: Option<usize> },
}

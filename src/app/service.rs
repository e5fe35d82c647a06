//! Control core and the shared device context.
//!
//! [`Controller`] owns [`DeviceState`] and the override machine and
//! exposes hardware-agnostic operations.  All I/O flows through port
//! traits injected at call sites.
//!
//! [`DeviceContext`] bundles the controller with the actuator and event
//! ports.  The scheduler shares one context between the sensor and
//! command tasks behind a `RefCell`; every mutation below completes
//! inside a single borrow with no suspension point.
//!
//! ```text
//!  SensorReading ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!                    │        Controller         │
//!  RemoteCommand ──▶ │ DeviceState · Overrides   │ ──▶ ActuatorPort
//!                    └──────────────────────────┘
//! ```

use crate::config::DeviceConfig;
use crate::fsm::{ControlMode, OverrideMachine};

use super::commands::RemoteCommand;
use super::events::AppEvent;
use super::ports::{ActuatorPort, EventSink};
use super::state::{Actuator, DeviceState, SensorReading, Timestamp};
use super::telemetry::{TelemetryPayload, should_send};

// ───────────────────────────────────────────────────────────────
// Controller
// ───────────────────────────────────────────────────────────────

/// Auto-control thresholds, change detection and override bookkeeping.
pub struct Controller {
    device: DeviceState,
    overrides: OverrideMachine,
    temp_threshold_c: f32,
    soil_threshold_pct: f32,
    change_threshold: f32,
    last_command_at: Option<Timestamp>,
}

impl Controller {
    /// Boot state: both actuators off, both in auto, nothing sent.
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            device: DeviceState::new(),
            overrides: OverrideMachine::new(u64::from(config.override_timeout_secs)),
            temp_threshold_c: config.temp_threshold_c,
            soil_threshold_pct: config.soil_moisture_threshold_pct,
            change_threshold: config.change_threshold,
            last_command_at: None,
        }
    }

    // ── Auto-control ──────────────────────────────────────────

    /// Derive and apply auto decisions, pump first.  A faulted channel
    /// skips its actuator for this cycle.
    pub fn run_auto_control(
        &mut self,
        reading: &SensorReading,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        if let Some(soil) = reading.soil_moisture {
            let desired = soil < self.soil_threshold_pct;
            self.overrides
                .apply_auto_decision(&mut self.device, Actuator::Pump, desired, hw, sink);
        }
        if let Some(temp) = reading.temperature {
            let desired = temp > self.temp_threshold_c;
            self.overrides
                .apply_auto_decision(&mut self.device, Actuator::Fan, desired, hw, sink);
        }
    }

    /// Expire stale overrides.
    pub fn tick_timeouts(&mut self, now: Timestamp, sink: &mut impl EventSink) -> usize {
        self.overrides.tick_timeout(now, sink)
    }

    // ── Remote commands ───────────────────────────────────────

    /// Apply one commanded actuator value (arms the override).
    pub fn apply_remote_command(
        &mut self,
        actuator: Actuator,
        on: bool,
        now: Timestamp,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> bool {
        self.last_command_at = Some(now);
        self.overrides
            .apply_remote_command(&mut self.device, actuator, on, now, hw, sink)
    }

    // ── Telemetry ─────────────────────────────────────────────

    /// Payload to push, if the reading differs enough from the last one sent.
    pub fn telemetry_due(&self, reading: &SensorReading) -> Option<TelemetryPayload> {
        should_send(&self.device, reading, self.change_threshold).then(|| reading.into())
    }

    /// Record a reading the backend accepted.
    pub fn commit_sent(&mut self, reading: &SensorReading) {
        self.device.commit_sent(reading);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn device(&self) -> &DeviceState {
        &self.device
    }

    pub fn overrides(&self) -> &OverrideMachine {
        &self.overrides
    }

    pub fn mode(&self, actuator: Actuator) -> ControlMode {
        self.overrides.mode(actuator)
    }

    /// When the last command with a present field was applied.
    pub fn last_command_at(&self) -> Option<Timestamp> {
        self.last_command_at
    }
}

// ───────────────────────────────────────────────────────────────
// DeviceContext
// ───────────────────────────────────────────────────────────────

/// The shared context: controller plus the ports it drives.
pub struct DeviceContext<A: ActuatorPort, E: EventSink> {
    pub controller: Controller,
    pub actuators: A,
    pub events: E,
}

impl<A: ActuatorPort, E: EventSink> DeviceContext<A, E> {
    pub fn new(config: &DeviceConfig, actuators: A, events: E) -> Self {
        Self {
            controller: Controller::new(config),
            actuators,
            events,
        }
    }

    /// Timeout check followed by auto-control, as one atomic step.
    pub fn auto_cycle(&mut self, reading: &SensorReading, now: Timestamp) {
        self.controller.tick_timeouts(now, &mut self.events);
        self.controller
            .run_auto_control(reading, &mut self.actuators, &mut self.events);
    }

    /// Apply every present field, pump before fan.  Returns the count.
    pub fn apply_commands(&mut self, cmd: &RemoteCommand, now: Timestamp) -> usize {
        if cmd.is_empty() {
            return 0;
        }
        self.events.emit(&AppEvent::CommandsReceived(*cmd));
        let mut applied = 0;
        for (actuator, on) in cmd.fields() {
            self.controller
                .apply_remote_command(actuator, on, now, &mut self.actuators, &mut self.events);
            applied += 1;
        }
        applied
    }

    /// Actuators whose driven pin level disagrees with [`DeviceState`].
    pub fn actuator_drift(&self) -> impl Iterator<Item = Actuator> + '_ {
        Actuator::ALL
            .into_iter()
            .filter(|a| self.actuators.state(*a) != self.controller.device().is_on(*a))
    }
}

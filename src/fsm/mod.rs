//! Per-actuator auto / manual-override state machine.
//!
//! ```text
//!              remote command (any value)
//!        ┌──────────────────────────────────┐
//!        │                                  ▼
//!   ┌─────────┐                     ┌────────────────┐
//!   │  Auto   │                     │ ManualOverride │──┐ remote command
//!   └─────────┘                     └────────────────┘◀─┘ (re-arms `since`)
//!        ▲                                  │
//!        └──────────────────────────────────┘
//!           now - since > override timeout
//! ```
//!
//! Both actuators start in `Auto`.  A remote command always moves the
//! addressed actuator to `ManualOverride`; only the timeout moves it back.
//! Expiry itself never touches the actuator: the next auto decision
//! reconciles the output.
//!
//! Every method here is synchronous and runs to completion, so a state
//! transition can never be split by a task suspension point.

use log::info;

use crate::app::events::{AppEvent, ControlSource};
use crate::app::ports::{ActuatorPort, EventSink};
use crate::app::state::{Actuator, DeviceState, Timestamp};

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Control mode of one actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlMode {
    Auto,
    ManualOverride,
}

/// Override bookkeeping for one actuator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverrideEntry {
    /// A remote command currently suppresses auto-control.
    pub active: bool,
    /// When the override was last (re)armed.
    pub since: Timestamp,
}

/// Override bookkeeping for both actuators.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OverrideState {
    pub pump: OverrideEntry,
    pub fan: OverrideEntry,
}

impl OverrideState {
    pub fn entry(&self, actuator: Actuator) -> &OverrideEntry {
        match actuator {
            Actuator::Pump => &self.pump,
            Actuator::Fan => &self.fan,
        }
    }

    fn entry_mut(&mut self, actuator: Actuator) -> &mut OverrideEntry {
        match actuator {
            Actuator::Pump => &mut self.pump,
            Actuator::Fan => &mut self.fan,
        }
    }
}

// ---------------------------------------------------------------------------
// Machine
// ---------------------------------------------------------------------------

/// The override state machine.
pub struct OverrideMachine {
    state: OverrideState,
    timeout_secs: u64,
}

impl OverrideMachine {
    /// Both actuators start in [`ControlMode::Auto`].
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            state: OverrideState::default(),
            timeout_secs,
        }
    }

    pub fn mode(&self, actuator: Actuator) -> ControlMode {
        if self.state.entry(actuator).active {
            ControlMode::ManualOverride
        } else {
            ControlMode::Auto
        }
    }

    pub fn state(&self) -> &OverrideState {
        &self.state
    }

    /// Apply a sensor-derived decision.
    ///
    /// Switches the actuator only when it is in `Auto` and `desired`
    /// differs from the last applied output.  Returns whether the
    /// actuator was switched.
    pub fn apply_auto_decision(
        &self,
        device: &mut DeviceState,
        actuator: Actuator,
        desired: bool,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> bool {
        if self.state.entry(actuator).active || device.is_on(actuator) == desired {
            return false;
        }
        hw.set(actuator, desired);
        device.set_on(actuator, desired);
        info!("Auto: {} {}", actuator, if desired { "ON" } else { "OFF" });
        sink.emit(&AppEvent::ActuatorChanged {
            actuator,
            on: desired,
            source: ControlSource::Auto,
        });
        true
    }

    /// Apply a remote command for one actuator.
    ///
    /// Always (re)arms the override at `now`.  The actuator is only
    /// switched when `commanded` differs from the last applied output.
    /// Returns whether the actuator was switched.
    pub fn apply_remote_command(
        &mut self,
        device: &mut DeviceState,
        actuator: Actuator,
        commanded: bool,
        now: Timestamp,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) -> bool {
        let entry = self.state.entry_mut(actuator);
        entry.active = true;
        entry.since = now;
        sink.emit(&AppEvent::OverrideActivated { actuator, at: now });

        if device.is_on(actuator) == commanded {
            return false;
        }
        hw.set(actuator, commanded);
        device.set_on(actuator, commanded);
        info!("Remote: {} {}", actuator, if commanded { "ON" } else { "OFF" });
        sink.emit(&AppEvent::ActuatorChanged {
            actuator,
            on: commanded,
            source: ControlSource::Remote,
        });
        true
    }

    /// Expire overrides older than the timeout.  Returns how many expired.
    pub fn tick_timeout(&mut self, now: Timestamp, sink: &mut impl EventSink) -> usize {
        let mut expired = 0;
        for actuator in Actuator::ALL {
            let timeout = self.timeout_secs;
            let entry = self.state.entry_mut(actuator);
            if entry.active && now.saturating_sub(entry.since) > timeout {
                entry.active = false;
                expired += 1;
                info!("Override: {} back to auto after {}s", actuator, timeout);
                sink.emit(&AppEvent::OverrideExpired { actuator, at: now });
            }
        }
        expired
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

//! Inbound remote commands and the command sync loop.
//!
//! The backend answers `GET /api/data/{id}/commands` with
//! `{"pump": bool?, "fan": bool?}`.  An absent (or non-boolean) field
//! means "no opinion", never "turn off".
//!
//! [`CommandPoller`] runs the one-shot startup sync and the periodic
//! poll, applying every present field through the override machine in
//! fixed pump-then-fan order.

use core::cell::RefCell;

use log::{debug, info, warn};
use serde_json::Value;

use crate::error::Result;
use crate::supervisor::LinkState;

use super::ports::{ActuatorPort, BackendPort, ClockPort, EventSink};
use super::service::DeviceContext;
use super::state::Actuator;

// ───────────────────────────────────────────────────────────────
// RemoteCommand
// ───────────────────────────────────────────────────────────────

/// Commands decoded from one poll response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemoteCommand {
    pub pump: Option<bool>,
    pub fan: Option<bool>,
}

impl RemoteCommand {
    /// Decode a response body.  Anything that is not an object, and any
    /// field that is not a boolean, decodes to "no opinion".
    pub fn from_json(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };
        Self {
            pump: obj.get("pump").and_then(Value::as_bool),
            fan: obj.get("fan").and_then(Value::as_bool),
        }
    }

    pub fn get(&self, actuator: Actuator) -> Option<bool> {
        match actuator {
            Actuator::Pump => self.pump,
            Actuator::Fan => self.fan,
        }
    }

    /// True when no field is present.
    pub fn is_empty(&self) -> bool {
        self.pump.is_none() && self.fan.is_none()
    }

    /// Present fields, pump first.
    pub fn fields(&self) -> impl Iterator<Item = (Actuator, bool)> + '_ {
        Actuator::ALL
            .into_iter()
            .filter_map(|a| self.get(a).map(|on| (a, on)))
    }
}

// ───────────────────────────────────────────────────────────────
// Startup sync outcome
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// At least one field was applied; those actuators start overridden.
    Applied(usize),
    /// The backend had nothing pending; full auto-control.
    NoCommands,
    /// The fetch failed; full auto-control.
    Failed(crate::error::Error),
}

// ───────────────────────────────────────────────────────────────
// CommandPoller
// ───────────────────────────────────────────────────────────────

/// Fetches remote commands and applies them to the shared context.
pub struct CommandPoller<B: BackendPort> {
    backend: B,
    link: LinkState,
}

impl<B: BackendPort> CommandPoller<B> {
    pub fn new(backend: B, link: LinkState) -> Self {
        Self { backend, link }
    }

    /// One-shot startup sync.  Must complete before any auto-control
    /// cycle runs so a pending override is never raced.
    pub fn initial_sync<A, E>(
        &mut self,
        ctx: &RefCell<DeviceContext<A, E>>,
        clock: &impl ClockPort,
    ) -> SyncOutcome
    where
        A: ActuatorPort,
        E: EventSink,
    {
        let cmd = match self.backend.fetch_commands() {
            Ok(cmd) => cmd,
            Err(e) => {
                warn!("SYNC: initial fetch failed ({}), starting in auto", e);
                return SyncOutcome::Failed(e);
            }
        };
        if cmd.is_empty() {
            info!("SYNC: no pending commands, starting in auto");
            return SyncOutcome::NoCommands;
        }
        let now = clock.now();
        let applied = ctx.borrow_mut().apply_commands(&cmd, now);
        info!("SYNC: applied {} startup command(s) {:?}", applied, cmd);
        SyncOutcome::Applied(applied)
    }

    /// One poll iteration.  Returns the number of fields applied.
    ///
    /// A fetch fault propagates to the task wrapper, which logs it; the
    /// next interval simply tries again.
    pub fn poll<A, E>(
        &mut self,
        ctx: &RefCell<DeviceContext<A, E>>,
        clock: &impl ClockPort,
    ) -> Result<usize>
    where
        A: ActuatorPort,
        E: EventSink,
    {
        if !self.link.is_up() {
            debug!("SYNC: link down, skipping poll");
            return Ok(0);
        }
        let cmd = self.backend.fetch_commands()?;
        if cmd.is_empty() {
            return Ok(0);
        }
        // Override timestamps use the fetch completion time.
        let now = clock.now();
        Ok(ctx.borrow_mut().apply_commands(&cmd, now))
    }
}

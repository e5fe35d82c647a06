//! Change-detected telemetry uplink.
//!
//! Every cycle runs auto-control first, then compares the reading with
//! the last values the backend accepted.  A push happens only when a
//! channel has never been sent or moved by more than the change
//! threshold.  "Last sent" is committed only after a verified push, so a
//! failed push is retried naturally on the next cycle.

use core::cell::RefCell;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::supervisor::LinkState;

use super::events::AppEvent;
use super::ports::{ActuatorPort, BackendPort, EventSink};
use super::service::DeviceContext;
use super::state::{CHANNELS, DeviceState, SensorReading, Timestamp};

// ───────────────────────────────────────────────────────────────
// Wire payload
// ───────────────────────────────────────────────────────────────

/// Body of `POST /api/data/{id}`.  Faulted channels serialise as `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TelemetryPayload {
    pub temp: Option<f32>,
    pub humidity: Option<f32>,
    pub soil_moisture: Option<f32>,
}

impl From<&SensorReading> for TelemetryPayload {
    fn from(r: &SensorReading) -> Self {
        Self {
            temp: r.temperature,
            humidity: r.humidity,
            soil_moisture: r.soil_moisture,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Change detection
// ───────────────────────────────────────────────────────────────

/// True when at least one present channel has no prior value or moved
/// by more than `threshold`.  Faulted channels never trigger.
pub fn should_send(last: &DeviceState, reading: &SensorReading, threshold: f32) -> bool {
    CHANNELS
        .iter()
        .any(|&ch| match (reading.channel(ch), last.last_sent(ch)) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(new), Some(old)) => (new - old).abs() > threshold,
        })
}

// ───────────────────────────────────────────────────────────────
// Uplink
// ───────────────────────────────────────────────────────────────

/// Result of one uplink cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum UplinkOutcome {
    /// The backend accepted the payload; "last sent" was committed.
    Sent(TelemetryPayload),
    /// No channel moved past the threshold.
    Unchanged,
    /// A push was due but the link is known to be down.
    Deferred,
    /// The push failed; nothing was committed.
    Failed(Error),
}

/// Owns the push side of the backend client.
pub struct TelemetryUplink<B: BackendPort> {
    backend: B,
    link: LinkState,
    sent: u32,
    failed: u32,
}

impl<B: BackendPort> TelemetryUplink<B> {
    pub fn new(backend: B, link: LinkState) -> Self {
        Self {
            backend,
            link,
            sent: 0,
            failed: 0,
        }
    }

    /// Run one sensor cycle: timeouts, auto-control, change detection,
    /// then (maybe) a push.
    ///
    /// Each borrow of `ctx` is released before the network exchange, and
    /// every state update happens inside a single borrow.
    pub fn maybe_send<A, E>(
        &mut self,
        ctx: &RefCell<DeviceContext<A, E>>,
        reading: &SensorReading,
        now: Timestamp,
    ) -> UplinkOutcome
    where
        A: ActuatorPort,
        E: EventSink,
    {
        let due = {
            let mut ctx = ctx.borrow_mut();
            ctx.auto_cycle(reading, now);
            ctx.controller.telemetry_due(reading)
        };
        let Some(payload) = due else {
            return UplinkOutcome::Unchanged;
        };
        if !self.link.is_up() {
            debug!("UPLINK: link down, deferring push");
            return UplinkOutcome::Deferred;
        }

        match self.backend.push_telemetry(&payload) {
            Ok(()) => {
                self.sent = self.sent.wrapping_add(1);
                let mut ctx = ctx.borrow_mut();
                ctx.controller.commit_sent(reading);
                ctx.events.emit(&AppEvent::TelemetrySent(payload));
                UplinkOutcome::Sent(payload)
            }
            Err(e) => {
                self.failed = self.failed.wrapping_add(1);
                debug!("UPLINK: push failed ({}), retrying next cycle", e);
                ctx.borrow_mut().events.emit(&AppEvent::TelemetryFailed);
                UplinkOutcome::Failed(e)
            }
        }
    }

    /// Pushes accepted since boot.
    pub fn sent_count(&self) -> u32 {
        self.sent
    }

    /// Pushes that failed since boot.
    pub fn failed_count(&self) -> u32 {
        self.failed
    }
}

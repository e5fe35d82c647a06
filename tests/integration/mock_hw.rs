//! Mock adapters for integration tests.
//!
//! Every mock that a test needs to inspect after handing it to the node
//! keeps its state behind an `Rc`, so a clone stays with the test.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use greenhouse_node::app::commands::RemoteCommand;
use greenhouse_node::app::events::AppEvent;
use greenhouse_node::app::ports::{
    ActuatorPort, BackendPort, ClockPort, EventSink, LinkPort, MemoryPort, StatusPort,
    StatusSignal,
};
use greenhouse_node::app::state::{Actuator, Timestamp};
use greenhouse_node::app::telemetry::TelemetryPayload;
use greenhouse_node::config::DeviceConfig;
use greenhouse_node::error::{Error, LinkFault, ProtocolFault, Result, TransportFault};

pub fn provisioned_config() -> DeviceConfig {
    let mut c = DeviceConfig::default();
    c.backend.device_id = "gh-test".into();
    c.backend.api_key = "k".into();
    c.reconnect_poll_ms = 5;
    c
}

// ── Actuators ─────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct MockActuators {
    pub calls: Vec<(Actuator, bool)>,
    pump: bool,
    fan: bool,
}

#[allow(dead_code)]
impl MockActuators {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn switches(&self, actuator: Actuator) -> Vec<bool> {
        self.calls
            .iter()
            .filter(|(a, _)| *a == actuator)
            .map(|(_, on)| *on)
            .collect()
    }
}

impl ActuatorPort for MockActuators {
    fn set_pump(&mut self, on: bool) {
        self.pump = on;
        self.calls.push((Actuator::Pump, on));
    }

    fn set_fan(&mut self, on: bool) {
        self.fan = on;
        self.calls.push((Actuator::Fan, on));
    }

    fn pump_state(&self) -> bool {
        self.pump
    }

    fn fan_state(&self) -> bool {
        self.fan
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Backend ───────────────────────────────────────────────────

/// Shared script and record for [`ScriptedBackend`] clones.
#[derive(Debug, Default)]
pub struct BackendScript {
    /// Responses for `fetch_commands`, oldest first.  Empty queue
    /// answers "no commands".
    pub commands: VecDeque<Result<RemoteCommand>>,
    /// Outcomes for `push_telemetry`, oldest first.  Empty queue accepts.
    pub pushes: VecDeque<Result<()>>,
    /// Every fetch always fails with this error when set.
    pub fetch_always_fails: Option<Error>,
    /// Every push always fails with this error when set.
    pub push_always_fails: Option<Error>,
    pub fetches: u32,
    pub pushed: Vec<TelemetryPayload>,
}

#[derive(Debug, Clone, Default)]
pub struct ScriptedBackend(pub Rc<RefCell<BackendScript>>);

#[allow(dead_code)]
impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_commands(&self, cmd: RemoteCommand) {
        self.0.borrow_mut().commands.push_back(Ok(cmd));
    }

    pub fn queue_fetch_error(&self, e: Error) {
        self.0.borrow_mut().commands.push_back(Err(e));
    }

    pub fn queue_push_error(&self, e: Error) {
        self.0.borrow_mut().pushes.push_back(Err(e));
    }

    pub fn fail_everything(&self) {
        let mut s = self.0.borrow_mut();
        s.fetch_always_fails = Some(TransportFault::Connect.into());
        s.push_always_fails = Some(ProtocolFault::Status(503).into());
    }

    pub fn fetches(&self) -> u32 {
        self.0.borrow().fetches
    }

    pub fn pushed(&self) -> Vec<TelemetryPayload> {
        self.0.borrow().pushed.clone()
    }
}

impl BackendPort for ScriptedBackend {
    fn fetch_commands(&mut self) -> Result<RemoteCommand> {
        let mut s = self.0.borrow_mut();
        s.fetches += 1;
        if let Some(e) = s.fetch_always_fails {
            return Err(e);
        }
        s.commands.pop_front().unwrap_or(Ok(RemoteCommand::default()))
    }

    fn push_telemetry(&mut self, payload: &TelemetryPayload) -> Result<()> {
        let mut s = self.0.borrow_mut();
        if let Some(e) = s.push_always_fails {
            return Err(e);
        }
        let res = s.pushes.pop_front().unwrap_or(Ok(()));
        if res.is_ok() {
            s.pushed.push(*payload);
        }
        res
    }
}

// ── Clock ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct ManualClock(pub Rc<Cell<Timestamp>>);

#[allow(dead_code)]
impl ManualClock {
    pub fn at(t: Timestamp) -> Self {
        Self(Rc::new(Cell::new(t)))
    }

    pub fn set(&self, t: Timestamp) {
        self.0.set(t);
    }
}

impl ClockPort for ManualClock {
    fn now(&self) -> Timestamp {
        self.0.get()
    }
}

// ── Link ──────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct LinkScript {
    pub up: bool,
    /// Upcoming attempts the driver refuses outright.
    pub fail_reconnects: u32,
    pub reconnects: u32,
    /// Association time for accepted attempts.
    pub connect_delay: Duration,
    pending_until: Option<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct MockLink(pub Rc<RefCell<LinkScript>>);

#[allow(dead_code)]
impl MockLink {
    pub fn up() -> Self {
        let link = Self::default();
        link.0.borrow_mut().up = true;
        link
    }

    pub fn down() -> Self {
        Self::default()
    }

    /// Down, and each accepted attempt takes `delay` to associate.
    pub fn slow(delay: Duration) -> Self {
        let link = Self::default();
        link.0.borrow_mut().connect_delay = delay;
        link
    }

    pub fn fail_next(&self, n: u32) {
        self.0.borrow_mut().fail_reconnects = n;
    }

    pub fn reconnects(&self) -> u32 {
        self.0.borrow().reconnects
    }

    pub fn is_up(&self) -> bool {
        let mut s = self.0.borrow_mut();
        if s.pending_until.is_some_and(|t| Instant::now() >= t) {
            s.pending_until = None;
            s.up = true;
        }
        s.up
    }
}

impl LinkPort for MockLink {
    fn is_connected(&self) -> bool {
        self.is_up()
    }

    fn begin_reconnect(&mut self) -> core::result::Result<(), LinkFault> {
        let mut s = self.0.borrow_mut();
        s.reconnects += 1;
        if s.fail_reconnects > 0 {
            s.fail_reconnects -= 1;
            return Err(LinkFault::ConnectFailed);
        }
        if s.connect_delay.is_zero() {
            s.up = true;
        } else {
            s.pending_until = Some(Instant::now() + s.connect_delay);
        }
        Ok(())
    }
}

// ── Status and memory ─────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct RecordingStatus(pub Rc<RefCell<Vec<StatusSignal>>>);

#[allow(dead_code)]
impl RecordingStatus {
    pub fn shown(&self) -> Vec<StatusSignal> {
        self.0.borrow().clone()
    }
}

impl StatusPort for RecordingStatus {
    fn show(&mut self, signal: StatusSignal) {
        self.0.borrow_mut().push(signal);
    }

    fn set_led(&mut self, _on: bool) {}
}

#[derive(Debug, Default)]
pub struct FixedMemory;

impl MemoryPort for FixedMemory {
    fn reclaim(&mut self) -> Option<usize> {
        Some(128 * 1024)
    }
}

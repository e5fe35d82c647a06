//! Cooperative task scheduler.
//!
//! One thread, one `edge-executor` [`LocalExecutor`], five perpetual
//! tasks.  Each task is `loop { body; sleep(interval) }` where the sleep
//! is an `async-io-mini` reactor timer.  Reactor timers are the only
//! suspension points: the link task also waits on one while a reconnect
//! is pending, and never holds a context borrow across it.  Every state
//! transition therefore runs to completion before another task gets the
//! CPU, and shared state lives in a plain `Rc<RefCell<..>>`.
//!
//! ```text
//!  ┌────────────────────────────────────────────────────────────┐
//!  │  futures_lite::block_on                                    │
//!  │  ┌──────────────────────────────────────────────────────┐  │
//!  │  │  edge_executor::LocalExecutor                        │  │
//!  │  │                                                      │  │
//!  │  │  boot: Startup LED → link → initial sync → spawn     │  │
//!  │  │                                                      │  │
//!  │  │  ┌────────┐ ┌─────────┐ ┌──────┐ ┌────────┐ ┌──────┐ │  │
//!  │  │  │ Sensor │ │Commands │ │ Link │ │ Memory │ │Status│ │  │
//!  │  │  │  1 s ⏱ │ │  1 s ⏱  │ │10 s ⏱│ │ 60 s ⏱ │ │ 2 s ⏱│ │  │
//!  │  │  └───┬────┘ └────┬────┘ └──┬───┘ └────────┘ └──▲───┘ │  │
//!  │  │      │  DeviceContext  │   │   StatusSignals    │     │  │
//!  │  │      └─────────┴───────┘   └────────────────────┘     │  │
//!  │  └──────────────────────────────────────────────────────┘  │
//!  └────────────────────────────────────────────────────────────┘
//! ```
//!
//! A failing iteration is logged, counted and signalled to the status
//! task; it never ends the task or the scheduler.

use core::cell::RefCell;
use core::fmt;
use core::future::Future;
use core::time::Duration;
use std::rc::Rc;

use edge_executor::LocalExecutor;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::signal::Signal;
use log::{debug, info, warn};

use crate::app::commands::{CommandPoller, SyncOutcome};
use crate::app::events::AppEvent;
use crate::app::ports::{
    ActuatorPort, BackendPort, ClockPort, EventSink, LinkPort, MemoryPort, SensorPort, StatusPort,
    StatusSignal,
};
use crate::app::service::DeviceContext;
use crate::app::telemetry::{TelemetryUplink, UplinkOutcome};
use crate::config::DeviceConfig;
use crate::drivers::status_led::pattern;
use crate::error::Result;
use crate::supervisor::{ConnectivitySupervisor, LinkOutcome, LinkState};

// ═══════════════════════════════════════════════════════════════
//  Task bookkeeping
// ═══════════════════════════════════════════════════════════════

/// The fixed task set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Sensor,
    Commands,
    Link,
    Memory,
    Status,
}

impl TaskKind {
    pub const ALL: [TaskKind; 5] = [
        TaskKind::Sensor,
        TaskKind::Commands,
        TaskKind::Link,
        TaskKind::Memory,
        TaskKind::Status,
    ];

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for TaskKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Sensor => "sensor",
            Self::Commands => "commands",
            Self::Link => "link",
            Self::Memory => "memory",
            Self::Status => "status",
        };
        f.write_str(name)
    }
}

/// Per-task counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskStats {
    pub iterations: u64,
    pub faults: u64,
}

type SharedStats = Rc<RefCell<[TaskStats; TaskKind::ALL.len()]>>;

/// Per-task sleep intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Intervals {
    pub sensor: Duration,
    pub commands: Duration,
    pub link: Duration,
    pub memory: Duration,
    pub status: Duration,
}

impl Intervals {
    pub fn from_config(config: &DeviceConfig) -> Self {
        let ms = |v: u32| Duration::from_millis(u64::from(v));
        Self {
            sensor: ms(config.send_interval_ms),
            commands: ms(config.command_poll_interval_ms),
            link: ms(config.wifi_check_interval_ms),
            memory: ms(config.memory_reclaim_interval_ms),
            status: ms(config.status_interval_ms),
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Status signals
// ═══════════════════════════════════════════════════════════════

/// One-shot indications raised by worker tasks, drained by the status
/// task.  Fault outranks link-restored, which outranks sending.
#[derive(Default)]
pub struct StatusSignals {
    fault: Signal<NoopRawMutex, ()>,
    restored: Signal<NoopRawMutex, ()>,
    sent: Signal<NoopRawMutex, ()>,
}

impl StatusSignals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fault(&self) {
        self.fault.signal(());
    }

    pub fn link_restored(&self) {
        self.restored.signal(());
    }

    pub fn sent(&self) {
        self.sent.signal(());
    }

    /// Highest-priority pending signal, or a heartbeat.  Lower-priority
    /// signals stay pending for a later pass.
    pub fn next(&self) -> StatusSignal {
        if self.fault.try_take().is_some() {
            StatusSignal::Error
        } else if self.restored.try_take().is_some() {
            StatusSignal::LinkConnected
        } else if self.sent.try_take().is_some() {
            StatusSignal::Sending
        } else {
            StatusSignal::Heartbeat
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Node: everything the tasks own
// ═══════════════════════════════════════════════════════════════

/// Ports and collaborators handed to [`Node::new`].
pub struct NodeParts<S, A, E, B, L, M, P, C> {
    pub sensors: S,
    pub actuators: A,
    pub events: E,
    /// Backend client owned by the sensor/uplink task.
    pub uplink_backend: B,
    /// Backend client owned by the command-poll task.
    pub poll_backend: B,
    pub link: L,
    pub memory: M,
    pub status: P,
    pub clock: C,
}

/// The assembled node, ready to hand to [`Scheduler::run`].
pub struct Node<S, A, E, B, L, M, P, C>
where
    A: ActuatorPort,
    E: EventSink,
    B: BackendPort,
{
    ctx: Rc<RefCell<DeviceContext<A, E>>>,
    sensors: S,
    uplink: TelemetryUplink<B>,
    poller: CommandPoller<B>,
    supervisor: ConnectivitySupervisor,
    link: L,
    memory: M,
    status: P,
    clock: Rc<C>,
}

impl<S, A, E, B, L, M, P, C> Node<S, A, E, B, L, M, P, C>
where
    S: SensorPort,
    A: ActuatorPort,
    E: EventSink,
    B: BackendPort,
    L: LinkPort,
    M: MemoryPort,
    P: StatusPort,
    C: ClockPort,
{
    pub fn new(config: &DeviceConfig, parts: NodeParts<S, A, E, B, L, M, P, C>) -> Self {
        let link_state = LinkState::new();
        let reconnect_timeout = Duration::from_secs(u64::from(config.reconnect_timeout_secs));
        let reconnect_poll = Duration::from_millis(u64::from(config.reconnect_poll_ms));
        Self {
            ctx: Rc::new(RefCell::new(DeviceContext::new(
                config,
                parts.actuators,
                parts.events,
            ))),
            sensors: parts.sensors,
            uplink: TelemetryUplink::new(parts.uplink_backend, link_state.clone()),
            poller: CommandPoller::new(parts.poll_backend, link_state.clone()),
            supervisor: ConnectivitySupervisor::new(link_state, reconnect_timeout, reconnect_poll),
            link: parts.link,
            memory: parts.memory,
            status: parts.status,
            clock: Rc::new(parts.clock),
        }
    }

    /// Shared device context (controller plus actuator/event ports).
    pub fn context(&self) -> Rc<RefCell<DeviceContext<A, E>>> {
        self.ctx.clone()
    }

    pub fn link_state(&self) -> LinkState {
        self.supervisor.link_state().clone()
    }
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler
// ═══════════════════════════════════════════════════════════════

pub struct Scheduler {
    intervals: Intervals,
    stats: SharedStats,
    signals: Rc<StatusSignals>,
    pattern_holds: bool,
}

impl Scheduler {
    pub fn new(config: &DeviceConfig) -> Self {
        Self::with_intervals(Intervals::from_config(config))
    }

    pub fn with_intervals(intervals: Intervals) -> Self {
        Self {
            intervals,
            stats: Rc::new(RefCell::new([TaskStats::default(); TaskKind::ALL.len()])),
            signals: Rc::new(StatusSignals::new()),
            pattern_holds: true,
        }
    }

    /// Render blink patterns level by level without waiting between
    /// steps.  For bench and host runs where boot would otherwise sit
    /// through several seconds of LED timing.
    pub fn without_pattern_holds(mut self) -> Self {
        self.pattern_holds = false;
        self
    }

    /// Counters for one task.
    pub fn stats(&self, kind: TaskKind) -> TaskStats {
        self.stats.borrow()[kind.index()]
    }

    /// Boot the node, then drive all tasks until `until` completes.
    ///
    /// On the device `until` is `core::future::pending()`, so this never
    /// returns.  Returns the initial sync outcome.
    pub fn run<S, A, E, B, L, M, P, C>(
        &self,
        node: Node<S, A, E, B, L, M, P, C>,
        until: impl Future<Output = ()>,
    ) -> SyncOutcome
    where
        S: SensorPort,
        A: ActuatorPort,
        E: EventSink,
        B: BackendPort,
        L: LinkPort,
        M: MemoryPort,
        P: StatusPort,
        C: ClockPort,
    {
        let executor: LocalExecutor<'_, 8> = LocalExecutor::new();
        futures_lite::future::block_on(executor.run(async {
            let sync = self.boot_and_spawn(&executor, node).await;
            until.await;
            info!("SCHED: shutting down");
            sync
        }))
    }

    async fn boot_and_spawn<'a, S, A, E, B, L, M, P, C>(
        &'a self,
        executor: &LocalExecutor<'a, 8>,
        node: Node<S, A, E, B, L, M, P, C>,
    ) -> SyncOutcome
    where
        S: SensorPort + 'a,
        A: ActuatorPort + 'a,
        E: EventSink + 'a,
        B: BackendPort + 'a,
        L: LinkPort + 'a,
        M: MemoryPort + 'a,
        P: StatusPort + 'a,
        C: ClockPort + 'a,
    {
        let Node {
            ctx,
            mut sensors,
            mut uplink,
            mut poller,
            mut supervisor,
            mut link,
            mut memory,
            mut status,
            clock,
        } = node;

        // ── Boot sequence ─────────────────────────────────────
        let holds = self.pattern_holds;
        play(&mut status, StatusSignal::Startup, holds).await;
        if supervisor.boot_connect(&mut link).await.is_ok() {
            play(&mut status, StatusSignal::LinkConnected, holds).await;
        }
        // Must finish before the first auto-control cycle.
        let sync = poller.initial_sync(&ctx, &*clock);
        info!("SCHED: initial sync {:?}, starting tasks", sync);

        // ── Sensor / auto-control / uplink ────────────────────
        {
            let (ctx, clock, signals) = (ctx.clone(), clock.clone(), self.signals.clone());
            let body = move || {
                let reading = sensors.read_all();
                for fault in reading.faults() {
                    debug!("SCHED: {}", fault);
                }
                match uplink.maybe_send(&ctx, &reading, clock.now()) {
                    UplinkOutcome::Sent(_) => {
                        signals.sent();
                        Ok(())
                    }
                    UplinkOutcome::Failed(e) => Err(e),
                    UplinkOutcome::Unchanged | UplinkOutcome::Deferred => Ok(()),
                }
            };
            executor
                .spawn(self.perpetual(TaskKind::Sensor, self.intervals.sensor, body))
                .detach();
        }

        // ── Command poll ──────────────────────────────────────
        {
            let (ctx, clock) = (ctx.clone(), clock.clone());
            let body = move || poller.poll(&ctx, &*clock).map(|_| ());
            executor
                .spawn(self.perpetual(TaskKind::Commands, self.intervals.commands, body))
                .detach();
        }

        // ── Connectivity supervisor ───────────────────────────
        executor
            .spawn(self.link_loop(ctx.clone(), supervisor, link))
            .detach();

        // ── Memory reclaim ────────────────────────────────────
        {
            let ctx = ctx.clone();
            let body = move || {
                let free_bytes = memory.reclaim();
                ctx.borrow_mut()
                    .events
                    .emit(&AppEvent::MemoryReclaimed { free_bytes });
                Ok(())
            };
            executor
                .spawn(self.perpetual(TaskKind::Memory, self.intervals.memory, body))
                .detach();
        }

        // ── Status feedback ───────────────────────────────────
        executor.spawn(self.status_loop(ctx, status)).detach();

        sync
    }

    /// `loop { body; sleep }`, with faults logged and counted.
    fn perpetual(
        &self,
        kind: TaskKind,
        interval: Duration,
        mut body: impl FnMut() -> Result<()>,
    ) -> impl Future<Output = ()> {
        let stats = self.stats.clone();
        let signals = self.signals.clone();
        async move {
            info!("SCHED: {} task started ({} ms)", kind, interval.as_millis());
            loop {
                record(&stats, &signals, kind, body());
                async_io_mini::Timer::after(interval).await;
            }
        }
    }

    /// Supervisor task.  A pending reconnect suspends only this task;
    /// the context is borrowed just long enough to emit each event.
    fn link_loop<A: ActuatorPort, E: EventSink, L: LinkPort>(
        &self,
        ctx: Rc<RefCell<DeviceContext<A, E>>>,
        mut supervisor: ConnectivitySupervisor,
        mut link: L,
    ) -> impl Future<Output = ()> {
        let stats = self.stats.clone();
        let signals = self.signals.clone();
        let interval = self.intervals.link;
        async move {
            info!("SCHED: {} task started ({} ms)", TaskKind::Link, interval.as_millis());
            loop {
                let outcome = supervisor
                    .tick(&mut link, |event| ctx.borrow_mut().events.emit(event))
                    .await;
                let res = match outcome {
                    LinkOutcome::Restored => {
                        signals.link_restored();
                        Ok(())
                    }
                    LinkOutcome::Up => Ok(()),
                    LinkOutcome::Down(e) => Err(e.into()),
                };
                record(&stats, &signals, TaskKind::Link, res);
                async_io_mini::Timer::after(interval).await;
            }
        }
    }

    /// Status task: drift check, then render the next signal.
    fn status_loop<A: ActuatorPort, E: EventSink, P: StatusPort>(
        &self,
        ctx: Rc<RefCell<DeviceContext<A, E>>>,
        mut status: P,
    ) -> impl Future<Output = ()> {
        let stats = self.stats.clone();
        let signals = self.signals.clone();
        let interval = self.intervals.status;
        let holds = self.pattern_holds;
        async move {
            loop {
                for actuator in ctx.borrow().actuator_drift() {
                    warn!("SCHED: {} output disagrees with controller state", actuator);
                }
                play(&mut status, signals.next(), holds).await;
                {
                    let mut stats = stats.borrow_mut();
                    let s = &mut stats[TaskKind::Status.index()];
                    s.iterations = s.iterations.wrapping_add(1);
                }
                async_io_mini::Timer::after(interval).await;
            }
        }
    }
}

/// Count one iteration of `kind`; log and signal a failed one.
fn record(stats: &SharedStats, signals: &StatusSignals, kind: TaskKind, res: Result<()>) {
    let mut stats = stats.borrow_mut();
    let s = &mut stats[kind.index()];
    s.iterations = s.iterations.wrapping_add(1);
    if let Err(e) = res {
        s.faults = s.faults.wrapping_add(1);
        warn!("SCHED: {} iteration failed: {}", kind, e);
        signals.fault();
    }
}

/// Announce `signal` and play its blink pattern.
async fn play(status: &mut impl StatusPort, signal: StatusSignal, holds: bool) {
    status.show(signal);
    for step in pattern(signal) {
        status.set_led(step.on);
        if holds && step.hold_ms > 0 {
            async_io_mini::Timer::after(Duration::from_millis(u64::from(step.hold_ms))).await;
        }
    }
}

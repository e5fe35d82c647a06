//! Integration tests: the full node under the cooperative scheduler,
//! with millisecond intervals and a bounded run.

use std::cell::Cell;
use std::time::Duration;

use greenhouse_node::app::commands::{RemoteCommand, SyncOutcome};
use greenhouse_node::app::events::AppEvent;
use greenhouse_node::app::ports::StatusSignal;
use greenhouse_node::app::state::Actuator;
use greenhouse_node::fsm::ControlMode;
use greenhouse_node::scheduler::{Intervals, Node, NodeParts, Scheduler, TaskKind};
use greenhouse_node::sensors::SimulatedSensors;

use crate::mock_hw::{
    FixedMemory, ManualClock, MockActuators, MockLink, RecordingSink, RecordingStatus,
    ScriptedBackend, provisioned_config,
};

type TestNode = Node<
    SimulatedSensors,
    MockActuators,
    RecordingSink,
    ScriptedBackend,
    MockLink,
    FixedMemory,
    RecordingStatus,
    ManualClock,
>;

fn fast_scheduler() -> Scheduler {
    Scheduler::with_intervals(Intervals {
        sensor: Duration::from_millis(5),
        commands: Duration::from_millis(5),
        link: Duration::from_millis(10),
        memory: Duration::from_millis(20),
        status: Duration::from_millis(10),
    })
    .without_pattern_holds()
}

fn node(
    sensors: SimulatedSensors,
    backend: &ScriptedBackend,
    link: &MockLink,
    status: &RecordingStatus,
) -> TestNode {
    Node::new(
        &provisioned_config(),
        NodeParts {
            sensors,
            actuators: MockActuators::new(),
            events: RecordingSink::new(),
            uplink_backend: backend.clone(),
            poll_backend: backend.clone(),
            link: link.clone(),
            memory: FixedMemory,
            status: status.clone(),
            clock: ManualClock::at(0),
        },
    )
}

async fn for_millis(ms: u64) {
    async_io_mini::Timer::after(Duration::from_millis(ms)).await;
}

#[test]
fn boot_runs_startup_then_sync_then_tasks() {
    let backend = ScriptedBackend::new();
    backend.queue_commands(RemoteCommand {
        pump: Some(true),
        fan: None,
    });
    let link = MockLink::up();
    let status = RecordingStatus::default();
    // Wet soil: auto would keep the pump off.
    let node = node(SimulatedSensors::steady(22.0, 55.0, 85.0), &backend, &link, &status);
    let ctx = node.context();
    let sched = fast_scheduler();

    let sync = sched.run(node, for_millis(120));

    assert_eq!(sync, SyncOutcome::Applied(1));
    let shown = status.shown();
    assert_eq!(&shown[..2], &[StatusSignal::Startup, StatusSignal::LinkConnected]);

    let c = ctx.borrow();
    assert_eq!(c.controller.mode(Actuator::Pump), ControlMode::ManualOverride);
    assert!(c.controller.device().is_on(Actuator::Pump));
    // Steady sensors: exactly one telemetry push.
    assert_eq!(backend.pushed().len(), 1);
    assert!(sched.stats(TaskKind::Sensor).iterations > 1);
    assert!(sched.stats(TaskKind::Commands).iterations > 1);
    assert!(sched.stats(TaskKind::Status).iterations >= 1);
    assert!(
        c.events
            .count(|e| matches!(e, AppEvent::MemoryReclaimed { free_bytes: Some(_) }))
            >= 1
    );
}

#[test]
fn failing_backend_never_stops_the_scheduler() {
    let backend = ScriptedBackend::new();
    backend.fail_everything();
    let link = MockLink::up();
    let status = RecordingStatus::default();
    // Hot and dry: auto-control has work to do.
    let node = node(SimulatedSensors::steady(38.0, 50.0, 10.0), &backend, &link, &status);
    let ctx = node.context();
    let sched = fast_scheduler();

    let sync = sched.run(node, for_millis(120));

    assert!(matches!(sync, SyncOutcome::Failed(_)));
    let sensor = sched.stats(TaskKind::Sensor);
    let commands = sched.stats(TaskKind::Commands);
    assert!(sensor.iterations > 1);
    assert_eq!(sensor.faults, sensor.iterations);
    assert!(commands.iterations > 1);
    assert_eq!(commands.faults, commands.iterations);
    assert!(status.shown().contains(&StatusSignal::Error));
    assert!(backend.pushed().is_empty());
    // Auto-control kept running without the backend.
    let c = ctx.borrow();
    assert!(c.controller.device().is_on(Actuator::Pump));
    assert!(c.controller.device().is_on(Actuator::Fan));
}

#[test]
fn lost_link_is_restored_by_the_supervisor() {
    let backend = ScriptedBackend::new();
    let link = MockLink::down();
    // Boot connect fails, the first supervisor retry fails, then it recovers.
    link.fail_next(2);
    let status = RecordingStatus::default();
    let node = node(SimulatedSensors::steady(22.0, 55.0, 85.0), &backend, &link, &status);
    let ctx = node.context();
    let sched = fast_scheduler();

    sched.run(node, for_millis(150));

    assert!(link.reconnects() >= 3);
    let shown = status.shown();
    assert_eq!(shown[0], StatusSignal::Startup);
    // No LinkConnected at boot: the connect failed.
    assert_ne!(shown[1], StatusSignal::LinkConnected);
    assert!(shown.contains(&StatusSignal::LinkConnected));
    assert_eq!(sched.stats(TaskKind::Link).faults, 1);

    let c = ctx.borrow();
    assert_eq!(c.events.count(|e| matches!(e, AppEvent::LinkRestored)), 1);
    assert_eq!(c.events.count(|e| matches!(e, AppEvent::LinkLost)), 0);
    // Once restored, telemetry went out.
    assert_eq!(backend.pushed().len(), 1);
}

#[test]
fn pending_reconnect_does_not_stall_auto_control() {
    let backend = ScriptedBackend::new();
    // Boot connect is refused; the supervisor's attempt then takes 200 ms.
    let link = MockLink::slow(Duration::from_millis(200));
    link.fail_next(1);
    let status = RecordingStatus::default();
    let node = node(SimulatedSensors::steady(38.0, 50.0, 10.0), &backend, &link, &status);
    let ctx = node.context();
    let sched = fast_scheduler();

    let midway = Cell::new((0, 0, true));
    sched.run(node, async {
        for_millis(120).await;
        midway.set((
            sched.stats(TaskKind::Sensor).iterations,
            sched.stats(TaskKind::Link).iterations,
            link.is_up(),
        ));
        for_millis(200).await;
    });

    let (sensor_midway, link_midway, up_midway) = midway.get();
    // Still associating at 120 ms, yet the sensor task kept its cadence.
    assert!(!up_midway);
    assert_eq!(link_midway, 0);
    assert!(sensor_midway >= 10, "sensor iterations at 120 ms: {sensor_midway}");

    assert!(link.is_up());
    assert_eq!(link.reconnects(), 2);
    assert_eq!(sched.stats(TaskKind::Link).faults, 0);
    let c = ctx.borrow();
    assert!(c.controller.device().is_on(Actuator::Pump));
    assert!(c.controller.device().is_on(Actuator::Fan));
    assert_eq!(c.events.count(|e| matches!(e, AppEvent::LinkRestored)), 1);
    assert_eq!(backend.pushed().len(), 1);
}

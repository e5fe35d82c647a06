//! Integration tests: startup sync, command polling and the telemetry
//! uplink against a scripted backend.

use std::cell::RefCell;

use greenhouse_node::app::commands::{CommandPoller, RemoteCommand, SyncOutcome};
use greenhouse_node::app::events::AppEvent;
use greenhouse_node::app::service::DeviceContext;
use greenhouse_node::app::state::{Actuator, SensorReading};
use greenhouse_node::app::telemetry::{TelemetryUplink, UplinkOutcome};
use greenhouse_node::error::{Channel, Error, ProtocolFault, TransportFault};
use greenhouse_node::fsm::ControlMode;
use greenhouse_node::supervisor::LinkState;

use crate::mock_hw::{ManualClock, MockActuators, RecordingSink, ScriptedBackend, provisioned_config};

type Ctx = RefCell<DeviceContext<MockActuators, RecordingSink>>;

fn context() -> Ctx {
    RefCell::new(DeviceContext::new(
        &provisioned_config(),
        MockActuators::new(),
        RecordingSink::new(),
    ))
}

// ── Startup sync ──────────────────────────────────────────────

#[test]
fn initial_sync_arms_overrides_before_auto_control() {
    let ctx = context();
    let backend = ScriptedBackend::new();
    backend.queue_commands(RemoteCommand {
        pump: Some(true),
        fan: None,
    });
    let mut poller = CommandPoller::new(backend.clone(), LinkState::new());
    let clock = ManualClock::at(3);

    assert_eq!(poller.initial_sync(&ctx, &clock), SyncOutcome::Applied(1));

    // First sensor cycle sees wet soil but must not undo the command.
    ctx.borrow_mut().auto_cycle(&SensorReading::new(20.0, 50.0, 90.0), 4);
    let c = ctx.borrow();
    assert_eq!(c.controller.mode(Actuator::Pump), ControlMode::ManualOverride);
    assert!(c.controller.device().is_on(Actuator::Pump));
    assert_eq!(c.actuators.switches(Actuator::Pump), vec![true]);
}

#[test]
fn initial_sync_without_commands_stays_auto() {
    let ctx = context();
    let mut poller = CommandPoller::new(ScriptedBackend::new(), LinkState::new());
    assert_eq!(
        poller.initial_sync(&ctx, &ManualClock::at(0)),
        SyncOutcome::NoCommands
    );
    assert_eq!(ctx.borrow().controller.mode(Actuator::Pump), ControlMode::Auto);
}

#[test]
fn failed_initial_sync_falls_back_to_auto() {
    let ctx = context();
    let backend = ScriptedBackend::new();
    backend.queue_fetch_error(TransportFault::Dns.into());
    let mut poller = CommandPoller::new(backend, LinkState::new());
    assert_eq!(
        poller.initial_sync(&ctx, &ManualClock::at(0)),
        SyncOutcome::Failed(Error::Transport(TransportFault::Dns))
    );
    assert!(ctx.borrow().events.events.is_empty());
}

// ── Polling ───────────────────────────────────────────────────

#[test]
fn poll_applies_fields_with_fetch_time() {
    let ctx = context();
    let backend = ScriptedBackend::new();
    backend.queue_commands(RemoteCommand {
        pump: Some(true),
        fan: Some(false),
    });
    let mut poller = CommandPoller::new(backend.clone(), LinkState::new());
    let clock = ManualClock::at(42);

    assert_eq!(poller.poll(&ctx, &clock), Ok(2));
    assert_eq!(poller.poll(&ctx, &clock), Ok(0));
    assert_eq!(backend.fetches(), 2);
    assert_eq!(ctx.borrow().controller.last_command_at(), Some(42));
    let c = ctx.borrow();
    let fan = c.controller.overrides().state().entry(Actuator::Fan);
    assert!(fan.active);
    assert_eq!(fan.since, 42);
}

#[test]
fn poll_error_propagates_and_changes_nothing() {
    let ctx = context();
    let backend = ScriptedBackend::new();
    backend.queue_fetch_error(ProtocolFault::Status(500).into());
    let mut poller = CommandPoller::new(backend, LinkState::new());
    assert_eq!(
        poller.poll(&ctx, &ManualClock::at(0)),
        Err(Error::Protocol(ProtocolFault::Status(500)))
    );
    assert!(ctx.borrow().actuators.calls.is_empty());
}

#[test]
fn poll_skips_the_network_while_link_is_down() {
    let ctx = context();
    let backend = ScriptedBackend::new();
    let link = LinkState::new();
    link.set(false);
    let mut poller = CommandPoller::new(backend.clone(), link);
    assert_eq!(poller.poll(&ctx, &ManualClock::at(0)), Ok(0));
    assert_eq!(backend.fetches(), 0);
}

// ── Uplink ────────────────────────────────────────────────────

#[test]
fn uplink_sends_only_on_significant_change() {
    let ctx = context();
    let backend = ScriptedBackend::new();
    let mut uplink = TelemetryUplink::new(backend.clone(), LinkState::new());

    let first = SensorReading::new(25.0, 60.0, 75.0);
    assert!(matches!(uplink.maybe_send(&ctx, &first, 0), UplinkOutcome::Sent(_)));

    // Within the 0.5 threshold on every channel.
    let small = SensorReading::new(25.4, 60.5, 74.6);
    assert_eq!(uplink.maybe_send(&ctx, &small, 1), UplinkOutcome::Unchanged);

    // Humidity moved 0.6 against the last *sent* value.
    let moved = SensorReading::new(25.0, 60.6, 75.0);
    assert!(matches!(uplink.maybe_send(&ctx, &moved, 2), UplinkOutcome::Sent(_)));

    let pushed = backend.pushed();
    assert_eq!(pushed.len(), 2);
    assert_eq!(pushed[0].temp, Some(25.0));
    assert_eq!(pushed[1].humidity, Some(60.6));
    assert_eq!(uplink.sent_count(), 2);
}

#[test]
fn failed_push_is_retried_next_cycle() {
    let ctx = context();
    let backend = ScriptedBackend::new();
    backend.queue_push_error(TransportFault::Read.into());
    let mut uplink = TelemetryUplink::new(backend.clone(), LinkState::new());
    let reading = SensorReading::new(21.0, 50.0, 60.0);

    assert_eq!(
        uplink.maybe_send(&ctx, &reading, 0),
        UplinkOutcome::Failed(Error::Transport(TransportFault::Read))
    );
    assert_eq!(ctx.borrow().controller.device().last_sent(Channel::Temperature), None);

    // Same reading: still due because nothing was committed.
    assert!(matches!(uplink.maybe_send(&ctx, &reading, 1), UplinkOutcome::Sent(_)));
    assert_eq!(uplink.failed_count(), 1);
    let c = ctx.borrow();
    assert_eq!(c.events.count(|e| matches!(e, AppEvent::TelemetryFailed)), 1);
    assert_eq!(c.events.count(|e| matches!(e, AppEvent::TelemetrySent(_))), 1);
}

#[test]
fn uplink_defers_while_link_is_down_but_auto_control_runs() {
    let ctx = context();
    let backend = ScriptedBackend::new();
    let link = LinkState::new();
    link.set(false);
    let mut uplink = TelemetryUplink::new(backend.clone(), link.clone());
    let hot = SensorReading::new(39.0, 50.0, 60.0);

    assert_eq!(uplink.maybe_send(&ctx, &hot, 0), UplinkOutcome::Deferred);
    assert!(backend.pushed().is_empty());
    assert!(ctx.borrow().controller.device().is_on(Actuator::Fan));

    link.set(true);
    assert!(matches!(uplink.maybe_send(&ctx, &hot, 1), UplinkOutcome::Sent(_)));
}

#[test]
fn faulted_channel_is_sent_as_absent() {
    let ctx = context();
    let backend = ScriptedBackend::new();
    let mut uplink = TelemetryUplink::new(backend.clone(), LinkState::new());
    let reading = SensorReading {
        temperature: Some(22.0),
        humidity: None,
        soil_moisture: Some(50.0),
    };
    assert!(matches!(uplink.maybe_send(&ctx, &reading, 0), UplinkOutcome::Sent(_)));
    assert_eq!(backend.pushed()[0].humidity, None);
}

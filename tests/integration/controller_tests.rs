//! Integration tests: auto-control and the override lifecycle, driven
//! through the shared `DeviceContext` exactly as the scheduler does.

use greenhouse_node::app::commands::RemoteCommand;
use greenhouse_node::app::events::{AppEvent, ControlSource};
use greenhouse_node::app::ports::ActuatorPort;
use greenhouse_node::app::service::DeviceContext;
use greenhouse_node::app::state::{Actuator, SensorReading};
use greenhouse_node::fsm::ControlMode;

use crate::mock_hw::{MockActuators, RecordingSink, provisioned_config};

type Ctx = DeviceContext<MockActuators, RecordingSink>;

fn context() -> Ctx {
    DeviceContext::new(&provisioned_config(), MockActuators::new(), RecordingSink::new())
}

/// Wet soil and cool air: auto wants both actuators off.
fn calm() -> SensorReading {
    SensorReading::new(24.0, 55.0, 80.0)
}

/// Dry soil and hot air: auto wants both actuators on.
fn stressed() -> SensorReading {
    SensorReading::new(38.0, 40.0, 10.0)
}

#[test]
fn auto_control_follows_thresholds() {
    let mut ctx = context();
    ctx.auto_cycle(&stressed(), 0);
    assert!(ctx.controller.device().is_on(Actuator::Pump));
    assert!(ctx.controller.device().is_on(Actuator::Fan));

    ctx.auto_cycle(&calm(), 1);
    assert!(!ctx.controller.device().is_on(Actuator::Pump));
    assert!(!ctx.controller.device().is_on(Actuator::Fan));

    // Pump is switched before the fan within one cycle.
    assert_eq!(
        ctx.actuators.calls,
        vec![
            (Actuator::Pump, true),
            (Actuator::Fan, true),
            (Actuator::Pump, false),
            (Actuator::Fan, false),
        ]
    );
}

#[test]
fn thresholds_are_strict() {
    let mut ctx = context();
    // Exactly at the thresholds: neither actuator switches.
    ctx.auto_cycle(&SensorReading::new(36.0, 50.0, 30.0), 0);
    assert!(ctx.actuators.calls.is_empty());
}

#[test]
fn unchanged_decision_does_not_rewrite_outputs() {
    let mut ctx = context();
    for t in 0..5 {
        ctx.auto_cycle(&stressed(), t);
    }
    assert_eq!(ctx.actuators.calls.len(), 2);
}

#[test]
fn faulted_channel_skips_its_actuator() {
    let mut ctx = context();
    let reading = SensorReading {
        temperature: Some(40.0),
        humidity: Some(50.0),
        soil_moisture: None,
    };
    ctx.auto_cycle(&reading, 0);
    assert_eq!(ctx.actuators.switches(Actuator::Pump), Vec::<bool>::new());
    assert_eq!(ctx.actuators.switches(Actuator::Fan), vec![true]);
}

#[test]
fn override_holds_until_timeout_then_auto_resumes() {
    let mut ctx = context();
    let cmd = RemoteCommand {
        pump: Some(true),
        fan: None,
    };
    assert_eq!(ctx.apply_commands(&cmd, 100), 1);
    assert_eq!(ctx.controller.mode(Actuator::Pump), ControlMode::ManualOverride);
    assert_eq!(ctx.controller.mode(Actuator::Fan), ControlMode::Auto);

    // Wet soil would turn the pump off, but the override wins.
    ctx.auto_cycle(&calm(), 200);
    ctx.auto_cycle(&calm(), 400);
    assert!(ctx.controller.device().is_on(Actuator::Pump));

    // 300 s timeout: still held at exactly 300 s.
    ctx.auto_cycle(&calm(), 400);
    assert_eq!(ctx.controller.mode(Actuator::Pump), ControlMode::ManualOverride);

    // Past the window: expires and auto applies in the same cycle.
    ctx.auto_cycle(&calm(), 401);
    assert_eq!(ctx.controller.mode(Actuator::Pump), ControlMode::Auto);
    assert!(!ctx.controller.device().is_on(Actuator::Pump));

    let expired = ctx
        .events
        .count(|e| matches!(e, AppEvent::OverrideExpired { actuator: Actuator::Pump, .. }));
    assert_eq!(expired, 1);
}

#[test]
fn repeated_command_rearms_the_window() {
    let mut ctx = context();
    let cmd = RemoteCommand {
        pump: None,
        fan: Some(true),
    };
    ctx.apply_commands(&cmd, 0);
    ctx.apply_commands(&cmd, 250);
    ctx.auto_cycle(&calm(), 500);
    assert_eq!(ctx.controller.mode(Actuator::Fan), ControlMode::ManualOverride);
    assert!(ctx.controller.device().is_on(Actuator::Fan));
    // Second command matched the output: no second switch.
    assert_eq!(ctx.actuators.switches(Actuator::Fan), vec![true]);
}

#[test]
fn command_matching_current_output_still_arms_override() {
    let mut ctx = context();
    // Fan is already off; commanding "off" pins it off against hot air.
    let cmd = RemoteCommand {
        pump: None,
        fan: Some(false),
    };
    ctx.apply_commands(&cmd, 10);
    ctx.auto_cycle(&stressed(), 20);
    assert_eq!(ctx.controller.mode(Actuator::Fan), ControlMode::ManualOverride);
    assert!(!ctx.controller.device().is_on(Actuator::Fan));
    assert!(ctx.actuators.switches(Actuator::Fan).is_empty());
    assert_eq!(ctx.controller.last_command_at(), Some(10));
}

#[test]
fn dry_soil_in_mild_air_waters_without_venting() {
    let mut ctx = context();
    ctx.auto_cycle(&SensorReading::new(30.0, 50.0, 20.0), 0);
    assert!(ctx.controller.device().is_on(Actuator::Pump));
    assert!(!ctx.controller.device().is_on(Actuator::Fan));
    assert_eq!(ctx.actuators.calls, vec![(Actuator::Pump, true)]);
}

#[test]
fn remote_fan_on_lapses_after_301_seconds() {
    let mut ctx = context();
    let cmd = RemoteCommand {
        pump: None,
        fan: Some(true),
    };
    ctx.apply_commands(&cmd, 1_000);
    ctx.auto_cycle(&calm(), 1_001);
    assert!(ctx.controller.device().is_on(Actuator::Fan));
    assert!(ctx.controller.overrides().state().fan.active);

    ctx.auto_cycle(&calm(), 1_301);
    assert!(!ctx.controller.overrides().state().fan.active);
    assert!(!ctx.controller.device().is_on(Actuator::Fan));
    assert_eq!(ctx.actuators.switches(Actuator::Fan), vec![true, false]);
}

#[test]
fn remote_switch_is_attributed_to_remote() {
    let mut ctx = context();
    let cmd = RemoteCommand {
        pump: Some(true),
        fan: Some(true),
    };
    assert_eq!(ctx.apply_commands(&cmd, 5), 2);
    let remote = ctx.events.count(|e| {
        matches!(
            e,
            AppEvent::ActuatorChanged {
                source: ControlSource::Remote,
                ..
            }
        )
    });
    assert_eq!(remote, 2);
    assert_eq!(ctx.events.count(|e| matches!(e, AppEvent::CommandsReceived(_))), 1);
}

#[test]
fn empty_command_changes_nothing() {
    let mut ctx = context();
    assert_eq!(ctx.apply_commands(&RemoteCommand::default(), 5), 0);
    assert!(ctx.events.events.is_empty());
    assert_eq!(ctx.controller.last_command_at(), None);
}

#[test]
fn drift_is_reported_when_pins_disagree() {
    let mut ctx = context();
    ctx.auto_cycle(&stressed(), 0);
    assert_eq!(ctx.actuator_drift().count(), 0);
    // Something outside the controller released the pump relay.
    ctx.actuators.set_pump(false);
    assert_eq!(ctx.actuator_drift().collect::<Vec<_>>(), vec![Actuator::Pump]);
}

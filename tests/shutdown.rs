//! Shutdown guarantees
//!
//! However a run ends (interrupt, fault in a motion primitive, sensor
//! failure, broken channel) every output must end switched off, `all_off`
//! must run exactly once and the display must be cleared exactly once.
//!
//! Run with: `cargo test --test shutdown`

mod common;

use chalak::config::ChalakConfig;
use chalak::core::clock::{Clock, SimClock};
use chalak::core::driver::OutputDriver;
use chalak::core::types::ActuatorRole::{self, *};
use chalak::core::types::MovementCommand;
use chalak::devices::mock::{DisplayEvent, RecordingOutputs, ScriptedRange};
use chalak::error::{Error, Result};
use chalak::modes::{
    ControllerMode, OperatorChoice, RunOutcome, ScriptPhase, ScriptStep, autonomous_script,
};
use common::Harness;
use std::sync::Arc;
use std::time::Duration;

/// Forwards to a recorder but refuses to switch `role` on
struct StuckChannel {
    inner: RecordingOutputs,
    role: ActuatorRole,
}

impl OutputDriver for StuckChannel {
    fn init(&mut self) -> Result<()> {
        self.inner.init()
    }

    fn write_binary(&mut self, role: ActuatorRole, on: bool) -> Result<()> {
        if role == self.role && on {
            return Err(Error::Hardware(format!("{} driver not responding", role)));
        }
        self.inner.write_binary(role, on)
    }

    fn write_duty(&mut self, role: ActuatorRole, percent: f64) -> Result<()> {
        self.inner.write_duty(role, percent)
    }

    fn write_frequency(&mut self, role: ActuatorRole, hz: f64) -> Result<()> {
        self.inner.write_frequency(role, hz)
    }

    fn release(&mut self) -> Result<()> {
        self.inner.release()
    }
}

/// Forwards to a recorder; writes to `role` fail from time `from` on
struct FailsFrom {
    inner: RecordingOutputs,
    role: ActuatorRole,
    from: Duration,
    clock: Arc<SimClock>,
}

impl FailsFrom {
    fn check(&self, role: ActuatorRole) -> Result<()> {
        if role == self.role && self.clock.elapsed() >= self.from {
            return Err(Error::Hardware(format!("{} went open-circuit", role)));
        }
        Ok(())
    }
}

impl OutputDriver for FailsFrom {
    fn write_binary(&mut self, role: ActuatorRole, on: bool) -> Result<()> {
        self.check(role)?;
        self.inner.write_binary(role, on)
    }

    fn write_duty(&mut self, role: ActuatorRole, percent: f64) -> Result<()> {
        self.check(role)?;
        self.inner.write_duty(role, percent)
    }

    fn write_frequency(&mut self, role: ActuatorRole, hz: f64) -> Result<()> {
        self.check(role)?;
        self.inner.write_frequency(role, hz)
    }

    fn release(&mut self) -> Result<()> {
        self.inner.release()
    }
}

fn reactive_forward(config: &ChalakConfig) -> ControllerMode {
    ControllerMode::ReactiveAvoidance {
        initial: Some(OperatorChoice {
            command: MovementCommand::Forward(config.reactive.command_secs),
            headlights: 100.0,
        }),
        threshold_cm: config.reactive.threshold_cm,
    }
}

/// Every channel's last recorded write leaves it off
fn assert_all_outputs_off(harness: &Harness) {
    for role in ActuatorRole::ALL {
        let last = harness.writes_to(role).last().map(|(_, w)| *w);
        assert!(
            last.is_some_and(|w| !w.is_active()),
            "{} left as {:?}",
            role,
            last
        );
    }
}

#[test]
fn test_interrupt_at_any_loop_iteration() {
    let config = ChalakConfig::default();

    for iterations in 1..=6 {
        let readings: Vec<f64> = (0..iterations).map(|i| 40.0 + i as f64).collect();
        let harness = Harness::new(ScriptedRange::distances(&readings));
        harness.range.cancel_after_script(harness.cancel.clone());
        let mut lifecycle = harness.lifecycle(&config, None);

        let report = lifecycle.run(reactive_forward(&config)).unwrap();

        assert_eq!(report.outcome, RunOutcome::Interrupted);
        assert_eq!(report.stats.samples, iterations as u32);
        assert_eq!(lifecycle.rig().actuators.all_off_calls(), 1);
        assert_eq!(harness.display.clear_count(), 1);
        assert_eq!(harness.display.close_count(), 1);
        assert_eq!(harness.display.count_shown("Interrupted"), 1);
        assert_eq!(harness.outputs.releases(), 1);
        assert_all_outputs_off(&harness);

        drop(lifecycle);
        assert_eq!(harness.display.clear_count(), 1);
    }
}

#[test]
fn test_interrupt_lets_maneuver_finish() {
    let config = ChalakConfig::default();
    let harness = Harness::new(ScriptedRange::distances(&[5.0]));
    harness.range.cancel_after_script(harness.cancel.clone());
    let mut lifecycle = harness.lifecycle(&config, None);

    let report = lifecycle.run(reactive_forward(&config)).unwrap();

    // Cancelled while sampling the near reading; the maneuver still ran whole
    assert_eq!(report.outcome, RunOutcome::Interrupted);
    assert_eq!(report.stats.maneuvers, 1);
    assert_eq!(harness.display.count_shown("Turning Right"), 1);
    assert_all_outputs_off(&harness);
}

#[test]
fn test_interrupt_before_start() {
    let config = ChalakConfig::default();
    let harness = Harness::new(ScriptedRange::distances(&[]));
    harness.cancel.cancel();
    let mut lifecycle = harness.lifecycle(&config, None);

    let report = lifecycle
        .run(ControllerMode::ScriptedSequence(autonomous_script(&config.scripted).unwrap()))
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Interrupted);
    assert_eq!(harness.range.polls(), 0);
    assert_eq!(lifecycle.rig().actuators.all_off_calls(), 1);
    assert_eq!(harness.display.clear_count(), 1);
}

#[test]
fn test_fault_mid_maneuver_still_shuts_down() {
    let config = ChalakConfig::default();
    let harness = Harness::new(ScriptedRange::distances(&[50.0, 6.0, 50.0]));
    let outputs = Box::new(StuckChannel {
        inner: harness.outputs.clone(),
        role: MotorLeftBwd,
    });
    let mut lifecycle = harness.lifecycle_with(&config, outputs, None);

    let result = lifecycle.run(reactive_forward(&config));

    // Backing off needs the left wheel in reverse
    assert!(matches!(result, Err(Error::Hardware(_))));
    assert_eq!(harness.range.polls(), 2);
    assert_eq!(harness.display.count_shown("Fault"), 1);
    assert_eq!(harness.display.count_shown("Turning Right"), 0);
    assert_eq!(lifecycle.rig().actuators.all_off_calls(), 1);
    assert_eq!(harness.display.clear_count(), 1);
    assert!(lifecycle.is_shut_down());
    assert_all_outputs_off(&harness);
}

#[test]
fn test_sensor_fault_is_fatal() {
    let config = ChalakConfig::default();
    let harness = Harness::new(ScriptedRange::distances(&[50.0, 50.0]));
    harness.range.fail_next("echo line stuck high");
    let mut lifecycle = harness.lifecycle(&config, None);

    let result = lifecycle.run(reactive_forward(&config));

    assert!(matches!(result, Err(Error::Hardware(_))));
    assert_eq!(harness.range.polls(), 1);
    let notice = DisplayEvent::Show("Fault".to_string(), "Hardware fault".to_string());
    let notices = harness.display.events().into_iter().filter(|e| *e == notice);
    assert_eq!(notices.count(), 1);
    assert_eq!(lifecycle.rig().actuators.all_off_calls(), 1);
    assert_eq!(harness.display.clear_count(), 1);
}

#[test]
fn test_sensor_timeouts_are_not_faults() {
    let config = ChalakConfig::default();
    let harness = Harness::new(ScriptedRange::new([None, None, None]));
    harness.range.cancel_after_script(harness.cancel.clone());
    let mut lifecycle = harness.lifecycle(&config, None);

    let report = lifecycle.run(reactive_forward(&config)).unwrap();

    assert_eq!(report.outcome, RunOutcome::Interrupted);
    assert_eq!(report.stats.invalid_samples, 3);
    assert_eq!(harness.display.count_shown("Fault"), 0);
}

#[test]
fn test_dead_channel_does_not_block_shutdown() {
    let config = ChalakConfig::default();
    let harness = Harness::new(ScriptedRange::distances(&[50.0]));
    let mut lifecycle = harness.lifecycle(&config, None);

    // Status LED driver is dead from the start, so init itself fails
    harness.outputs.fail_role(StatusIndicator);
    let result = lifecycle.run(reactive_forward(&config));

    assert!(matches!(result, Err(Error::Hardware(_))));
    assert_eq!(harness.range.polls(), 0);
    assert_eq!(lifecycle.rig().actuators.all_off_calls(), 1);
    assert_eq!(harness.display.clear_count(), 1);
    for role in ActuatorRole::ALL.into_iter().filter(|r| *r != StatusIndicator) {
        let last = harness.writes_to(role).last().map(|(_, w)| *w);
        assert!(last.is_some_and(|w| !w.is_active()), "{} not off", role);
    }
}

#[test]
fn test_shutdown_warnings_surface_in_report() {
    let config = ChalakConfig::default();
    let harness = Harness::new(ScriptedRange::distances(&[]));
    let outputs = Box::new(FailsFrom {
        inner: harness.outputs.clone(),
        role: Buzzer,
        from: Duration::from_secs(1),
        clock: harness.clock.clone(),
    });
    let mut lifecycle = harness.lifecycle_with(&config, outputs, None);

    let hold = ScriptStep {
        phase: ScriptPhase::Pause,
        directives: Vec::new(),
        movement: None,
        settle: Duration::from_secs(1),
    };
    let report = lifecycle
        .run(ControllerMode::ScriptedSequence(vec![hold]))
        .unwrap();

    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(report.warnings.len(), 1);
    assert_eq!(report.warnings[0].role, Buzzer);
    assert_eq!(harness.outputs.releases(), 1);
    assert_eq!(harness.display.clear_count(), 1);
}

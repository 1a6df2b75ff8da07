//! Scripted sequencer: the fixed autonomous timeline
//!
//! Steps run strictly in order with no branching on sensor data. Range
//! polls are observational only: they update the display and never change
//! motion. Given fixed durations the actuator writes are fully predictable.

use super::{
    Directive, ModeController, ModeStats, RunOutcome, ScriptPhase, ScriptStep, announce_and_move,
    pulse_buzzer,
};
use crate::config::{ScriptedConfig, seconds};
use crate::core::clock::CancelToken;
use crate::core::types::{ActuatorRole, MovementCommand};
use crate::error::{Error, Result};
use crate::lifecycle::Rig;
use crate::motion::{Drive, ForwardLights};
use std::time::Duration;

/// Build the autonomous timeline from configuration
///
/// Every duration is checked here, so a bad value is rejected before the
/// robot moves rather than partway through the timeline.
pub fn autonomous_script(cfg: &ScriptedConfig) -> Result<Vec<ScriptStep>> {
    seconds("scripted.advance_secs", cfg.advance_secs)?;
    seconds("scripted.retreat_secs", cfg.retreat_secs)?;
    if !(cfg.retreat_buzz_hz > 0.0 && cfg.retreat_buzz_hz.is_finite()) {
        return Err(Error::Config(format!(
            "scripted.retreat_buzz_hz must be positive, got {}",
            cfg.retreat_buzz_hz
        )));
    }

    Ok(vec![
        ScriptStep {
            phase: ScriptPhase::Greet,
            directives: vec![Directive::Indicator(cfg.greet_indicator), Directive::show("Hello")],
            movement: None,
            settle: seconds("scripted.greet_secs", cfg.greet_secs)?,
        },
        ScriptStep {
            phase: ScriptPhase::AdvanceAndBuzz,
            directives: vec![
                Directive::Blank,
                Directive::Buzz {
                    level: cfg.advance_buzz_level,
                    frequency_hz: None,
                    duration: seconds("scripted.advance_buzz_secs", cfg.advance_buzz_secs)?,
                },
                Directive::Indicator(cfg.advance_indicator),
                Directive::Headlights(100.0),
            ],
            movement: Some(MovementCommand::Forward(cfg.advance_secs)),
            settle: Duration::ZERO,
        },
        ScriptStep {
            phase: ScriptPhase::PollDistance,
            directives: vec![Directive::PollRange {
                count: cfg.poll_count,
                interval: seconds("scripted.poll_interval_secs", cfg.poll_interval_secs)?,
            }],
            movement: None,
            settle: Duration::ZERO,
        },
        ScriptStep {
            phase: ScriptPhase::ServoSweep,
            directives: vec![Directive::Servo(cfg.servo_position)],
            movement: None,
            settle: seconds("scripted.servo_settle_secs", cfg.servo_settle_secs)?,
        },
        ScriptStep {
            phase: ScriptPhase::Pause,
            directives: vec![
                Directive::Headlights(0.0),
                Directive::Indicator(0.0),
                Directive::show("Pause"),
            ],
            movement: None,
            settle: seconds("scripted.pause_secs", cfg.pause_secs)?,
        },
        ScriptStep {
            phase: ScriptPhase::Retreat,
            directives: vec![
                Directive::Blank,
                Directive::Buzz {
                    level: cfg.retreat_buzz_level,
                    frequency_hz: Some(cfg.retreat_buzz_hz),
                    duration: seconds("scripted.retreat_buzz_secs", cfg.retreat_buzz_secs)?,
                },
                Directive::Indicator(cfg.retreat_indicator),
            ],
            movement: Some(MovementCommand::Backward(cfg.retreat_secs)),
            settle: Duration::ZERO,
        },
        ScriptStep {
            phase: ScriptPhase::Farewell,
            directives: vec![Directive::show("Goodbye"), Directive::Indicator(0.0)],
            movement: None,
            settle: seconds("scripted.farewell_secs", cfg.farewell_secs)?,
        },
    ])
}

/// Runs a list of script steps in order
pub struct ScriptedSequencer {
    steps: Vec<ScriptStep>,
    drive: Drive,
    stats: ModeStats,
}

impl ScriptedSequencer {
    /// Headlights stay under script control, so `forward` leaves them alone.
    pub fn new(steps: Vec<ScriptStep>, rig: &Rig) -> Self {
        Self {
            steps,
            drive: Drive::new(rig.clock.clone(), ForwardLights::CallerControlled),
            stats: ModeStats::default(),
        }
    }

    /// Apply one directive. Returns false if interrupted mid-poll.
    fn apply(&mut self, rig: &mut Rig, directive: &Directive, cancel: &CancelToken) -> Result<bool> {
        match directive {
            Directive::Headlights(percent) => rig.actuators.set_headlights(*percent)?,
            Directive::Indicator(percent) => rig
                .actuators
                .set_intensity(ActuatorRole::StatusIndicator, *percent)?,
            Directive::Buzz {
                level,
                frequency_hz,
                duration,
            } => {
                if let Some(hz) = frequency_hz {
                    rig.actuators.set_frequency(ActuatorRole::Buzzer, *hz)?;
                }
                pulse_buzzer(&mut rig.actuators, rig.clock.as_ref(), *level, *duration)?;
            }
            Directive::Servo(percent) => rig
                .actuators
                .set_level(ActuatorRole::SteeringServo, *percent)?,
            Directive::Show(line1, line2) => rig.display.show(line1, line2),
            Directive::Blank => rig.display.show("", ""),
            Directive::PollRange { count, interval } => {
                for i in 0..*count {
                    if cancel.is_cancelled() {
                        return Ok(false);
                    }
                    let sample = rig.range.sample()?;
                    self.stats.samples += 1;
                    if !sample.valid {
                        self.stats.invalid_samples += 1;
                    }
                    log::info!("Poll {}/{}: {}", i + 1, count, sample.display_text());
                    rig.display.show("Distance:", &sample.display_text());
                    rig.clock.sleep(*interval);
                }
            }
        }
        Ok(true)
    }
}

impl ModeController for ScriptedSequencer {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn run(&mut self, rig: &mut Rig, cancel: &CancelToken) -> Result<RunOutcome> {
        self.stats = ModeStats::default();
        let steps = self.steps.clone();

        for step in &steps {
            if cancel.is_cancelled() {
                log::info!("Interrupted before {:?}", step.phase);
                return Ok(RunOutcome::Interrupted);
            }
            log::info!("Script step: {:?}", step.phase);

            for directive in &step.directives {
                if !self.apply(rig, directive, cancel)? {
                    log::info!("Interrupted during {:?}", step.phase);
                    return Ok(RunOutcome::Interrupted);
                }
            }
            if let Some(cmd) = step.movement {
                announce_and_move(rig, &self.drive, cmd)?;
            }
            rig.clock.sleep(step.settle);
        }

        log::info!("Script complete");
        Ok(RunOutcome::Completed)
    }

    fn stats(&self) -> ModeStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_script_order() {
        let phases: Vec<ScriptPhase> = autonomous_script(&ScriptedConfig::default())
            .unwrap()
            .iter()
            .map(|s| s.phase)
            .collect();
        assert_eq!(
            phases,
            vec![
                ScriptPhase::Greet,
                ScriptPhase::AdvanceAndBuzz,
                ScriptPhase::PollDistance,
                ScriptPhase::ServoSweep,
                ScriptPhase::Pause,
                ScriptPhase::Retreat,
                ScriptPhase::Farewell,
            ]
        );
    }

    #[test]
    fn test_default_script_timing() {
        let script = autonomous_script(&ScriptedConfig::default()).unwrap();

        let poll = &script[2];
        assert_eq!(
            poll.directives,
            vec![Directive::PollRange {
                count: 4,
                interval: Duration::from_secs(1)
            }]
        );
        assert_eq!(script[1].movement, Some(MovementCommand::Forward(4.0)));
        assert_eq!(script[5].movement, Some(MovementCommand::Backward(4.0)));
        assert_eq!(script[4].settle, Duration::from_secs(4));
        assert!(script[5].directives.contains(&Directive::Buzz {
            level: 30.0,
            frequency_hz: Some(500.0),
            duration: Duration::from_secs(2),
        }));
    }

    #[test]
    fn test_bad_durations_rejected_up_front() {
        let mut cfg = ScriptedConfig::default();
        cfg.pause_secs = -4.0;
        assert!(matches!(autonomous_script(&cfg), Err(Error::Config(_))));

        let mut cfg = ScriptedConfig::default();
        cfg.retreat_secs = f64::INFINITY;
        assert!(matches!(autonomous_script(&cfg), Err(Error::Config(_))));

        let mut cfg = ScriptedConfig::default();
        cfg.retreat_buzz_hz = 0.0;
        assert!(matches!(autonomous_script(&cfg), Err(Error::Config(_))));
    }
}

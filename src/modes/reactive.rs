//! Reactive avoider: one operator-chosen move, then obstacle avoidance
//!
//! # States
//!
//! - **Init**: indicator and headlights to their starting intensity, greeting
//! - **AwaitCommand**: direction and headlight intensity from the operator;
//!   bad input shows a notice and ends the run (no retry)
//! - **ExecuteCommand**: the chosen primitive, once
//! - **AvoidanceLoop**: poll the range sensor at a fixed cadence; a valid
//!   reading below the threshold triggers the avoidance maneuver
//!   (alarm pulse, back off, turn right). Runs until interrupted.

use super::{
    ModeController, ModeStats, OperatorChoice, RunOutcome, announce_and_move, pulse_buzzer,
};
use crate::config::{ReactiveConfig, seconds};
use crate::core::clock::CancelToken;
use crate::core::types::{ActuatorRole, Direction, MovementCommand, RangeSample};
use crate::error::{Error, Result};
use crate::lifecycle::Rig;
use crate::motion::{Drive, ForwardLights};

/// Reactive obstacle-avoidance controller
pub struct ReactiveAvoider {
    initial: Option<OperatorChoice>,
    threshold_cm: f64,
    settings: ReactiveConfig,
    drive: Drive,
    stats: ModeStats,
}

impl ReactiveAvoider {
    /// Forward drives switch the headlights to full in this mode.
    pub fn new(
        initial: Option<OperatorChoice>,
        threshold_cm: f64,
        settings: ReactiveConfig,
        rig: &Rig,
    ) -> Self {
        Self {
            initial,
            threshold_cm,
            settings,
            drive: Drive::new(rig.clock.clone(), ForwardLights::Full),
            stats: ModeStats::default(),
        }
    }

    fn init(&mut self, rig: &mut Rig) -> Result<()> {
        rig.actuators
            .set_intensity(ActuatorRole::StatusIndicator, self.settings.indicator)?;
        rig.actuators
            .set_headlights(self.settings.initial_headlights)?;
        rig.display.show("Hello", "");
        rig.clock
            .sleep(seconds("reactive.greeting_secs", self.settings.greeting_secs)?);
        rig.display.show("", "");
        Ok(())
    }

    /// Ask the operator for a direction and headlight intensity
    fn await_command(&mut self, rig: &mut Rig) -> Result<OperatorChoice> {
        if let Some(choice) = self.initial {
            log::info!("Using supplied command {:?}", choice.command);
            return Ok(choice);
        }

        let input = rig
            .input
            .as_mut()
            .ok_or_else(|| Error::Input("no operator input available".to_string()))?;
        let direction: Direction = input.read_command()?.parse()?;
        let intensity = input.read_intensity()?;

        Ok(OperatorChoice {
            command: direction.command(self.settings.command_secs),
            headlights: intensity as f64,
        })
    }

    fn is_obstacle(&self, sample: &RangeSample) -> bool {
        if sample.valid {
            sample.is_nearer_than(self.threshold_cm)
        } else {
            self.settings.invalid_is_obstacle
        }
    }

    /// Alarm, back off, turn right
    fn avoid(&mut self, rig: &mut Rig) -> Result<()> {
        self.stats.maneuvers += 1;
        log::warn!("Obstacle detected, avoidance maneuver #{}", self.stats.maneuvers);

        rig.display.show("Obstacle!", "Stopping...");
        pulse_buzzer(
            &mut rig.actuators,
            rig.clock.as_ref(),
            self.settings.alarm_level,
            seconds("reactive.alarm_secs", self.settings.alarm_secs)?,
        )?;
        announce_and_move(rig, &self.drive, MovementCommand::Backward(self.settings.backoff_secs))?;
        announce_and_move(rig, &self.drive, MovementCommand::TurnRight(self.settings.turn_secs))
    }

    fn avoidance_loop(&mut self, rig: &mut Rig, cancel: &CancelToken) -> Result<RunOutcome> {
        let interval = seconds("reactive.poll_interval_secs", self.settings.poll_interval_secs)?;
        log::info!(
            "Avoidance loop: threshold {:.1} cm, polling every {:?}",
            self.threshold_cm,
            interval
        );

        loop {
            if cancel.is_cancelled() {
                log::info!("Avoidance loop interrupted after {} samples", self.stats.samples);
                return Ok(RunOutcome::Interrupted);
            }

            let sample = rig.range.sample()?;
            self.stats.samples += 1;
            if !sample.valid {
                self.stats.invalid_samples += 1;
            }
            rig.display.show("Distance:", &sample.display_text());

            if self.is_obstacle(&sample) {
                self.avoid(rig)?;
            }
            rig.clock.sleep(interval);
        }
    }
}

impl ModeController for ReactiveAvoider {
    fn name(&self) -> &'static str {
        "reactive"
    }

    fn run(&mut self, rig: &mut Rig, cancel: &CancelToken) -> Result<RunOutcome> {
        self.stats = ModeStats::default();
        self.init(rig)?;
        if cancel.is_cancelled() {
            return Ok(RunOutcome::Interrupted);
        }

        let choice = match self.await_command(rig) {
            Ok(choice) => choice,
            Err(e) if cancel.is_cancelled() => {
                log::debug!("Input abandoned on interrupt: {}", e);
                return Ok(RunOutcome::Interrupted);
            }
            Err(e) => {
                log::warn!("Rejected operator input: {}", e);
                rig.display.show("Invalid Input", "Try Again");
                rig.clock.sleep(seconds(
                    "reactive.invalid_input_hold_secs",
                    self.settings.invalid_input_hold_secs,
                )?);
                return Ok(RunOutcome::InvalidInput);
            }
        };

        log::info!(
            "Operator chose {:?} with headlights at {}%",
            choice.command,
            choice.headlights
        );
        rig.actuators.set_headlights(choice.headlights)?;
        announce_and_move(rig, &self.drive, choice.command)?;

        self.avoidance_loop(rig, cancel)
    }

    fn stats(&self) -> ModeStats {
        self.stats
    }
}

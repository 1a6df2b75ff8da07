//! Motion primitives
//!
//! Time-bounded drive actions built on the actuator interface. Each primitive
//! sets its drive channels, waits for the duration, then clears them:
//!
//! ```text
//! write drive channels ──▶ wait(duration) ──▶ clear drive channels
//! ```
//!
//! The wait always completes before the clear; that ordering is what
//! defines the distance travelled. This module is the only writer of the
//! four drive channels.
//!
//! | Primitive  | L-fwd | L-bwd | R-fwd | R-bwd |
//! |------------|-------|-------|-------|-------|
//! | forward    | on    | off   | on    | off   |
//! | backward   | off   | on    | off   | on    |
//! | turn_left  | off   | on    | on    | off   |
//! | turn_right | on    | off   | off   | on    |

use crate::actuators::ActuatorInterface;
use crate::core::clock::SharedClock;
use crate::core::types::{ActuatorRole, MovementCommand};
use crate::error::{Error, Result};
use std::time::Duration;

/// Headlight handling during `forward`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForwardLights {
    /// Leave headlights to the caller
    CallerControlled,
    /// Switch headlights to full before driving forward
    Full,
}

/// Drive-motor pattern: (left fwd, left bwd, right fwd, right bwd)
type DrivePattern = [bool; 4];

const FORWARD: DrivePattern = [true, false, true, false];
const BACKWARD: DrivePattern = [false, true, false, true];
const TURN_LEFT: DrivePattern = [false, true, true, false];
const TURN_RIGHT: DrivePattern = [true, false, false, true];
const STOPPED: DrivePattern = [false; 4];

/// Motion primitive executor
#[derive(Clone)]
pub struct Drive {
    clock: SharedClock,
    lights: ForwardLights,
}

impl Drive {
    pub fn new(clock: SharedClock, lights: ForwardLights) -> Self {
        Self { clock, lights }
    }

    /// Run one movement command to completion
    pub fn execute(&self, act: &mut ActuatorInterface, cmd: MovementCommand) -> Result<()> {
        match cmd {
            MovementCommand::Forward(s) => self.forward(act, s),
            MovementCommand::Backward(s) => self.backward(act, s),
            MovementCommand::TurnLeft(s) => self.turn_left(act, s),
            MovementCommand::TurnRight(s) => self.turn_right(act, s),
            MovementCommand::Stop(s) => {
                let hold = validate_duration(s)?;
                self.stop(act)?;
                self.clock.sleep(hold);
                Ok(())
            }
        }
    }

    /// Both motors forward for `seconds`
    pub fn forward(&self, act: &mut ActuatorInterface, seconds: f64) -> Result<()> {
        let duration = validate_duration(seconds)?;
        if self.lights == ForwardLights::Full {
            act.set_headlights(100.0)?;
        }
        self.run(act, "forward", FORWARD, duration)
    }

    /// Both motors backward for `seconds`
    pub fn backward(&self, act: &mut ActuatorInterface, seconds: f64) -> Result<()> {
        let duration = validate_duration(seconds)?;
        self.run(act, "backward", BACKWARD, duration)
    }

    /// Differential turn left for `seconds`
    pub fn turn_left(&self, act: &mut ActuatorInterface, seconds: f64) -> Result<()> {
        let duration = validate_duration(seconds)?;
        self.run(act, "turn_left", TURN_LEFT, duration)
    }

    /// Differential turn right for `seconds`
    pub fn turn_right(&self, act: &mut ActuatorInterface, seconds: f64) -> Result<()> {
        let duration = validate_duration(seconds)?;
        self.run(act, "turn_right", TURN_RIGHT, duration)
    }

    /// All four drive channels off.
    ///
    /// Every channel is attempted even if an earlier one fails; the first
    /// failure is returned.
    pub fn stop(&self, act: &mut ActuatorInterface) -> Result<()> {
        let mut first_err = None;
        for (role, on) in ActuatorRole::DRIVE.into_iter().zip(STOPPED) {
            if let Err(e) = act.set_binary(role, on) {
                log::warn!("Failed to stop {}: {}", role, e);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn run(
        &self,
        act: &mut ActuatorInterface,
        name: &str,
        pattern: DrivePattern,
        duration: Duration,
    ) -> Result<()> {
        log::debug!("Drive {} for {:?}", name, duration);

        if let Err(e) = write_pattern(act, pattern) {
            // Never leave a half-applied pattern running
            if let Err(stop_err) = self.stop(act) {
                log::error!("Drive stop after failed {} also failed: {}", name, stop_err);
            }
            return Err(e);
        }
        self.clock.sleep(duration);
        self.stop(act)
    }
}

fn write_pattern(act: &mut ActuatorInterface, pattern: DrivePattern) -> Result<()> {
    // Clear opposing channels before driving so a motor never sees
    // forward and backward at once.
    for (role, on) in ActuatorRole::DRIVE.into_iter().zip(pattern) {
        if !on {
            act.set_binary(role, false)?;
        }
    }
    for (role, on) in ActuatorRole::DRIVE.into_iter().zip(pattern) {
        if on {
            act.set_binary(role, true)?;
        }
    }
    Ok(())
}

fn validate_duration(seconds: f64) -> Result<Duration> {
    if !(seconds.is_finite() && seconds >= 0.0) {
        return Err(Error::InvalidArgument(format!(
            "motion duration must be a non-negative number of seconds, got {}",
            seconds
        )));
    }
    Duration::try_from_secs_f64(seconds).map_err(|e| {
        Error::InvalidArgument(format!("motion duration {} s out of range: {}", seconds, e))
    })
}

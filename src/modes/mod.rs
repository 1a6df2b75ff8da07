//! Mode controllers
//!
//! Two state machines drive the robot, selected once per run:
//!
//! ```text
//! ScriptedSequence:  Greet → AdvanceAndBuzz → PollDistance → ServoSweep
//!                    → Pause → Retreat → Farewell            (time-driven)
//!
//! ReactiveAvoidance: Init → AwaitCommand → ExecuteCommand
//!                    → AvoidanceLoop ⟲                       (until interrupted)
//! ```
//!
//! Controllers only touch drive channels through [`Drive`]; other channels
//! (headlights, indicator, buzzer, servo) are set directly on the
//! [`ActuatorInterface`]. Cancellation is checked at step and loop-iteration
//! boundaries, never in the middle of a primitive.

mod reactive;
mod scripted;

pub use reactive::ReactiveAvoider;
pub use scripted::{ScriptedSequencer, autonomous_script};

use crate::actuators::ActuatorInterface;
use crate::core::clock::{CancelToken, Clock};
use crate::core::types::{ActuatorRole, MovementCommand};
use crate::error::Result;
use crate::lifecycle::Rig;
use crate::motion::Drive;
use std::time::Duration;

/// Operating mode, chosen once at start
#[derive(Debug, Clone)]
pub enum ControllerMode {
    /// Fixed autonomous timeline
    ScriptedSequence(Vec<ScriptStep>),
    /// Operator-directed move followed by obstacle avoidance
    ReactiveAvoidance {
        /// Supplied up front; `None` asks the input collaborator
        initial: Option<OperatorChoice>,
        /// Valid readings strictly below this trigger the avoidance maneuver
        threshold_cm: f64,
    },
}

/// Movement and headlight intensity picked by the operator
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OperatorChoice {
    pub command: MovementCommand,
    pub headlights: f64,
}

/// States of the scripted timeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptPhase {
    Greet,
    AdvanceAndBuzz,
    PollDistance,
    ServoSweep,
    Pause,
    Retreat,
    Farewell,
}

/// Side effect applied at the start of a script step, in order
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Both headlights at this intensity (0 = off)
    Headlights(f64),
    /// Status indicator brightness
    Indicator(f64),
    /// Sound the buzzer, optionally retuning it first
    Buzz {
        level: f64,
        frequency_hz: Option<f64>,
        duration: Duration,
    },
    /// Steering servo duty cycle
    Servo(f64),
    /// Show two lines of text
    Show(String, String),
    /// Blank both display lines
    Blank,
    /// Observe the range sensor a fixed number of times
    PollRange { count: u32, interval: Duration },
}

impl Directive {
    /// Convenience for a one-line `Show`
    pub fn show(line1: &str) -> Self {
        Directive::Show(line1.to_string(), String::new())
    }
}

/// One entry of the scripted timeline
#[derive(Debug, Clone)]
pub struct ScriptStep {
    pub phase: ScriptPhase,
    pub directives: Vec<Directive>,
    pub movement: Option<MovementCommand>,
    /// Hold after directives and movement complete
    pub settle: Duration,
}

/// How a mode run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Timeline ran to the end
    Completed,
    /// Interrupt signal observed
    Interrupted,
    /// Operator input was rejected
    InvalidInput,
}

/// Counters collected during a run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ModeStats {
    pub samples: u32,
    pub invalid_samples: u32,
    pub maneuvers: u32,
}

/// A mode state machine
pub trait ModeController {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Run until completion, interruption, or fault
    fn run(&mut self, rig: &mut Rig, cancel: &CancelToken) -> Result<RunOutcome>;

    /// Counters from the last run
    fn stats(&self) -> ModeStats;
}

/// Show the announcement for `cmd` (if any), then run it
pub(crate) fn announce_and_move(rig: &mut Rig, drive: &Drive, cmd: MovementCommand) -> Result<()> {
    if let Some(text) = cmd.announcement() {
        rig.display.show(text, "");
    }
    drive.execute(&mut rig.actuators, cmd)
}

/// Sound the buzzer at `level` for `duration`, then silence it
pub(crate) fn pulse_buzzer(
    act: &mut ActuatorInterface,
    clock: &dyn Clock,
    level: f64,
    duration: Duration,
) -> Result<()> {
    act.set_level(ActuatorRole::Buzzer, level)?;
    clock.sleep(duration);
    act.set_level(ActuatorRole::Buzzer, 0.0)
}

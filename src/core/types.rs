//! Core data types for channels, range samples, and movement commands.
//!
//! Key types:
//! - [`ActuatorRole`]: the nine physical outputs, one channel each
//! - [`ChannelState`]: last value written to a channel
//! - [`RangeSample`]: one distance reading with its validity
//! - [`MovementCommand`]: one motion primitive invocation

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Lower bound of the valid distance window (exclusive), centimeters
pub const RANGE_MIN_CM: f64 = 0.5;

/// Upper bound of the valid distance window (exclusive), centimeters
pub const RANGE_MAX_CM: f64 = 400.0;

/// Physical output roles. Each role maps to exactly one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActuatorRole {
    MotorLeftFwd,
    MotorLeftBwd,
    MotorRightFwd,
    MotorRightBwd,
    HeadlightLeft,
    HeadlightRight,
    Buzzer,
    StatusIndicator,
    SteeringServo,
}

impl ActuatorRole {
    /// Every role, in the order channels are initialised and shut down.
    ///
    /// Drive channels come first so `all_off` stops the wheels before
    /// anything else.
    pub const ALL: [ActuatorRole; 9] = [
        ActuatorRole::MotorLeftFwd,
        ActuatorRole::MotorLeftBwd,
        ActuatorRole::MotorRightFwd,
        ActuatorRole::MotorRightBwd,
        ActuatorRole::HeadlightLeft,
        ActuatorRole::HeadlightRight,
        ActuatorRole::Buzzer,
        ActuatorRole::StatusIndicator,
        ActuatorRole::SteeringServo,
    ];

    /// The four drive-motor channels
    pub const DRIVE: [ActuatorRole; 4] = [
        ActuatorRole::MotorLeftFwd,
        ActuatorRole::MotorLeftBwd,
        ActuatorRole::MotorRightFwd,
        ActuatorRole::MotorRightBwd,
    ];

    /// Both headlight channels
    pub const HEADLIGHTS: [ActuatorRole; 2] =
        [ActuatorRole::HeadlightLeft, ActuatorRole::HeadlightRight];

    /// Config/log name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MotorLeftFwd => "motor_left_fwd",
            Self::MotorLeftBwd => "motor_left_bwd",
            Self::MotorRightFwd => "motor_right_fwd",
            Self::MotorRightBwd => "motor_right_bwd",
            Self::HeadlightLeft => "headlight_left",
            Self::HeadlightRight => "headlight_right",
            Self::Buzzer => "buzzer",
            Self::StatusIndicator => "status_indicator",
            Self::SteeringServo => "steering_servo",
        }
    }

    /// True for the four drive-motor channels
    pub fn is_drive(&self) -> bool {
        Self::DRIVE.contains(self)
    }
}

impl fmt::Display for ActuatorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output kind of a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChannelKind {
    /// On/off output
    Binary,
    /// Duty-cycle output (0-100 %)
    Proportional,
}

/// Last value written to a channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ChannelState {
    Binary {
        on: bool,
    },
    Proportional {
        /// Duty cycle percent, always within [0, 100]
        level: f64,
        /// PWM frequency in Hz, if one has been applied
        frequency: Option<f64>,
    },
}

impl ChannelState {
    /// Safe-off state for a channel of `kind`
    pub fn off(kind: ChannelKind) -> Self {
        match kind {
            ChannelKind::Binary => ChannelState::Binary { on: false },
            ChannelKind::Proportional => ChannelState::Proportional {
                level: 0.0,
                frequency: None,
            },
        }
    }

    /// Kind of channel this state belongs to
    pub fn kind(&self) -> ChannelKind {
        match self {
            ChannelState::Binary { .. } => ChannelKind::Binary,
            ChannelState::Proportional { .. } => ChannelKind::Proportional,
        }
    }

    /// True when the output is idle (off / zero duty)
    pub fn is_off(&self) -> bool {
        match *self {
            ChannelState::Binary { on } => !on,
            ChannelState::Proportional { level, .. } => level == 0.0,
        }
    }
}

/// One distance measurement.
///
/// Created fresh on each poll and never mutated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RangeSample {
    /// Distance in centimeters, rounded to one decimal place
    pub distance_cm: f64,
    /// True when the distance lies strictly inside (0.5, 400.0)
    pub valid: bool,
}

impl RangeSample {
    /// Build a sample from a raw distance, rounding and classifying it
    pub fn from_cm(raw_cm: f64) -> Self {
        let distance_cm = (raw_cm * 10.0).round() / 10.0;
        let valid = distance_cm > RANGE_MIN_CM && distance_cm < RANGE_MAX_CM;
        Self { distance_cm, valid }
    }

    /// Sample for a measurement that produced no echo in time
    pub fn no_echo() -> Self {
        Self {
            distance_cm: 0.0,
            valid: false,
        }
    }

    /// True for a valid reading strictly closer than `threshold_cm`
    pub fn is_nearer_than(&self, threshold_cm: f64) -> bool {
        self.valid && self.distance_cm < threshold_cm
    }

    /// Second display line for this sample
    pub fn display_text(&self) -> String {
        if self.valid {
            format!("{:.1} cm", self.distance_cm)
        } else {
            "Out of Range".to_string()
        }
    }
}

/// Movement direction accepted from the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
    Left,
    Right,
}

impl Direction {
    /// Movement command for this direction lasting `seconds`
    pub fn command(self, seconds: f64) -> MovementCommand {
        match self {
            Direction::Forward => MovementCommand::Forward(seconds),
            Direction::Backward => MovementCommand::Backward(seconds),
            Direction::Left => MovementCommand::TurnLeft(seconds),
            Direction::Right => MovementCommand::TurnRight(seconds),
        }
    }
}

impl FromStr for Direction {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "forward" => Ok(Direction::Forward),
            "backward" => Ok(Direction::Backward),
            "left" => Ok(Direction::Left),
            "right" => Ok(Direction::Right),
            other => Err(crate::Error::Input(format!("unknown direction '{}'", other))),
        }
    }
}

/// One motion primitive invocation; the payload is the duration in seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MovementCommand {
    Forward(f64),
    Backward(f64),
    TurnLeft(f64),
    TurnRight(f64),
    /// Stop the drive, then hold for the duration
    Stop(f64),
}

impl MovementCommand {
    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        match *self {
            Self::Forward(s)
            | Self::Backward(s)
            | Self::TurnLeft(s)
            | Self::TurnRight(s)
            | Self::Stop(s) => s,
        }
    }

    /// Display text announcing the movement, if any
    pub fn announcement(&self) -> Option<&'static str> {
        match self {
            Self::Forward(_) => Some("Moving Forward"),
            Self::Backward(_) => Some("Moving Backward"),
            Self::TurnLeft(_) => Some("Turning Left"),
            Self::TurnRight(_) => Some("Turning Right"),
            Self::Stop(_) => None,
        }
    }
}

//! Hardware seams implemented by device backends

use crate::core::types::ActuatorRole;
use crate::error::Result;
use std::time::Duration;

/// Raw output hardware for all actuator channels.
///
/// Implementations perform the write and nothing else; kind checks,
/// clamping, and state bookkeeping live in
/// [`ActuatorInterface`](crate::actuators::ActuatorInterface).
pub trait OutputDriver: Send {
    /// Claim the hardware (export lines, open devices)
    fn init(&mut self) -> Result<()> {
        Ok(())
    }

    /// Drive a binary channel high or low
    fn write_binary(&mut self, role: ActuatorRole, on: bool) -> Result<()>;

    /// Set a proportional channel's duty cycle, percent in [0, 100]
    fn write_duty(&mut self, role: ActuatorRole, percent: f64) -> Result<()>;

    /// Set a proportional channel's PWM frequency in Hz
    fn write_frequency(&mut self, role: ActuatorRole, hz: f64) -> Result<()>;

    /// Release the hardware. Called once, after every channel is off.
    fn release(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Single-beam distance sensor
pub trait DistanceSensor: Send {
    /// Measure once and return the raw distance in centimeters.
    ///
    /// Must return [`Error::SensorTimeout`](crate::Error::SensorTimeout)
    /// if no echo arrives within `timeout`.
    fn measure_cm(&mut self, timeout: Duration) -> Result<f64>;
}

/// Two-line text display.
///
/// Best effort: implementations log their own failures and never
/// report them to the control layer.
pub trait Display: Send {
    /// Show two lines of text
    fn show(&mut self, line1: &str, line2: &str);

    /// Blank the display
    fn clear(&mut self);

    /// Release display resources
    fn close(&mut self) {}
}

/// Operator input for the reactive mode
pub trait CommandInput: Send {
    /// Read the movement direction text
    fn read_command(&mut self) -> Result<String>;

    /// Read the headlight intensity
    fn read_intensity(&mut self) -> Result<i64>;
}

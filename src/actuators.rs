//! Actuator interface
//!
//! Owns every actuator channel and its last-written state. All writes to the
//! output hardware go through here:
//!
//! - binary channels: [`ActuatorInterface::set_binary`]
//! - proportional channels: [`ActuatorInterface::set_level`] (clamped, never fails on range)
//! - buzzer tone: [`ActuatorInterface::set_frequency`] (only while silent)
//! - shutdown: [`ActuatorInterface::all_off`] (never fails)

use crate::config::ChannelMap;
use crate::core::driver::OutputDriver;
use crate::core::types::{ActuatorRole, ChannelKind, ChannelState};
use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// A channel that could not be driven to its safe-off state
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelWarning {
    pub role: ActuatorRole,
    pub message: String,
}

impl fmt::Display for ChannelWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.role, self.message)
    }
}

/// Owned handle to all actuator channels
pub struct ActuatorInterface {
    driver: Box<dyn OutputDriver>,
    channels: BTreeMap<ActuatorRole, ChannelState>,
    frequencies: BTreeMap<ActuatorRole, f64>,
    all_off_calls: u32,
}

impl ActuatorInterface {
    /// Create the interface over `driver` with the kinds from `map`.
    ///
    /// Roles are fixed here and never reassigned.
    pub fn new(driver: Box<dyn OutputDriver>, map: &ChannelMap) -> Self {
        let mut channels = BTreeMap::new();
        let mut frequencies = BTreeMap::new();
        for role in ActuatorRole::ALL {
            let spec = map.get(role);
            channels.insert(role, ChannelState::off(spec.kind));
            if spec.kind == ChannelKind::Proportional
                && let Some(hz) = spec.frequency_hz
            {
                frequencies.insert(role, hz);
            }
        }

        Self {
            driver,
            channels,
            frequencies,
            all_off_calls: 0,
        }
    }

    /// Claim the hardware, apply configured frequencies, and start every
    /// channel in its safe-off state
    pub fn init(&mut self) -> Result<()> {
        log::info!("Initializing {} actuator channels", self.channels.len());
        self.driver.init()?;

        let frequencies: Vec<(ActuatorRole, f64)> =
            self.frequencies.iter().map(|(r, hz)| (*r, *hz)).collect();
        for (role, hz) in frequencies {
            self.apply_frequency(role, hz)?;
        }

        for role in ActuatorRole::ALL {
            match self.kind(role) {
                ChannelKind::Binary => self.set_binary(role, false)?,
                ChannelKind::Proportional => self.set_level(role, 0.0)?,
            }
        }
        Ok(())
    }

    /// Kind of the channel bound to `role`
    pub fn kind(&self, role: ActuatorRole) -> ChannelKind {
        self.state(role).kind()
    }

    /// Last successfully written state of `role`
    pub fn state(&self, role: ActuatorRole) -> ChannelState {
        // Every role is inserted in `new`
        self.channels[&role]
    }

    /// True if a binary channel is on or a proportional channel is above zero
    pub fn is_active(&self, role: ActuatorRole) -> bool {
        !self.state(role).is_off()
    }

    /// Duty cycle of a proportional channel (0 for binary channels)
    pub fn level(&self, role: ActuatorRole) -> f64 {
        match self.state(role) {
            ChannelState::Proportional { level, .. } => level,
            ChannelState::Binary { .. } => 0.0,
        }
    }

    /// Number of times [`all_off`](Self::all_off) has run
    pub fn all_off_calls(&self) -> u32 {
        self.all_off_calls
    }

    /// Set a binary channel
    pub fn set_binary(&mut self, role: ActuatorRole, on: bool) -> Result<()> {
        if self.kind(role) != ChannelKind::Binary {
            return Err(Error::Channel {
                role,
                detail: "is not a binary channel",
            });
        }

        log::trace!("{} <- {}", role, if on { "on" } else { "off" });
        self.driver.write_binary(role, on)?;
        self.channels.insert(role, ChannelState::Binary { on });
        Ok(())
    }

    /// Set a proportional channel's duty cycle, clamping into [0, 100]
    pub fn set_level(&mut self, role: ActuatorRole, percent: f64) -> Result<()> {
        let frequency = match self.state(role) {
            ChannelState::Proportional { frequency, .. } => frequency,
            ChannelState::Binary { .. } => {
                return Err(Error::Channel {
                    role,
                    detail: "is not a proportional channel",
                });
            }
        };

        let level = clamp_percent(percent);
        if level != percent {
            log::debug!("{} level {} clamped to {}", role, percent, level);
        }

        log::trace!("{} <- {:.1}%", role, level);
        self.driver.write_duty(role, level)?;
        self.channels
            .insert(role, ChannelState::Proportional { level, frequency });
        Ok(())
    }

    /// Change the buzzer tone. Only allowed while the buzzer is silent.
    pub fn set_frequency(&mut self, role: ActuatorRole, hz: f64) -> Result<()> {
        if role != ActuatorRole::Buzzer {
            return Err(Error::Channel {
                role,
                detail: "does not support frequency changes",
            });
        }
        if !(hz > 0.0 && hz.is_finite()) {
            return Err(Error::InvalidArgument(format!(
                "frequency must be positive, got {}",
                hz
            )));
        }
        if self.is_active(role) {
            return Err(Error::InvalidState(format!(
                "{} frequency change while output is active ({:.1}%)",
                role,
                self.level(role)
            )));
        }

        self.apply_frequency(role, hz)
    }

    /// Drive a channel by intensity percent regardless of its kind.
    ///
    /// Binary channels turn on for any positive intensity.
    pub fn set_intensity(&mut self, role: ActuatorRole, percent: f64) -> Result<()> {
        match self.kind(role) {
            ChannelKind::Binary => self.set_binary(role, percent > 0.0),
            ChannelKind::Proportional => self.set_level(role, percent),
        }
    }

    /// Set both headlights to the same intensity
    pub fn set_headlights(&mut self, percent: f64) -> Result<()> {
        for role in ActuatorRole::HEADLIGHTS {
            self.set_intensity(role, percent)?;
        }
        Ok(())
    }

    /// Drive every channel to its safe-off state.
    ///
    /// Each channel is attempted independently; failures are collected
    /// and returned, never raised.
    pub fn all_off(&mut self) -> Vec<ChannelWarning> {
        self.all_off_calls += 1;
        let mut warnings = Vec::new();

        for role in ActuatorRole::ALL {
            let result = match self.kind(role) {
                ChannelKind::Binary => self.set_binary(role, false),
                ChannelKind::Proportional => self.set_level(role, 0.0),
            };
            if let Err(e) = result {
                log::warn!("Failed to switch off {}: {}", role, e);
                warnings.push(ChannelWarning {
                    role,
                    message: e.to_string(),
                });
            }
        }

        if warnings.is_empty() {
            log::debug!("All actuator channels off");
        }
        warnings
    }

    /// Release the output hardware. Channels should already be off.
    pub fn release(&mut self) -> Result<()> {
        self.driver.release()
    }

    fn apply_frequency(&mut self, role: ActuatorRole, hz: f64) -> Result<()> {
        let level = self.level(role);
        log::trace!("{} <- {:.1} Hz", role, hz);
        self.driver.write_frequency(role, hz)?;
        self.channels.insert(
            role,
            ChannelState::Proportional {
                level,
                frequency: Some(hz),
            },
        );
        Ok(())
    }
}

/// Clamp a duty-cycle percent into [0, 100]; NaN reads as 0
fn clamp_percent(percent: f64) -> f64 {
    if percent.is_nan() {
        0.0
    } else {
        percent.clamp(0.0, 100.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::mock::RecordingOutputs;

    fn interface() -> (ActuatorInterface, RecordingOutputs) {
        let outputs = RecordingOutputs::unclocked();
        let actuators = ActuatorInterface::new(Box::new(outputs.clone()), &ChannelMap::default());
        (actuators, outputs)
    }

    #[test]
    fn test_set_level_clamps() {
        let (mut act, _) = interface();

        act.set_level(ActuatorRole::StatusIndicator, 150.0).unwrap();
        assert_eq!(act.level(ActuatorRole::StatusIndicator), 100.0);

        act.set_level(ActuatorRole::StatusIndicator, -20.0).unwrap();
        assert_eq!(act.level(ActuatorRole::StatusIndicator), 0.0);

        act.set_level(ActuatorRole::StatusIndicator, f64::NAN).unwrap();
        assert_eq!(act.level(ActuatorRole::StatusIndicator), 0.0);

        act.set_level(ActuatorRole::StatusIndicator, 42.5).unwrap();
        assert_eq!(act.level(ActuatorRole::StatusIndicator), 42.5);
    }

    #[test]
    fn test_kind_mismatch_is_channel_error() {
        let (mut act, outputs) = interface();

        assert!(matches!(
            act.set_binary(ActuatorRole::Buzzer, true),
            Err(Error::Channel { role: ActuatorRole::Buzzer, .. })
        ));
        assert!(matches!(
            act.set_level(ActuatorRole::MotorLeftFwd, 50.0),
            Err(Error::Channel { role: ActuatorRole::MotorLeftFwd, .. })
        ));
        assert!(outputs.trace().is_empty());
    }

    #[test]
    fn test_frequency_only_on_buzzer() {
        let (mut act, _) = interface();
        assert!(matches!(
            act.set_frequency(ActuatorRole::StatusIndicator, 200.0),
            Err(Error::Channel { .. })
        ));
        assert!(act.set_frequency(ActuatorRole::Buzzer, 500.0).is_ok());
        assert_eq!(
            act.state(ActuatorRole::Buzzer),
            ChannelState::Proportional {
                level: 0.0,
                frequency: Some(500.0)
            }
        );
    }

    #[test]
    fn test_frequency_change_while_sounding_rejected() {
        let (mut act, outputs) = interface();
        act.set_level(ActuatorRole::Buzzer, 50.0).unwrap();
        let writes_before = outputs.trace().len();

        assert!(matches!(
            act.set_frequency(ActuatorRole::Buzzer, 500.0),
            Err(Error::InvalidState(_))
        ));
        assert_eq!(outputs.trace().len(), writes_before);

        act.set_level(ActuatorRole::Buzzer, 0.0).unwrap();
        assert!(act.set_frequency(ActuatorRole::Buzzer, 500.0).is_ok());
    }

    #[test]
    fn test_level_keeps_frequency() {
        let (mut act, _) = interface();
        act.init().unwrap();
        act.set_level(ActuatorRole::Buzzer, 30.0).unwrap();
        assert_eq!(
            act.state(ActuatorRole::Buzzer),
            ChannelState::Proportional {
                level: 30.0,
                frequency: Some(1000.0)
            }
        );
    }

    #[test]
    fn test_all_off_idempotent() {
        let (mut act, _) = interface();
        act.init().unwrap();
        act.set_binary(ActuatorRole::MotorLeftFwd, true).unwrap();
        act.set_level(ActuatorRole::HeadlightLeft, 70.0).unwrap();
        act.set_level(ActuatorRole::SteeringServo, 7.5).unwrap();

        assert!(act.all_off().is_empty());
        let once: Vec<ChannelState> = ActuatorRole::ALL.iter().map(|r| act.state(*r)).collect();
        assert!(act.all_off().is_empty());
        let twice: Vec<ChannelState> = ActuatorRole::ALL.iter().map(|r| act.state(*r)).collect();

        assert_eq!(once, twice);
        assert!(ActuatorRole::ALL.iter().all(|r| !act.is_active(*r)));
        assert_eq!(act.all_off_calls(), 2);
    }

    #[test]
    fn test_all_off_continues_past_failures() {
        let (mut act, outputs) = interface();
        act.set_binary(ActuatorRole::MotorRightFwd, true).unwrap();
        act.set_level(ActuatorRole::HeadlightRight, 80.0).unwrap();
        outputs.fail_role(ActuatorRole::HeadlightLeft);

        let warnings = act.all_off();

        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].role, ActuatorRole::HeadlightLeft);
        // Channels after the failing one were still switched off
        assert!(!act.is_active(ActuatorRole::HeadlightRight));
        assert!(!act.is_active(ActuatorRole::MotorRightFwd));
    }

    #[test]
    fn test_set_intensity_on_binary_headlights() {
        let mut map = ChannelMap::default();
        map.headlight_left.kind = ChannelKind::Binary;
        map.headlight_right.kind = ChannelKind::Binary;
        let outputs = RecordingOutputs::unclocked();
        let mut act = ActuatorInterface::new(Box::new(outputs), &map);

        act.set_headlights(35.0).unwrap();
        assert_eq!(
            act.state(ActuatorRole::HeadlightLeft),
            ChannelState::Binary { on: true }
        );
        act.set_headlights(0.0).unwrap();
        assert!(!act.is_active(ActuatorRole::HeadlightRight));
    }
}

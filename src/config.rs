//! Configuration for Chalak
//!
//! Loaded from a TOML file. Every parameter has a default matching the
//! reference robot wiring, so an empty file (or no file) is a valid
//! configuration.
//!
//! # Configuration Hierarchy
//!
//! ```text
//! ChalakConfig
//! ├── DeviceConfig       # backend type, sysfs root
//! ├── ChannelMap         # one ChannelSpec per actuator role
//! ├── SensorConfig       # ultrasonic trigger/echo lines, echo window
//! ├── ScriptedConfig     # autonomous timeline durations and levels
//! ├── ReactiveConfig     # obstacle threshold, cadence, maneuver timing
//! ├── LifecycleConfig    # servo centre, cleanup hold
//! └── LoggingConfig
//! ```
//!
//! Example (`chalak.toml`):
//!
//! ```toml
//! [device]
//! type = "sysfs"
//!
//! [channels.headlight_left]
//! kind = "proportional"
//! gpio = 12
//! pwm = { chip = 0, channel = 0 }
//! frequency_hz = 100.0
//!
//! [reactive]
//! threshold_cm = 15.0
//! ```

use crate::core::types::{ActuatorRole, ChannelKind};
use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ChalakConfig {
    pub device: DeviceConfig,
    pub channels: ChannelMap,
    pub sensor: SensorConfig,
    pub scripted: ScriptedConfig,
    pub reactive: ReactiveConfig,
    pub lifecycle: LifecycleConfig,
    pub logging: LoggingConfig,
}

impl ChalakConfig {
    /// Load and validate configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: ChalakConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Check cross-field constraints serde cannot express
    pub fn validate(&self) -> Result<()> {
        for role in ActuatorRole::DRIVE {
            if self.channels.get(role).kind != ChannelKind::Binary {
                return Err(Error::Config(format!("{} must be a binary channel", role)));
            }
        }
        for role in [ActuatorRole::Buzzer, ActuatorRole::SteeringServo] {
            if self.channels.get(role).kind != ChannelKind::Proportional {
                return Err(Error::Config(format!(
                    "{} must be a proportional channel",
                    role
                )));
            }
        }
        for role in ActuatorRole::ALL {
            if let Some(hz) = self.channels.get(role).frequency_hz
                && !(hz > 0.0 && hz.is_finite())
            {
                return Err(Error::Config(format!(
                    "{} frequency must be positive, got {}",
                    role, hz
                )));
            }
        }
        for role in ActuatorRole::ALL {
            let spec = self.channels.get(role);
            if spec.kind == ChannelKind::Proportional && spec.frequency_hz.is_none() {
                return Err(Error::Config(format!(
                    "{} is proportional but has no frequency_hz",
                    role
                )));
            }
        }
        let buzz_hz = self.scripted.retreat_buzz_hz;
        if !(buzz_hz > 0.0 && buzz_hz.is_finite()) {
            return Err(Error::Config(format!(
                "scripted.retreat_buzz_hz must be positive, got {}",
                buzz_hz
            )));
        }
        if !(self.reactive.threshold_cm > 0.0) {
            return Err(Error::Config(format!(
                "reactive.threshold_cm must be positive, got {}",
                self.reactive.threshold_cm
            )));
        }
        if self.sensor.echo_timeout_ms == 0 {
            return Err(Error::Config("sensor.echo_timeout_ms must be non-zero".into()));
        }

        let durations = [
            ("scripted.greet_secs", self.scripted.greet_secs),
            ("scripted.advance_buzz_secs", self.scripted.advance_buzz_secs),
            ("scripted.advance_secs", self.scripted.advance_secs),
            ("scripted.poll_interval_secs", self.scripted.poll_interval_secs),
            ("scripted.servo_settle_secs", self.scripted.servo_settle_secs),
            ("scripted.pause_secs", self.scripted.pause_secs),
            ("scripted.retreat_buzz_secs", self.scripted.retreat_buzz_secs),
            ("scripted.retreat_secs", self.scripted.retreat_secs),
            ("scripted.farewell_secs", self.scripted.farewell_secs),
            ("reactive.poll_interval_secs", self.reactive.poll_interval_secs),
            ("reactive.command_secs", self.reactive.command_secs),
            ("reactive.alarm_secs", self.reactive.alarm_secs),
            ("reactive.backoff_secs", self.reactive.backoff_secs),
            ("reactive.turn_secs", self.reactive.turn_secs),
            ("reactive.invalid_input_hold_secs", self.reactive.invalid_input_hold_secs),
            ("reactive.greeting_secs", self.reactive.greeting_secs),
            ("lifecycle.cleanup_secs", self.lifecycle.cleanup_secs),
        ];
        for (name, secs) in durations {
            seconds(name, secs)?;
        }
        Ok(())
    }
}

/// Convert a configured number of seconds into a [`Duration`]
pub fn seconds(name: &str, secs: f64) -> Result<Duration> {
    if !(secs.is_finite() && secs >= 0.0) {
        return Err(Error::Config(format!(
            "{} must be a non-negative number of seconds, got {}",
            name, secs
        )));
    }
    Duration::try_from_secs_f64(secs)
        .map_err(|e| Error::Config(format!("{} out of range ({}): {}", name, secs, e)))
}

// ============================================================================
// Device
// ============================================================================

/// Output/sensor backend selection
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Backend: "mock" or "sysfs"
    #[serde(rename = "type")]
    pub device_type: String,
    /// Human-readable robot name
    pub name: String,
    /// Root of the sysfs tree (overridable for testing)
    pub sysfs_root: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_type: "mock".to_string(),
            name: "Chalak".to_string(),
            sysfs_root: "/sys".to_string(),
        }
    }
}

// ============================================================================
// Channels
// ============================================================================

/// PWM line on a sysfs pwmchip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct PwmLine {
    pub chip: u32,
    pub channel: u32,
}

/// Wiring of a single actuator channel
#[derive(Debug, Clone, Deserialize)]
pub struct ChannelSpec {
    pub kind: ChannelKind,
    /// BCM GPIO line
    pub gpio: u32,
    /// Hardware PWM line, required for proportional channels on sysfs
    #[serde(default)]
    pub pwm: Option<PwmLine>,
    /// PWM frequency applied at init
    #[serde(default)]
    pub frequency_hz: Option<f64>,
}

impl ChannelSpec {
    fn binary(gpio: u32) -> Self {
        Self {
            kind: ChannelKind::Binary,
            gpio,
            pwm: None,
            frequency_hz: None,
        }
    }

    fn proportional(gpio: u32, frequency_hz: f64) -> Self {
        Self {
            kind: ChannelKind::Proportional,
            gpio,
            pwm: None,
            frequency_hz: Some(frequency_hz),
        }
    }
}

/// Channel-to-role mapping. One field per role.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChannelMap {
    pub motor_left_fwd: ChannelSpec,
    pub motor_left_bwd: ChannelSpec,
    pub motor_right_fwd: ChannelSpec,
    pub motor_right_bwd: ChannelSpec,
    pub headlight_left: ChannelSpec,
    pub headlight_right: ChannelSpec,
    pub buzzer: ChannelSpec,
    pub status_indicator: ChannelSpec,
    pub steering_servo: ChannelSpec,
}

impl ChannelMap {
    /// Wiring for `role`
    pub fn get(&self, role: ActuatorRole) -> &ChannelSpec {
        match role {
            ActuatorRole::MotorLeftFwd => &self.motor_left_fwd,
            ActuatorRole::MotorLeftBwd => &self.motor_left_bwd,
            ActuatorRole::MotorRightFwd => &self.motor_right_fwd,
            ActuatorRole::MotorRightBwd => &self.motor_right_bwd,
            ActuatorRole::HeadlightLeft => &self.headlight_left,
            ActuatorRole::HeadlightRight => &self.headlight_right,
            ActuatorRole::Buzzer => &self.buzzer,
            ActuatorRole::StatusIndicator => &self.status_indicator,
            ActuatorRole::SteeringServo => &self.steering_servo,
        }
    }
}

impl Default for ChannelMap {
    fn default() -> Self {
        Self {
            motor_left_fwd: ChannelSpec::binary(5),
            motor_left_bwd: ChannelSpec::binary(0),
            motor_right_fwd: ChannelSpec::binary(7),
            motor_right_bwd: ChannelSpec::binary(6),
            headlight_left: ChannelSpec::proportional(12, 100.0),
            headlight_right: ChannelSpec::proportional(26, 100.0),
            buzzer: ChannelSpec::proportional(16, 1000.0),
            status_indicator: ChannelSpec::proportional(19, 500.0),
            steering_servo: ChannelSpec::proportional(21, 50.0),
        }
    }
}

// ============================================================================
// Sensor
// ============================================================================

/// Ultrasonic range sensor wiring
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    pub trigger_gpio: u32,
    pub echo_gpio: u32,
    /// Maximum echo window in milliseconds
    pub echo_timeout_ms: u64,
}

impl SensorConfig {
    pub fn echo_timeout(&self) -> Duration {
        Duration::from_millis(self.echo_timeout_ms)
    }
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            trigger_gpio: 23,
            echo_gpio: 24,
            echo_timeout_ms: 40,
        }
    }
}

// ============================================================================
// Modes
// ============================================================================

/// Scripted (autonomous) timeline parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScriptedConfig {
    pub greet_secs: f64,
    pub greet_indicator: f64,
    pub advance_buzz_secs: f64,
    pub advance_buzz_level: f64,
    pub advance_indicator: f64,
    pub advance_secs: f64,
    pub poll_count: u32,
    pub poll_interval_secs: f64,
    /// Servo duty after the distance polls
    pub servo_position: f64,
    pub servo_settle_secs: f64,
    pub pause_secs: f64,
    pub retreat_buzz_hz: f64,
    pub retreat_buzz_level: f64,
    pub retreat_buzz_secs: f64,
    pub retreat_indicator: f64,
    pub retreat_secs: f64,
    pub farewell_secs: f64,
}

impl Default for ScriptedConfig {
    fn default() -> Self {
        Self {
            greet_secs: 2.0,
            greet_indicator: 40.0,
            advance_buzz_secs: 2.0,
            advance_buzz_level: 50.0,
            advance_indicator: 80.0,
            advance_secs: 4.0,
            poll_count: 4,
            poll_interval_secs: 1.0,
            servo_position: 5.0,
            servo_settle_secs: 1.0,
            pause_secs: 4.0,
            retreat_buzz_hz: 500.0,
            retreat_buzz_level: 30.0,
            retreat_buzz_secs: 2.0,
            retreat_indicator: 60.0,
            retreat_secs: 4.0,
            farewell_secs: 2.0,
        }
    }
}

/// Reactive avoidance parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReactiveConfig {
    /// Valid readings strictly below this distance trigger the maneuver
    pub threshold_cm: f64,
    pub poll_interval_secs: f64,
    /// "Hello" greeting hold
    pub greeting_secs: f64,
    /// Duration of the operator's initial movement
    pub command_secs: f64,
    pub indicator: f64,
    /// Headlight intensity before the operator picks one
    pub initial_headlights: f64,
    pub alarm_level: f64,
    pub alarm_secs: f64,
    pub backoff_secs: f64,
    pub turn_secs: f64,
    /// How long the invalid-input notice stays up
    pub invalid_input_hold_secs: f64,
    /// Treat an invalid sample as an obstacle
    pub invalid_is_obstacle: bool,
}

impl Default for ReactiveConfig {
    fn default() -> Self {
        Self {
            threshold_cm: 10.0,
            poll_interval_secs: 0.5,
            greeting_secs: 2.0,
            command_secs: 2.0,
            indicator: 40.0,
            initial_headlights: 0.0,
            alarm_level: 50.0,
            alarm_secs: 1.0,
            backoff_secs: 1.0,
            turn_secs: 1.0,
            invalid_input_hold_secs: 2.0,
            invalid_is_obstacle: false,
        }
    }
}

/// Startup and shutdown parameters
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Servo duty at startup
    pub servo_center: f64,
    /// "Cleaning up..." hold before the final clear
    pub cleanup_secs: f64,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            servo_center: 7.5,
            cleanup_secs: 2.0,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

//! Device implementations
//!
//! - [`mock`]: recording/scripted devices for hardware-free runs and tests
//! - [`sysfs`]: Linux GPIO and PWM through sysfs, HC-SR04 ultrasonic ranging
//! - [`console`]: terminal display and stdin operator input

pub mod console;
pub mod mock;
pub mod sysfs;

use crate::config::ChalakConfig;
use crate::core::clock::SharedClock;
use crate::core::driver::{DistanceSensor, OutputDriver};
use crate::error::{Error, Result};

/// Output and range hardware for one robot
pub struct DeviceSet {
    pub outputs: Box<dyn OutputDriver>,
    pub sensor: Box<dyn DistanceSensor>,
}

/// Create the output and range devices selected by configuration
pub fn create_devices(config: &ChalakConfig, clock: SharedClock) -> Result<DeviceSet> {
    match config.device.device_type.as_str() {
        "mock" => {
            log::info!("Using mock devices (no hardware will move)");
            Ok(DeviceSet {
                outputs: Box::new(mock::RecordingOutputs::new(clock)),
                // Nothing in front of a bench robot
                sensor: Box::new(mock::ScriptedRange::new([])),
            })
        }
        "sysfs" => {
            let root = &config.device.sysfs_root;
            log::info!("Using sysfs devices under {}", root);
            Ok(DeviceSet {
                outputs: Box::new(sysfs::SysfsOutputs::new(root, &config.channels)?),
                sensor: Box::new(sysfs::HcSr04::new(root, &config.sensor)),
            })
        }
        other => Err(Error::Config(format!("unknown device type '{}'", other))),
    }
}

/// Parse a headlight intensity typed by the operator
pub fn parse_intensity(text: &str) -> Result<i64> {
    let trimmed = text.trim();
    trimmed
        .parse::<i64>()
        .map_err(|_| Error::Input(format!("'{}' is not a whole number", trimmed)))
}

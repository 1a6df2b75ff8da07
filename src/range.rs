//! Range sensor interface
//!
//! Wraps a [`DistanceSensor`] and turns each raw measurement into a fresh
//! [`RangeSample`]. An echo timeout is a normal condition near the range
//! limits and becomes an invalid sample; any other sensor fault propagates.

use crate::core::driver::DistanceSensor;
use crate::core::types::RangeSample;
use crate::error::{Error, Result};
use std::time::Duration;

/// Owned handle to the range sensor
pub struct RangeFinder {
    sensor: Box<dyn DistanceSensor>,
    echo_timeout: Duration,
    timeouts: u64,
}

impl RangeFinder {
    /// Create a range finder bounded by `echo_timeout` per measurement
    pub fn new(sensor: Box<dyn DistanceSensor>, echo_timeout: Duration) -> Self {
        Self {
            sensor,
            echo_timeout,
            timeouts: 0,
        }
    }

    /// Take one measurement
    pub fn sample(&mut self) -> Result<RangeSample> {
        match self.sensor.measure_cm(self.echo_timeout) {
            Ok(raw_cm) => {
                let sample = RangeSample::from_cm(raw_cm);
                log::debug!(
                    "Range: {:.1} cm ({})",
                    sample.distance_cm,
                    if sample.valid { "valid" } else { "out of range" }
                );
                Ok(sample)
            }
            Err(Error::SensorTimeout(after)) => {
                self.timeouts += 1;
                log::debug!("Range: no echo within {:?}", after);
                Ok(RangeSample::no_echo())
            }
            Err(e) => Err(e),
        }
    }

    /// Number of measurements that ended in an echo timeout
    pub fn timeouts(&self) -> u64 {
        self.timeouts
    }
}

//! HC-SR04 ultrasonic ranging over two GPIO lines
//!
//! ```text
//! trigger ─┐10µs┌──────────────────────────
//!          └────┘
//! echo     ───────────┐  echo width  ┌─────
//!                     └──────────────┘
//! distance = echo width × 343 m/s ÷ 2
//! ```

use super::gpio::{Direction, GpioLine};
use crate::config::SensorConfig;
use crate::core::driver::DistanceSensor;
use crate::error::{Error, Result};
use std::path::Path;
use std::time::{Duration, Instant};

/// Speed of sound in cm/s at room temperature
const SPEED_OF_SOUND_CM_S: f64 = 34_300.0;

const TRIGGER_PULSE: Duration = Duration::from_micros(10);

/// HC-SR04 sensor on sysfs GPIO
pub struct HcSr04 {
    trigger: GpioLine,
    echo: GpioLine,
    exported: bool,
}

impl HcSr04 {
    pub fn new<P: AsRef<Path>>(sysfs_root: P, config: &SensorConfig) -> Self {
        let root = sysfs_root.as_ref();
        Self {
            trigger: GpioLine::new(root, config.trigger_gpio),
            echo: GpioLine::new(root, config.echo_gpio),
            exported: false,
        }
    }

    fn ensure_exported(&mut self) -> Result<()> {
        if !self.exported {
            self.trigger.export(Direction::Out)?;
            self.echo.export(Direction::In)?;
            self.trigger.write(false)?;
            self.exported = true;
        }
        Ok(())
    }

    /// Spin until the echo line reads `level`; returns when it did
    fn wait_for(&self, level: bool, deadline: Instant, timeout: Duration) -> Result<Instant> {
        loop {
            if self.echo.read()? == level {
                return Ok(Instant::now());
            }
            if Instant::now() >= deadline {
                return Err(Error::SensorTimeout(timeout));
            }
        }
    }
}

impl DistanceSensor for HcSr04 {
    fn measure_cm(&mut self, timeout: Duration) -> Result<f64> {
        self.ensure_exported()?;

        self.trigger.write(true)?;
        std::thread::sleep(TRIGGER_PULSE);
        self.trigger.write(false)?;

        let deadline = Instant::now() + timeout;
        let rise = self.wait_for(true, deadline, timeout)?;
        let fall = self.wait_for(false, deadline, timeout)?;

        Ok(echo_to_cm(fall.duration_since(rise)))
    }
}

/// Convert an echo pulse width to a one-way distance
fn echo_to_cm(echo: Duration) -> f64 {
    echo.as_secs_f64() * SPEED_OF_SOUND_CM_S / 2.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_echo_to_cm() {
        // 1 ms round trip is about 17 cm
        assert_relative_eq!(echo_to_cm(Duration::from_millis(1)), 17.15, epsilon = 1e-9);
        assert_relative_eq!(echo_to_cm(Duration::ZERO), 0.0);
    }

    #[test]
    fn test_missing_echo_times_out() {
        let dir = tempfile::tempdir().unwrap();
        for line in [23, 24] {
            let line_dir = dir.path().join(format!("class/gpio/gpio{}", line));
            std::fs::create_dir_all(&line_dir).unwrap();
            std::fs::write(line_dir.join("value"), "0").unwrap();
        }

        let mut sensor = HcSr04::new(dir.path(), &SensorConfig::default());
        let result = sensor.measure_cm(Duration::from_millis(5));

        assert!(matches!(result, Err(Error::SensorTimeout(_))));
        let direction =
            std::fs::read_to_string(dir.path().join("class/gpio/gpio24/direction")).unwrap();
        assert_eq!(direction, "in");
    }
}

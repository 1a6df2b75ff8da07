//! PWM channel through `/sys/class/pwm`

use super::gpio::write_attr;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

const NANOS_PER_SEC: f64 = 1_000_000_000.0;

/// One exported PWM channel
#[derive(Debug)]
pub struct PwmChannel {
    chip_dir: PathBuf,
    channel: u32,
    frequency_hz: f64,
    period_ns: u64,
    duty_percent: f64,
}

impl PwmChannel {
    pub fn new(sysfs_root: &Path, chip: u32, channel: u32, frequency_hz: f64) -> Self {
        Self {
            chip_dir: sysfs_root.join(format!("class/pwm/pwmchip{}", chip)),
            channel,
            frequency_hz,
            period_ns: 0,
            duty_percent: 0.0,
        }
    }

    fn channel_dir(&self) -> PathBuf {
        self.chip_dir.join(format!("pwm{}", self.channel))
    }

    /// Export the channel if needed
    pub fn export(&self) -> Result<()> {
        if !self.channel_dir().exists() {
            log::debug!(
                "Exporting PWM {} channel {}",
                self.chip_dir.display(),
                self.channel
            );
            write_attr(&self.chip_dir.join("export"), &self.channel.to_string())?;
        }
        Ok(())
    }

    /// Export, program the period at zero duty, then enable.
    ///
    /// The kernel refuses to enable a channel whose period is still 0.
    pub fn claim(&mut self) -> Result<()> {
        self.export()?;
        self.set_frequency(self.frequency_hz)?;
        self.enable(true)
    }

    pub fn enable(&self, on: bool) -> Result<()> {
        write_attr(&self.channel_dir().join("enable"), if on { "1" } else { "0" })
    }

    /// Change the period. Duty is zeroed first so it never exceeds the period.
    pub fn set_frequency(&mut self, hz: f64) -> Result<()> {
        if !(hz > 0.0 && hz.is_finite()) {
            return Err(Error::Hardware(format!("invalid PWM frequency {} Hz", hz)));
        }
        let period_ns = (NANOS_PER_SEC / hz).round() as u64;
        write_attr(&self.channel_dir().join("duty_cycle"), "0")?;
        write_attr(&self.channel_dir().join("period"), &period_ns.to_string())?;
        self.period_ns = period_ns;
        self.frequency_hz = hz;
        self.set_duty(self.duty_percent)
    }

    /// Duty cycle as percent of the current period
    pub fn set_duty(&mut self, percent: f64) -> Result<()> {
        if self.period_ns == 0 {
            return Err(Error::Hardware(format!(
                "{} has no period set",
                self.channel_dir().display()
            )));
        }
        let duty_ns = (self.period_ns as f64 * percent / 100.0).round() as u64;
        write_attr(&self.channel_dir().join("duty_cycle"), &duty_ns.to_string())?;
        self.duty_percent = percent;
        Ok(())
    }

    pub fn unexport(&self) -> Result<()> {
        if self.channel_dir().exists() {
            write_attr(&self.chip_dir.join("unexport"), &self.channel.to_string())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn exported(dir: &Path) -> PwmChannel {
        fs::create_dir_all(dir.join("class/pwm/pwmchip0/pwm0")).unwrap();
        PwmChannel::new(dir, 0, 0, 1000.0)
    }

    #[test]
    fn test_duty_without_period_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut channel = exported(dir.path());

        assert!(matches!(channel.set_duty(50.0), Err(Error::Hardware(_))));
        assert!(!dir.path().join("class/pwm/pwmchip0/pwm0/duty_cycle").exists());
    }

    #[test]
    fn test_claim_programs_period_before_use() {
        let dir = tempfile::tempdir().unwrap();
        let mut channel = exported(dir.path());
        channel.claim().unwrap();
        channel.set_duty(25.0).unwrap();

        let read = |attr: &str| {
            fs::read_to_string(dir.path().join("class/pwm/pwmchip0/pwm0").join(attr)).unwrap()
        };
        assert_eq!(read("period"), "1000000");
        assert_eq!(read("enable"), "1");
        assert_eq!(read("duty_cycle"), "250000");
    }
}

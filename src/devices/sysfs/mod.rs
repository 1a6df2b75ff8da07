//! Linux sysfs output driver and range sensor
//!
//! Binary channels are GPIO lines under `/sys/class/gpio`; proportional
//! channels are hardware PWM channels under `/sys/class/pwm`. Every line is
//! exported on `init` and unexported on `release`.

mod gpio;
mod hcsr04;
mod pwm;

pub use hcsr04::HcSr04;

use crate::config::ChannelMap;
use crate::core::driver::OutputDriver;
use crate::core::types::{ActuatorRole, ChannelKind};
use crate::error::{Error, Result};
use gpio::{Direction, GpioLine};
use pwm::PwmChannel;
use std::collections::BTreeMap;
use std::path::Path;

enum SysfsOutput {
    Gpio(GpioLine),
    Pwm(PwmChannel),
}

/// Output driver over sysfs GPIO and PWM
pub struct SysfsOutputs {
    outputs: BTreeMap<ActuatorRole, SysfsOutput>,
}

impl SysfsOutputs {
    /// Map every role to its sysfs line. Proportional roles need a `pwm`
    /// line and a frequency.
    pub fn new<P: AsRef<Path>>(sysfs_root: P, map: &ChannelMap) -> Result<Self> {
        let root = sysfs_root.as_ref();
        let mut outputs = BTreeMap::new();

        for role in ActuatorRole::ALL {
            let spec = map.get(role);
            let output = match spec.kind {
                ChannelKind::Binary => SysfsOutput::Gpio(GpioLine::new(root, spec.gpio)),
                ChannelKind::Proportional => {
                    let line = spec.pwm.ok_or_else(|| {
                        Error::Config(format!(
                            "{} is proportional but has no pwm line configured",
                            role
                        ))
                    })?;
                    let hz = spec.frequency_hz.ok_or_else(|| {
                        Error::Config(format!("{} is proportional but has no frequency_hz", role))
                    })?;
                    SysfsOutput::Pwm(PwmChannel::new(root, line.chip, line.channel, hz))
                }
            };
            outputs.insert(role, output);
        }

        Ok(Self { outputs })
    }

    fn output(&mut self, role: ActuatorRole) -> Result<&mut SysfsOutput> {
        self.outputs
            .get_mut(&role)
            .ok_or_else(|| Error::Hardware(format!("{} has no sysfs line", role)))
    }
}

impl OutputDriver for SysfsOutputs {
    fn init(&mut self) -> Result<()> {
        for (role, output) in &mut self.outputs {
            log::debug!("Claiming sysfs line for {}", role);
            match output {
                SysfsOutput::Gpio(line) => line.export(Direction::Out)?,
                SysfsOutput::Pwm(channel) => channel.claim()?,
            }
        }
        Ok(())
    }

    fn write_binary(&mut self, role: ActuatorRole, on: bool) -> Result<()> {
        match self.output(role)? {
            SysfsOutput::Gpio(line) => line.write(on),
            SysfsOutput::Pwm(_) => Err(Error::Hardware(format!("{} is wired to PWM", role))),
        }
    }

    fn write_duty(&mut self, role: ActuatorRole, percent: f64) -> Result<()> {
        match self.output(role)? {
            SysfsOutput::Pwm(channel) => channel.set_duty(percent),
            SysfsOutput::Gpio(_) => Err(Error::Hardware(format!("{} is wired to GPIO", role))),
        }
    }

    fn write_frequency(&mut self, role: ActuatorRole, hz: f64) -> Result<()> {
        match self.output(role)? {
            SysfsOutput::Pwm(channel) => channel.set_frequency(hz),
            SysfsOutput::Gpio(_) => Err(Error::Hardware(format!("{} is wired to GPIO", role))),
        }
    }

    fn release(&mut self) -> Result<()> {
        let mut first_err = None;
        for (role, output) in &self.outputs {
            let result = match output {
                SysfsOutput::Gpio(line) => line.unexport(),
                SysfsOutput::Pwm(channel) => channel.enable(false).and_then(|_| channel.unexport()),
            };
            if let Err(e) = result {
                log::warn!("Failed to release {}: {}", role, e);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

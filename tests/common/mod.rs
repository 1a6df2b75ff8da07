//! Shared harness: a rig of mock devices on virtual time

#![allow(dead_code)]

use chalak::config::ChalakConfig;
use chalak::core::clock::{CancelToken, SharedClock, SimClock};
use chalak::core::driver::{CommandInput, OutputDriver};
use chalak::core::types::ActuatorRole;
use chalak::devices::DeviceSet;
use chalak::devices::mock::{OutputWrite, RecordingDisplay, RecordingOutputs, ScriptedRange};
use chalak::lifecycle::{Lifecycle, Rig};
use std::sync::Arc;
use std::time::Duration;

/// Inspection handles kept by a test after the rig is built
pub struct Harness {
    pub clock: Arc<SimClock>,
    pub outputs: RecordingOutputs,
    pub range: ScriptedRange,
    pub display: RecordingDisplay,
    pub cancel: CancelToken,
}

impl Harness {
    pub fn new(range: ScriptedRange) -> Self {
        let clock = Arc::new(SimClock::new());
        Self {
            outputs: RecordingOutputs::new(clock.clone()),
            clock,
            range,
            display: RecordingDisplay::new(),
            cancel: CancelToken::new(),
        }
    }

    /// Lifecycle over the recording outputs
    pub fn lifecycle(
        &self,
        config: &ChalakConfig,
        input: Option<Box<dyn CommandInput>>,
    ) -> Lifecycle {
        self.lifecycle_with(config, Box::new(self.outputs.clone()), input)
    }

    /// Lifecycle over a caller-supplied output driver
    pub fn lifecycle_with(
        &self,
        config: &ChalakConfig,
        outputs: Box<dyn OutputDriver>,
        input: Option<Box<dyn CommandInput>>,
    ) -> Lifecycle {
        let clock: SharedClock = self.clock.clone();
        let devices = DeviceSet {
            outputs,
            sensor: Box::new(self.range.clone()),
        };
        let rig = Rig::from_devices(config, devices, Box::new(self.display.clone()), input, clock);
        Lifecycle::new(rig, config, self.cancel.clone())
    }

    /// (seconds, role, write) tuples of the recorded trace
    pub fn trace(&self) -> Vec<(f64, ActuatorRole, OutputWrite)> {
        self.outputs
            .trace()
            .into_iter()
            .map(|e| (e.at.as_secs_f64(), e.role, e.write))
            .collect()
    }

    /// Writes to `role` as (seconds, write)
    pub fn writes_to(&self, role: ActuatorRole) -> Vec<(f64, OutputWrite)> {
        self.outputs
            .writes_to(role)
            .into_iter()
            .map(|e| (e.at.as_secs_f64(), e.write))
            .collect()
    }

    pub fn now(&self) -> Duration {
        use chalak::core::clock::Clock;
        self.clock.elapsed()
    }
}

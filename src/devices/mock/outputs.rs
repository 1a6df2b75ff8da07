//! Recording output driver

use crate::core::clock::SharedClock;
use crate::core::driver::OutputDriver;
use crate::core::types::ActuatorRole;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

/// Value written to a channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputWrite {
    Binary(bool),
    Duty(f64),
    Frequency(f64),
}

impl OutputWrite {
    /// Whether this write leaves the channel energized
    pub fn is_active(&self) -> bool {
        match self {
            OutputWrite::Binary(on) => *on,
            OutputWrite::Duty(percent) => *percent > 0.0,
            OutputWrite::Frequency(_) => false,
        }
    }
}

/// One recorded write: (channel, value, time offset)
#[derive(Debug, Clone, PartialEq)]
pub struct TraceEntry {
    pub at: Duration,
    pub role: ActuatorRole,
    pub write: OutputWrite,
}

#[derive(Default)]
struct RecorderState {
    trace: Vec<TraceEntry>,
    failing: HashSet<ActuatorRole>,
    inits: u32,
    releases: u32,
}

/// Output driver that records every successful write
#[derive(Clone)]
pub struct RecordingOutputs {
    clock: Option<SharedClock>,
    state: Arc<Mutex<RecorderState>>,
}

impl RecordingOutputs {
    /// Recorder stamping writes with `clock`
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock: Some(clock),
            state: Arc::new(Mutex::new(RecorderState::default())),
        }
    }

    /// Recorder stamping every write at zero
    pub fn unclocked() -> Self {
        Self {
            clock: None,
            state: Arc::new(Mutex::new(RecorderState::default())),
        }
    }

    /// Snapshot of all writes so far
    pub fn trace(&self) -> Vec<TraceEntry> {
        self.state.lock().trace.clone()
    }

    /// Writes to a single role
    pub fn writes_to(&self, role: ActuatorRole) -> Vec<TraceEntry> {
        self.state
            .lock()
            .trace
            .iter()
            .filter(|e| e.role == role)
            .cloned()
            .collect()
    }

    /// Make every subsequent write to `role` fail
    pub fn fail_role(&self, role: ActuatorRole) {
        self.state.lock().failing.insert(role);
    }

    /// Undo [`fail_role`](Self::fail_role)
    pub fn heal_role(&self, role: ActuatorRole) {
        self.state.lock().failing.remove(&role);
    }

    /// Number of `init` calls
    pub fn inits(&self) -> u32 {
        self.state.lock().inits
    }

    /// Number of `release` calls
    pub fn releases(&self) -> u32 {
        self.state.lock().releases
    }

    fn record(&self, role: ActuatorRole, write: OutputWrite) -> Result<()> {
        let at = self
            .clock
            .as_ref()
            .map(|c| c.elapsed())
            .unwrap_or_default();
        let mut state = self.state.lock();
        if state.failing.contains(&role) {
            return Err(Error::Hardware(format!("injected fault on {}", role)));
        }
        state.trace.push(TraceEntry { at, role, write });
        Ok(())
    }
}

impl OutputDriver for RecordingOutputs {
    fn init(&mut self) -> Result<()> {
        self.state.lock().inits += 1;
        Ok(())
    }

    fn write_binary(&mut self, role: ActuatorRole, on: bool) -> Result<()> {
        self.record(role, OutputWrite::Binary(on))
    }

    fn write_duty(&mut self, role: ActuatorRole, percent: f64) -> Result<()> {
        self.record(role, OutputWrite::Duty(percent))
    }

    fn write_frequency(&mut self, role: ActuatorRole, hz: f64) -> Result<()> {
        self.record(role, OutputWrite::Frequency(hz))
    }

    fn release(&mut self) -> Result<()> {
        self.state.lock().releases += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::{Clock, SimClock};

    #[test]
    fn test_writes_are_timestamped() {
        let clock = Arc::new(SimClock::new());
        let mut outputs = RecordingOutputs::new(clock.clone());
        let inspect = outputs.clone();

        outputs.write_binary(ActuatorRole::MotorLeftFwd, true).unwrap();
        clock.sleep(Duration::from_secs(3));
        outputs.write_duty(ActuatorRole::Buzzer, 50.0).unwrap();

        let trace = inspect.trace();
        assert_eq!(trace.len(), 2);
        assert_eq!(trace[0].at, Duration::ZERO);
        assert_eq!(trace[1].at, Duration::from_secs(3));
        assert_eq!(trace[1].write, OutputWrite::Duty(50.0));
    }

    #[test]
    fn test_injected_fault_is_not_recorded() {
        let mut outputs = RecordingOutputs::unclocked();
        outputs.fail_role(ActuatorRole::Buzzer);

        assert!(outputs.write_duty(ActuatorRole::Buzzer, 10.0).is_err());
        assert!(outputs.trace().is_empty());

        outputs.heal_role(ActuatorRole::Buzzer);
        assert!(outputs.write_duty(ActuatorRole::Buzzer, 10.0).is_ok());
        assert_eq!(outputs.writes_to(ActuatorRole::Buzzer).len(), 1);
    }
}

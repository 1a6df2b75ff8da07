//! Scripted range sensor

use crate::core::clock::CancelToken;
use crate::core::driver::DistanceSensor;
use crate::error::{Error, Result};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

struct ScriptState {
    readings: VecDeque<Option<f64>>,
    fault: Option<String>,
    cancel_when_done: Option<CancelToken>,
    polls: u64,
}

/// Range sensor replaying a fixed list of readings.
///
/// `Some(cm)` is returned as a measurement, `None` as an echo timeout.
/// Once the script is used up every poll times out.
#[derive(Clone)]
pub struct ScriptedRange {
    state: Arc<Mutex<ScriptState>>,
}

impl ScriptedRange {
    pub fn new<I: IntoIterator<Item = Option<f64>>>(readings: I) -> Self {
        Self {
            state: Arc::new(Mutex::new(ScriptState {
                readings: readings.into_iter().collect(),
                fault: None,
                cancel_when_done: None,
                polls: 0,
            })),
        }
    }

    /// Script of valid-looking distances only
    pub fn distances(readings: &[f64]) -> Self {
        Self::new(readings.iter().copied().map(Some))
    }

    /// Append a reading
    pub fn push(&self, reading: Option<f64>) {
        self.state.lock().readings.push_back(reading);
    }

    /// Fail the next poll with a hardware fault
    pub fn fail_next(&self, message: &str) {
        self.state.lock().fault = Some(message.to_string());
    }

    /// Trip `token` right after the last scripted reading is handed out
    pub fn cancel_after_script(&self, token: CancelToken) {
        self.state.lock().cancel_when_done = Some(token);
    }

    /// Number of polls so far
    pub fn polls(&self) -> u64 {
        self.state.lock().polls
    }
}

impl DistanceSensor for ScriptedRange {
    fn measure_cm(&mut self, timeout: Duration) -> Result<f64> {
        let mut state = self.state.lock();
        state.polls += 1;

        if let Some(message) = state.fault.take() {
            return Err(Error::Hardware(message));
        }

        let reading = state.readings.pop_front();
        if state.readings.is_empty()
            && let Some(token) = &state.cancel_when_done
        {
            token.cancel();
        }

        match reading.flatten() {
            Some(cm) => Ok(cm),
            None => Err(Error::SensorTimeout(timeout)),
        }
    }
}

//! Recording display

use crate::core::driver::Display;
use parking_lot::Mutex;
use std::sync::Arc;

/// One call made on the display
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayEvent {
    Show(String, String),
    Clear,
    Close,
}

/// Display that records every call
#[derive(Clone, Default)]
pub struct RecordingDisplay {
    events: Arc<Mutex<Vec<DisplayEvent>>>,
}

impl RecordingDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// All calls so far
    pub fn events(&self) -> Vec<DisplayEvent> {
        self.events.lock().clone()
    }

    /// First lines of every `show`, in order
    pub fn headlines(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                DisplayEvent::Show(line1, _) => Some(line1.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of `show` calls whose first line is `line1`
    pub fn count_shown(&self, line1: &str) -> usize {
        self.headlines().iter().filter(|l| *l == line1).count()
    }

    pub fn clear_count(&self) -> usize {
        self.count(&DisplayEvent::Clear)
    }

    pub fn close_count(&self) -> usize {
        self.count(&DisplayEvent::Close)
    }

    fn count(&self, event: &DisplayEvent) -> usize {
        self.events.lock().iter().filter(|e| *e == event).count()
    }
}

impl Display for RecordingDisplay {
    fn show(&mut self, line1: &str, line2: &str) {
        self.events
            .lock()
            .push(DisplayEvent::Show(line1.to_string(), line2.to_string()));
    }

    fn clear(&mut self) {
        self.events.lock().push(DisplayEvent::Clear);
    }

    fn close(&mut self) {
        self.events.lock().push(DisplayEvent::Close);
    }
}

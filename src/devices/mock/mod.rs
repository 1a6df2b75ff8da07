//! Mock devices for hardware-free runs and tests
//!
//! | Component | Mock | Inspection |
//! |-----------|------|------------|
//! | Actuator outputs | [`RecordingOutputs`] | timestamped write trace, fault injection |
//! | Range sensor | [`ScriptedRange`] | queue of readings, `None` = no echo |
//! | Display | [`RecordingDisplay`] | every show/clear/close |
//!
//! Every mock is a cheap clonable handle over shared state, so a test can
//! keep one clone for inspection after moving another into the rig.

mod display;
mod outputs;
mod range;

pub use display::{DisplayEvent, RecordingDisplay};
pub use outputs::{OutputWrite, RecordingOutputs, TraceEntry};
pub use range::ScriptedRange;

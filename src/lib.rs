//! Chalak - motion and sensing controller for a small wheeled robot
//!
//! A differential-drive robot with headlights, a buzzer, a status indicator,
//! a steering servo and an ultrasonic range sensor. Two operating modes:
//!
//! - **Scripted**: a fixed, time-driven timeline (greet, advance, poll,
//!   sweep, pause, retreat, farewell)
//! - **Reactive**: one operator-chosen move, then obstacle avoidance until
//!   interrupted
//!
//! Every run goes through [`lifecycle::Lifecycle`], which guarantees that all
//! outputs end switched off however the run ends.

pub mod actuators;
pub mod config;
pub mod core;
pub mod devices;
pub mod error;
pub mod lifecycle;
pub mod modes;
pub mod motion;
pub mod range;

// Re-export commonly used types
pub use config::ChalakConfig;
pub use error::{Error, Result};
pub use lifecycle::{Lifecycle, Rig, RunReport};
pub use modes::{ControllerMode, OperatorChoice, RunOutcome};

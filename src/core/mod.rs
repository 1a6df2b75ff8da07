//! Core abstractions shared by the control layer and device backends.
//!
//! - [`types`]: channel roles, samples, and movement commands
//! - [`driver`]: traits to implement for new hardware
//! - [`clock`]: time source and interrupt signal

pub mod clock;
pub mod driver;
pub mod types;

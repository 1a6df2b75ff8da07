//! Lifecycle manager
//!
//! Owns the hardware rig for one run and guarantees the safe shutdown
//! sequence on every exit path:
//!
//! ```text
//! init ──▶ mode.run() ──┬── Completed ─────────┐
//!                       ├── Interrupted (notice)├──▶ shutdown ──▶ report
//!                       ├── InvalidInput ───────┤
//!                       └── fault (notice) ─────┘──▶ shutdown ──▶ Err
//! ```
//!
//! Shutdown stops the drive, forces the headlights off, calls
//! [`ActuatorInterface::all_off`] exactly once, releases the outputs and
//! clears/closes the display. If the manager is dropped without having shut
//! down (e.g. unwinding from a panic), `Drop` runs the same sequence.

use crate::actuators::{ActuatorInterface, ChannelWarning};
use crate::config::{ChalakConfig, LifecycleConfig, ReactiveConfig, seconds};
use crate::core::clock::{CancelToken, SharedClock};
use crate::core::driver::{CommandInput, Display};
use crate::core::types::ActuatorRole;
use crate::devices::DeviceSet;
use crate::error::{Error, Result};
use crate::modes::{
    ControllerMode, ModeController, ModeStats, ReactiveAvoider, RunOutcome, ScriptedSequencer,
};
use crate::motion::{Drive, ForwardLights};
use crate::range::RangeFinder;

/// Everything a mode controller drives during a run
pub struct Rig {
    pub actuators: ActuatorInterface,
    pub range: RangeFinder,
    pub display: Box<dyn Display>,
    /// Operator input, only needed when reactive mode prompts
    pub input: Option<Box<dyn CommandInput>>,
    pub clock: SharedClock,
}

impl Rig {
    pub fn new(
        actuators: ActuatorInterface,
        range: RangeFinder,
        display: Box<dyn Display>,
        input: Option<Box<dyn CommandInput>>,
        clock: SharedClock,
    ) -> Self {
        Self {
            actuators,
            range,
            display,
            input,
            clock,
        }
    }

    /// Assemble a rig from the devices chosen by configuration
    pub fn from_devices(
        config: &ChalakConfig,
        devices: DeviceSet,
        display: Box<dyn Display>,
        input: Option<Box<dyn CommandInput>>,
        clock: SharedClock,
    ) -> Self {
        let actuators = ActuatorInterface::new(devices.outputs, &config.channels);
        let range = RangeFinder::new(devices.sensor, config.sensor.echo_timeout());
        Self::new(actuators, range, display, input, clock)
    }
}

/// Summary of a finished (non-faulted) run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub outcome: RunOutcome,
    pub stats: ModeStats,
    /// Channels that could not be switched off during shutdown
    pub warnings: Vec<ChannelWarning>,
}

/// Runs one controller mode with guaranteed actuator-safe shutdown
pub struct Lifecycle {
    rig: Rig,
    settings: LifecycleConfig,
    reactive: ReactiveConfig,
    cancel: CancelToken,
    shut_down: bool,
}

impl Lifecycle {
    pub fn new(rig: Rig, config: &ChalakConfig, cancel: CancelToken) -> Self {
        Self {
            rig,
            settings: config.lifecycle.clone(),
            reactive: config.reactive.clone(),
            cancel,
            shut_down: false,
        }
    }

    pub fn rig(&self) -> &Rig {
        &self.rig
    }

    pub fn rig_mut(&mut self) -> &mut Rig {
        &mut self.rig
    }

    /// Whether the shutdown sequence has run
    pub fn is_shut_down(&self) -> bool {
        self.shut_down
    }

    /// Initialize, run `mode`, then shut down.
    ///
    /// Faults are reported on the display and returned after shutdown has
    /// completed. A rig can only be run once.
    pub fn run(&mut self, mode: ControllerMode) -> Result<RunReport> {
        if self.shut_down {
            return Err(Error::InvalidState("rig has already been shut down".into()));
        }

        let mut controller: Box<dyn ModeController> = match mode {
            ControllerMode::ScriptedSequence(steps) => {
                Box::new(ScriptedSequencer::new(steps, &self.rig))
            }
            ControllerMode::ReactiveAvoidance {
                initial,
                threshold_cm,
            } => Box::new(ReactiveAvoider::new(
                initial,
                threshold_cm,
                self.reactive.clone(),
                &self.rig,
            )),
        };
        log::info!("Starting {} mode", controller.name());

        let result = self
            .init()
            .and_then(|_| controller.run(&mut self.rig, &self.cancel));
        let stats = controller.stats();

        match &result {
            Ok(RunOutcome::Interrupted) => {
                log::info!("Interrupted by user");
                self.rig.display.show("Interrupted", "by user");
            }
            Ok(outcome) => log::info!("{} mode finished: {:?}", controller.name(), outcome),
            Err(e) => {
                log::error!("Fault in {} mode: {}", controller.name(), e);
                self.rig.display.show("Fault", e.label());
            }
        }

        let warnings = self.shutdown();
        let outcome = result?;

        log::info!(
            "Run summary: {} samples ({} invalid), {} maneuvers",
            stats.samples,
            stats.invalid_samples,
            stats.maneuvers
        );
        Ok(RunReport {
            outcome,
            stats,
            warnings,
        })
    }

    /// Claim outputs, start every channel off, centre the steering servo
    fn init(&mut self) -> Result<()> {
        self.rig.actuators.init()?;
        self.rig
            .actuators
            .set_level(ActuatorRole::SteeringServo, self.settings.servo_center)
    }

    /// Safe shutdown sequence. Runs at most once; never fails.
    pub fn shutdown(&mut self) -> Vec<ChannelWarning> {
        if self.shut_down {
            return Vec::new();
        }
        self.shut_down = true;
        log::info!("Shutting down");

        let act = &mut self.rig.actuators;
        if let Err(e) = Drive::new(self.rig.clock.clone(), ForwardLights::CallerControlled).stop(act)
        {
            log::warn!("Failed to stop drive: {}", e);
        }
        if let Err(e) = act.set_headlights(0.0) {
            log::warn!("Failed to switch off headlights: {}", e);
        }
        let warnings = act.all_off();
        if let Err(e) = act.release() {
            log::warn!("Failed to release outputs: {}", e);
        }

        self.rig.display.show("Cleaning up...", "");
        match seconds("lifecycle.cleanup_secs", self.settings.cleanup_secs) {
            Ok(hold) => self.rig.clock.sleep(hold),
            Err(e) => log::warn!("Skipping cleanup hold: {}", e),
        }
        self.rig.display.clear();
        self.rig.display.close();

        log::info!("Shutdown complete");
        warnings
    }
}

impl Drop for Lifecycle {
    fn drop(&mut self) {
        if !self.shut_down {
            log::debug!("Lifecycle dropped before shutdown, cleaning up...");
            self.shutdown();
        }
    }
}

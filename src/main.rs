//! Chalak - robot motion and sensing controller
//!
//! ```text
//! chalak [--config PATH] scripted
//! chalak [--config PATH] reactive [--direction DIR] [--intensity PCT]
//! ```
//!
//! Without `--direction`, reactive mode prompts on stdin. SIGINT/SIGTERM
//! interrupt the run; outputs are always switched off before exit. A second
//! signal exits at once with status 130.

use chalak::config::ChalakConfig;
use chalak::core::clock::{CancelToken, SharedClock, SystemClock};
use chalak::core::driver::CommandInput;
use chalak::devices::console::{ConsoleDisplay, PresetInput, StdinInput};
use chalak::devices::create_devices;
use chalak::error::Result;
use chalak::lifecycle::{Lifecycle, Rig};
use chalak::modes::{ControllerMode, autonomous_script};
use clap::{Parser, Subcommand};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

const DEFAULT_CONFIG: &str = "chalak.toml";

#[derive(Parser)]
#[command(name = "chalak")]
#[command(about = "Motion and sensing controller for a small wheeled robot")]
struct Args {
    /// Configuration file (defaults to ./chalak.toml if present)
    #[arg(short, long)]
    config: Option<String>,

    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand)]
enum Mode {
    /// Run the fixed autonomous timeline
    Scripted,
    /// Drive once as told, then avoid obstacles until interrupted
    Reactive {
        /// forward, backward, left or right (prompts when omitted)
        #[arg(short, long)]
        direction: Option<String>,

        /// Headlight intensity 0-100 used with --direction
        #[arg(short, long, default_value = "100", requires = "direction")]
        intensity: String,
    },
}

fn load_config(path: Option<&str>) -> Result<ChalakConfig> {
    match path {
        Some(path) => ChalakConfig::load(path),
        None if Path::new(DEFAULT_CONFIG).exists() => ChalakConfig::load(DEFAULT_CONFIG),
        None => Ok(ChalakConfig::default()),
    }
}

/// Exit status after a forced second interrupt (128 + SIGINT)
const FORCED_EXIT: i32 = 130;

#[derive(Debug, PartialEq)]
enum SignalAction {
    Interrupt,
    ForceExit,
}

/// React to the `received`th interrupt signal of this process
fn on_signal(received: usize, cancel: &CancelToken) -> SignalAction {
    if received == 1 {
        cancel.cancel();
        SignalAction::Interrupt
    } else {
        SignalAction::ForceExit
    }
}

/// Trip `cancel` on the first SIGINT/SIGTERM, exit on the second
fn setup_signal_handler(cancel: CancelToken) -> Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;

    std::thread::Builder::new()
        .name("signal-handler".to_string())
        .spawn(move || {
            for (i, sig) in signals.forever().enumerate() {
                match on_signal(i + 1, &cancel) {
                    SignalAction::Interrupt => {
                        log::info!("Received signal {:?}, interrupting run...", sig);
                    }
                    SignalAction::ForceExit => {
                        log::error!("Received signal {:?} again, exiting without cleanup", sig);
                        std::process::exit(FORCED_EXIT);
                    }
                }
            }
        })?;
    Ok(())
}

/// Controller mode plus the operator input it will ask
fn select_mode(
    mode: Mode,
    config: &ChalakConfig,
    cancel: &CancelToken,
) -> Result<(ControllerMode, Option<Box<dyn CommandInput>>)> {
    let threshold_cm = config.reactive.threshold_cm;
    let selected = match mode {
        Mode::Scripted => (
            ControllerMode::ScriptedSequence(autonomous_script(&config.scripted)?),
            None,
        ),
        Mode::Reactive {
            direction,
            intensity,
        } => {
            // Flags are answered like a typed reply so bad text fails the same way
            let input: Box<dyn CommandInput> = match direction {
                Some(direction) => Box::new(PresetInput::new(&direction, &intensity)),
                None => Box::new(StdinInput::new(cancel.clone())?),
            };
            let mode = ControllerMode::ReactiveAvoidance {
                initial: None,
                threshold_cm,
            };
            (mode, Some(input))
        }
    };
    Ok(selected)
}

fn run(mode: Mode, config: ChalakConfig) -> Result<()> {
    log::info!(
        "Device: {} ({})",
        config.device.name,
        config.device.device_type
    );

    let cancel = CancelToken::new();
    setup_signal_handler(cancel.clone())?;

    let (mode, input) = select_mode(mode, &config, &cancel)?;

    let clock: SharedClock = Arc::new(SystemClock::new());
    let devices = create_devices(&config, clock.clone())?;
    let rig = Rig::from_devices(
        &config,
        devices,
        Box::new(ConsoleDisplay::new()),
        input,
        clock,
    );

    let mut lifecycle = Lifecycle::new(rig, &config, cancel);
    let report = lifecycle.run(mode)?;

    log::info!("Run ended: {:?}", report.outcome);
    for warning in &report.warnings {
        log::warn!("Channel left in unknown state: {}", warning);
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    let config = load_config(args.config.as_deref());

    // RUST_LOG overrides the configured level
    let level = config
        .as_ref()
        .map(|c| c.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    log::info!("Chalak v{} starting...", env!("CARGO_PKG_VERSION"));

    match config.and_then(|config| run(args.mode, config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

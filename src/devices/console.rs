//! Terminal display and operator input from stdin or command-line flags

use crate::core::clock::CancelToken;
use crate::core::driver::{CommandInput, Display};
use crate::devices::parse_intensity;
use crate::error::{Error, Result};
use crossbeam_channel::{Receiver, RecvTimeoutError};
use std::io::{BufRead, Write};
use std::time::Duration;

/// Characters per display line, matching a 16x2 character LCD
const LINE_WIDTH: usize = 16;

/// How often a pending prompt checks for interruption
const INPUT_POLL: Duration = Duration::from_millis(100);

/// Renders the two display lines on stdout
pub struct ConsoleDisplay {
    last: Option<(String, String)>,
}

impl ConsoleDisplay {
    pub fn new() -> Self {
        Self { last: None }
    }

    fn render(&mut self, line1: &str, line2: &str) {
        let line1 = fit(line1);
        let line2 = fit(line2);
        if self.last.as_ref() == Some(&(line1.clone(), line2.clone())) {
            return;
        }

        let mut out = std::io::stdout().lock();
        let result = writeln!(out, "┌{}┐", "─".repeat(LINE_WIDTH))
            .and_then(|_| writeln!(out, "│{}│", line1))
            .and_then(|_| writeln!(out, "│{}│", line2))
            .and_then(|_| writeln!(out, "└{}┘", "─".repeat(LINE_WIDTH)));
        if let Err(e) = result {
            log::warn!("Display write failed: {}", e);
        }
        self.last = Some((line1, line2));
    }
}

impl Default for ConsoleDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ConsoleDisplay {
    fn show(&mut self, line1: &str, line2: &str) {
        log::debug!("Display: {:?} / {:?}", line1, line2);
        self.render(line1, line2);
    }

    fn clear(&mut self) {
        self.render("", "");
    }

    fn close(&mut self) {
        self.last = None;
        if let Err(e) = std::io::stdout().flush() {
            log::warn!("Display flush failed: {}", e);
        }
    }
}

/// Pad or truncate to exactly one display line
fn fit(text: &str) -> String {
    let mut line: String = text.chars().take(LINE_WIDTH).collect();
    let width = line.chars().count();
    line.extend(std::iter::repeat_n(' ', LINE_WIDTH - width));
    line
}

/// Operator input read line by line from stdin.
///
/// Lines are read on a background thread so a pending prompt still
/// notices the interrupt signal.
pub struct StdinInput {
    lines: Receiver<std::io::Result<String>>,
    cancel: CancelToken,
}

impl StdinInput {
    pub fn new(cancel: CancelToken) -> Result<Self> {
        let (tx, rx) = crossbeam_channel::bounded(1);
        std::thread::Builder::new()
            .name("stdin-reader".to_string())
            .spawn(move || {
                let stdin = std::io::stdin();
                for line in stdin.lock().lines() {
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                log::debug!("stdin reader exiting");
            })?;

        Ok(Self { lines: rx, cancel })
    }

    fn prompt(&mut self, question: &str) -> Result<String> {
        print!("{}", question);
        std::io::stdout().flush()?;

        loop {
            if self.cancel.is_cancelled() {
                return Err(Error::Input("interrupted while waiting for input".to_string()));
            }
            match self.lines.recv_timeout(INPUT_POLL) {
                Ok(line) => return Ok(line?),
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(Error::Input("stdin closed".to_string()));
                }
            }
        }
    }
}

impl CommandInput for StdinInput {
    fn read_command(&mut self) -> Result<String> {
        let line = self.prompt("Enter direction (forward, backward, left, right): ")?;
        Ok(line.trim().to_lowercase())
    }

    fn read_intensity(&mut self) -> Result<i64> {
        let line = self.prompt("Enter headlight intensity (0-100): ")?;
        parse_intensity(&line)
    }
}

/// Operator answers fixed up front, e.g. from command-line flags.
///
/// Each question is answered once; the text goes through the same parsing
/// as a typed answer, so a bad flag ends the run as invalid input.
pub struct PresetInput {
    command: Option<String>,
    intensity: Option<String>,
}

impl PresetInput {
    pub fn new(command: &str, intensity: &str) -> Self {
        Self {
            command: Some(command.to_string()),
            intensity: Some(intensity.to_string()),
        }
    }
}

impl CommandInput for PresetInput {
    fn read_command(&mut self) -> Result<String> {
        self.command
            .take()
            .ok_or_else(|| Error::Input("no command left to read".to_string()))
    }

    fn read_intensity(&mut self) -> Result<i64> {
        let text = self
            .intensity
            .take()
            .ok_or_else(|| Error::Input("no intensity left to read".to_string()))?;
        parse_intensity(&text)
    }
}

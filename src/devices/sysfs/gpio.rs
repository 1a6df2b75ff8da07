//! GPIO line through `/sys/class/gpio`

use crate::error::{Error, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Line direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    In,
    Out,
}

/// One exported GPIO line
#[derive(Debug)]
pub struct GpioLine {
    class_dir: PathBuf,
    line: u32,
}

impl GpioLine {
    pub fn new(sysfs_root: &Path, line: u32) -> Self {
        Self {
            class_dir: sysfs_root.join("class/gpio"),
            line,
        }
    }

    fn line_dir(&self) -> PathBuf {
        self.class_dir.join(format!("gpio{}", self.line))
    }

    /// Export the line if it is not exported yet, then set its direction
    pub fn export(&self, direction: Direction) -> Result<()> {
        if !self.line_dir().exists() {
            log::debug!("Exporting GPIO {}", self.line);
            write_attr(&self.class_dir.join("export"), &self.line.to_string())?;
        }
        let dir = match direction {
            Direction::In => "in",
            Direction::Out => "out",
        };
        write_attr(&self.line_dir().join("direction"), dir)
    }

    pub fn write(&self, high: bool) -> Result<()> {
        write_attr(&self.line_dir().join("value"), if high { "1" } else { "0" })
    }

    pub fn read(&self) -> Result<bool> {
        let path = self.line_dir().join("value");
        let value = fs::read_to_string(&path)
            .map_err(|e| Error::Hardware(format!("read {}: {}", path.display(), e)))?;
        Ok(value.trim() == "1")
    }

    pub fn unexport(&self) -> Result<()> {
        if self.line_dir().exists() {
            write_attr(&self.class_dir.join("unexport"), &self.line.to_string())?;
        }
        Ok(())
    }
}

/// Write one sysfs attribute
pub(super) fn write_attr(path: &Path, value: &str) -> Result<()> {
    fs::write(path, value)
        .map_err(|e| Error::Hardware(format!("write {} to {}: {}", value, path.display(), e)))
}

//! Device-file backends for [`Gpio`] and [`Pwm`] on a Raspberry Pi.
//!
//! GPIO lines are exported with the WiringPi `gpio` tool and then driven
//! through their sysfs `value` file. The pen servo's PWM channel is written
//! through the pi-blaster daemon's FIFO.

use crate::driver::{Gpio, Pwm};
use crate::error::HardwareError;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::process::Command;

/// A GPIO line driven through `<root>/gpio<N>/value`.
#[derive(Debug)]
pub struct SysfsGpio {
    pin: u32,
    handle: File,
}

impl SysfsGpio {
    /// Exports `pin` as an output and opens its value file under `root`
    /// (normally `/sys/class/gpio`).
    pub fn export(pin: u32, root: &Path) -> Result<Self, HardwareError> {
        let status = Command::new("gpio")
            .args(["export", &pin.to_string(), "out"])
            .status()
            .map_err(|e| HardwareError::NoGpio {
                pin,
                reason: format!("failed to run gpio (is wiringpi installed?): {e}"),
            })?;
        if !status.success() {
            return Err(HardwareError::NoGpio {
                pin,
                reason: format!("gpio export exited with {status}"),
            });
        }
        Self::open(pin, root)
    }

    /// Opens an already exported line.
    pub fn open(pin: u32, root: &Path) -> Result<Self, HardwareError> {
        let path = root.join(format!("gpio{pin}")).join("value");
        let handle = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|_| HardwareError::Uninitialized(pin))?;
        Ok(Self { pin, handle })
    }

    pub fn pin(&self) -> u32 {
        self.pin
    }
}

impl Gpio for SysfsGpio {
    fn enable(&mut self, on: bool) -> Result<(), HardwareError> {
        self.handle.write_all(if on { b"1" } else { b"0" })?;
        Ok(())
    }
}

/// Exports and opens each of `pins`, stopping at the first failure.
pub fn export_pins(pins: &[u32], root: &Path) -> Result<Vec<SysfsGpio>, HardwareError> {
    pins.iter().map(|&pin| SysfsGpio::export(pin, root)).collect()
}

/// One PWM pin on the pi-blaster daemon.
#[derive(Debug)]
pub struct PiBlaster<W = File> {
    pin: u32,
    handle: W,
}

impl PiBlaster<File> {
    /// Opens the pi-blaster FIFO (normally `/dev/pi-blaster`).
    pub fn open(pin: u32, device: &Path) -> Result<Self, HardwareError> {
        let handle = OpenOptions::new().read(true).write(true).open(device)?;
        Ok(Self::new(pin, handle))
    }
}

impl<W: Write> PiBlaster<W> {
    pub fn new(pin: u32, handle: W) -> Self {
        Self { pin, handle }
    }

    /// Hands the pin back to the system.
    pub fn release(&mut self) -> Result<(), HardwareError> {
        writeln!(self.handle, "release {}", self.pin)?;
        self.handle.flush()?;
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.handle
    }
}

impl<W: Write> Pwm for PiBlaster<W> {
    fn duty_cycle(&mut self, value: f64) -> Result<(), HardwareError> {
        writeln!(self.handle, "{}={:.6}", self.pin, value)?;
        self.handle.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::fs;

    #[test]
    fn test_pi_blaster_commands() {
        let mut pwm = PiBlaster::new(18, Vec::new());
        pwm.duty_cycle(0.125).unwrap();
        pwm.release().unwrap();
        assert_eq!(
            String::from_utf8(pwm.into_inner()).unwrap(),
            "18=0.125000\nrelease 18\n"
        );
    }

    #[test]
    fn test_sysfs_line_writes_levels() {
        let root = tempfile::tempdir().unwrap();
        let line = root.path().join("gpio6");
        fs::create_dir(&line).unwrap();
        fs::write(line.join("value"), "").unwrap();

        let mut gpio = SysfsGpio::open(6, root.path()).unwrap();
        gpio.enable(true).unwrap();
        gpio.enable(false).unwrap();
        assert_eq!(fs::read_to_string(line.join("value")).unwrap(), "10");
    }

    #[test]
    fn test_missing_line_is_uninitialized() {
        let root = tempfile::tempdir().unwrap();
        let err = SysfsGpio::open(13, root.path()).unwrap_err();
        assert!(matches!(err, HardwareError::Uninitialized(13)));
    }
}

//! Wiring and calibration for the physical robot.
//!
//! Defaults describe the reference build: a 28BYJ-48 style stepper on each
//! wheel and a hobby servo lifting the pen. Any subset can be overridden from
//! a TOML file; missing keys keep their defaults.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Angle and duty-cycle limits of the pen servo.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServoConfig {
    /// Lowest accepted angle, in degrees.
    pub min_angle: f64,
    /// Highest accepted angle; must exceed `min_angle`.
    pub max_angle: f64,
    /// Duty cycle written for `min_angle`.
    pub min_duty_cycle: f64,
    /// Duty cycle written for `max_angle`.
    pub max_duty_cycle: f64,
}

impl Default for ServoConfig {
    fn default() -> Self {
        Self {
            min_angle: 0.0,
            max_angle: 90.0,
            min_duty_cycle: 0.05,
            max_duty_cycle: 0.2,
        }
    }
}

/// Servo angles for the two pen positions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PenConfig {
    /// Servo angle that lifts the pen off the paper.
    pub up_angle: f64,
    /// Servo angle that puts the pen down.
    pub down_angle: f64,
}

impl Default for PenConfig {
    fn default() -> Self {
        Self {
            up_angle: 0.0,
            down_angle: 90.0,
        }
    }
}

/// Configuration for the physical turtle.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RobotConfig {
    /// BCM pin carrying the pen servo's PWM signal.
    pub pen_servo_pin: u32,
    /// Stepper coil lines of the left wheel, in pattern column order.
    pub left_wheel_pins: Vec<u32>,
    /// Stepper coil lines of the right wheel, in pattern column order.
    pub right_wheel_pins: Vec<u32>,

    /// Pen servo limits.
    pub servo: ServoConfig,
    /// Pen positions, within the servo limits.
    pub pen: PenConfig,

    /// Pause (ms) after each paired wheel step and after moving the pen.
    pub step_delay_ms: u64,
    /// Pause (ms) between phases inside a single wheel's multi-step move.
    pub wheel_step_delay_ms: u64,

    /// Stepper phases per unit of `FORWARD`/`BACKWARD` distance.
    pub move_scale: f64,
    /// Stepper phases per degree of `RIGHT`/`LEFT` rotation.
    pub rotate_scale: f64,

    /// pi-blaster FIFO.
    pub pwm_device: PathBuf,
    /// sysfs GPIO class directory.
    pub gpio_root: PathBuf,
}

impl Default for RobotConfig {
    fn default() -> Self {
        Self {
            pen_servo_pin: 18,
            left_wheel_pins: vec![6, 13, 19, 26],
            right_wheel_pins: vec![21, 20, 16, 12],
            servo: ServoConfig::default(),
            pen: PenConfig::default(),
            step_delay_ms: 2,
            wheel_step_delay_ms: 1,
            move_scale: 100.0,
            rotate_scale: 23.0,
            pwm_device: PathBuf::from("/dev/pi-blaster"),
            gpio_root: PathBuf::from("/sys/class/gpio"),
        }
    }
}

impl RobotConfig {
    /// Reads and validates a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            file: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&text).map_err(|source| ConfigError::Toml {
            file: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the values the drivers would otherwise reject at assembly time.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.left_wheel_pins.is_empty() || self.right_wheel_pins.is_empty() {
            return Err(ConfigError::Invalid(
                "wheel pin lists must not be empty".into(),
            ));
        }

        let range = self.servo.min_angle..=self.servo.max_angle;
        for (name, angle) in [("up_angle", self.pen.up_angle), ("down_angle", self.pen.down_angle)] {
            if !range.contains(&angle) {
                return Err(ConfigError::Invalid(format!(
                    "pen.{name} = {angle} is outside the servo range {}..={}",
                    self.servo.min_angle, self.servo.max_angle
                )));
            }
        }

        if !(self.move_scale > 0.0) || !(self.rotate_scale > 0.0) {
            return Err(ConfigError::Invalid(
                "move_scale and rotate_scale must be positive".into(),
            ));
        }

        Ok(())
    }

    pub fn step_delay(&self) -> Duration {
        Duration::from_millis(self.step_delay_ms)
    }

    pub fn wheel_step_delay(&self) -> Duration {
        Duration::from_millis(self.wheel_step_delay_ms)
    }
}

//! Stepper-motor and servo drivers built on digital output lines and a PWM channel.

use crate::error::HardwareError;
use std::fmt;
use std::time::Duration;

/// A single digital output line.
pub trait Gpio {
    fn enable(&mut self, on: bool) -> Result<(), HardwareError>;
}

/// A pulse-width modulated output.
pub trait Pwm {
    /// Sets the fraction of each period the signal is high.
    fn duty_cycle(&mut self, value: f64) -> Result<(), HardwareError>;
}

/// A motor advanced in discrete phase increments.
pub trait Stepper {
    /// Advances one phase; `dir` is `1` or `-1`.
    fn step_one(&mut self, dir: i32) -> Result<(), HardwareError>;

    /// Advances `|n|` phases in the direction of `n`'s sign.
    fn step(&mut self, n: i32) -> Result<(), HardwareError>;

    fn forward(&mut self) -> Result<(), HardwareError> {
        self.step(1)
    }

    fn backward(&mut self) -> Result<(), HardwareError> {
        self.step(-1)
    }
}

/// A positional servo.
pub trait Servo {
    fn angle(&mut self, deg: f64) -> Result<(), HardwareError>;
}

/// Half-step sequence for a four-line unipolar stepper.
///
/// The final all-off row de-energises the coils at the end of each cycle.
pub const STANDARD_STEPPER_PATTERN: [[bool; 4]; 9] = [
    [false, false, false, true],
    [false, false, true, true],
    [false, false, true, false],
    [false, true, true, false],
    [false, true, false, false],
    [true, true, false, false],
    [true, false, false, false],
    [true, false, false, true],
    [false, false, false, false],
];

/// Returns [`STANDARD_STEPPER_PATTERN`] as owned rows.
pub fn standard_pattern() -> Vec<Vec<bool>> {
    STANDARD_STEPPER_PATTERN.iter().map(|row| row.to_vec()).collect()
}

/// Stepper driven by writing a cyclic phase pattern across GPIO lines.
pub struct GpioStepper<G> {
    pins: Vec<G>,
    pattern: Vec<Vec<bool>>,
    /// Index into `pattern` of the last phase written.
    phase: usize,
    delay: Duration,
    sleep: fn(Duration),
}

impl<G: Gpio> GpioStepper<G> {
    /// Validates that there is at least one line and that every pattern row
    /// has exactly one entry per line.
    pub fn new(
        delay: Duration,
        pins: Vec<G>,
        pattern: Vec<Vec<bool>>,
    ) -> Result<Self, HardwareError> {
        if pins.is_empty() {
            return Err(HardwareError::NoPins);
        }
        if pattern.is_empty() || pattern.iter().any(|row| row.len() != pins.len()) {
            return Err(HardwareError::BadPattern);
        }

        Ok(Self {
            pins,
            pattern,
            phase: 0,
            delay,
            sleep: std::thread::sleep,
        })
    }

    /// Replaces the function used for the inter-step delay (builder pattern).
    pub fn with_sleep(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    pub fn phase(&self) -> usize {
        self.phase
    }

    pub fn pins(&self) -> &[G] {
        &self.pins
    }
}

impl<G: Gpio> Stepper for GpioStepper<G> {
    fn step_one(&mut self, dir: i32) -> Result<(), HardwareError> {
        let len = self.pattern.len() as i64;
        self.phase = (self.phase as i64 + i64::from(dir)).rem_euclid(len) as usize;

        let row = &self.pattern[self.phase];
        for (pin, &on) in self.pins.iter_mut().zip(row) {
            pin.enable(on)?;
        }
        Ok(())
    }

    fn step(&mut self, n: i32) -> Result<(), HardwareError> {
        let dir = n.signum();
        for _ in 0..n.unsigned_abs() {
            self.step_one(dir)?;
            (self.sleep)(self.delay);
        }
        Ok(())
    }
}

impl<G> fmt::Debug for GpioStepper<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GpioStepper")
            .field("pins", &self.pins.len())
            .field("phases", &self.pattern.len())
            .field("phase", &self.phase)
            .field("delay", &self.delay)
            .finish()
    }
}

/// Servo positioned by a linear angle → duty-cycle mapping on a PWM channel.
#[derive(Debug)]
pub struct PwmServo<P> {
    pwm: P,
    pub min_angle: f64,
    pub max_angle: f64,
    pub min_duty_cycle: f64,
    pub max_duty_cycle: f64,
}

impl<P: Pwm> PwmServo<P> {
    /// Both ranges must be strictly increasing.
    pub fn new(
        pwm: P,
        min_angle: f64,
        max_angle: f64,
        min_duty_cycle: f64,
        max_duty_cycle: f64,
    ) -> Result<Self, HardwareError> {
        // Negated comparisons also reject NaN bounds.
        if !(max_angle > min_angle) {
            return Err(HardwareError::AngleBounds);
        }
        if !(max_duty_cycle > min_duty_cycle) {
            return Err(HardwareError::DutyCycleBounds);
        }

        Ok(Self {
            pwm,
            min_angle,
            max_angle,
            min_duty_cycle,
            max_duty_cycle,
        })
    }

    /// The duty cycle that corresponds to `deg`, without range checking.
    pub fn duty_cycle_for(&self, deg: f64) -> f64 {
        let fraction = (deg - self.min_angle) / (self.max_angle - self.min_angle);
        self.min_duty_cycle + fraction * (self.max_duty_cycle - self.min_duty_cycle)
    }

    pub fn pwm(&self) -> &P {
        &self.pwm
    }
}

impl<P: Pwm> Servo for PwmServo<P> {
    fn angle(&mut self, deg: f64) -> Result<(), HardwareError> {
        if !(self.min_angle..=self.max_angle).contains(&deg) {
            return Err(HardwareError::Range);
        }
        let duty = self.duty_cycle_for(deg);
        self.pwm.duty_cycle(duty)
    }
}

impl<T: Stepper + ?Sized> Stepper for Box<T> {
    fn step_one(&mut self, dir: i32) -> Result<(), HardwareError> {
        (**self).step_one(dir)
    }

    fn step(&mut self, n: i32) -> Result<(), HardwareError> {
        (**self).step(n)
    }
}

impl<T: Servo + ?Sized> Servo for Box<T> {
    fn angle(&mut self, deg: f64) -> Result<(), HardwareError> {
        (**self).angle(deg)
    }
}

impl<T: Gpio + ?Sized> Gpio for Box<T> {
    fn enable(&mut self, on: bool) -> Result<(), HardwareError> {
        (**self).enable(on)
    }
}

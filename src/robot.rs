//! The physical turtle: two stepper-driven wheels and a servo-lifted pen.
//!
//! Every logical request is first carried out on the hardware, one paired
//! wheel phase at a time, and only then recorded on the wrapped kinematic
//! turtle. A hardware failure stops the motion where it is and leaves the
//! wrapped turtle's state untouched.

use crate::config::RobotConfig;
use crate::device::{self, PiBlaster, SysfsGpio};
use crate::driver::{GpioStepper, PwmServo, Servo, Stepper, standard_pattern};
use crate::error::HardwareError;
use crate::turtle::{Turtle, TurtleState};
use glam::DVec2;
use std::time::Duration;

/// A pen raised and lowered by a servo.
pub struct ServoPen<S> {
    servo: S,
    pub up_angle: f64,
    pub down_angle: f64,
}

impl<S: Servo> ServoPen<S> {
    pub fn new(servo: S, up_angle: f64, down_angle: f64) -> Self {
        Self {
            servo,
            up_angle,
            down_angle,
        }
    }

    pub fn up(&mut self) -> Result<(), HardwareError> {
        self.servo.angle(self.up_angle)
    }

    pub fn down(&mut self) -> Result<(), HardwareError> {
        self.servo.angle(self.down_angle)
    }
}

/// Turtle backed by a differential-drive robot.
pub struct RobotTurtle<T> {
    inner: T,
    pen: ServoPen<Box<dyn Servo>>,
    left_wheel: Box<dyn Stepper>,
    right_wheel: Box<dyn Stepper>,
    /// Pause after each paired wheel phase and after each pen movement.
    delay: Duration,
    /// Wheel phases per unit of distance.
    move_scale: f64,
    /// Wheel phases per degree of rotation.
    rotate_scale: f64,
    sleep: fn(Duration),
}

impl<T: Turtle> RobotTurtle<T> {
    /// Creates a robot with the reference calibration (100 phases per step,
    /// 23 phases per degree, 2 ms settling delay).
    pub fn new(
        inner: T,
        pen: ServoPen<Box<dyn Servo>>,
        left_wheel: Box<dyn Stepper>,
        right_wheel: Box<dyn Stepper>,
    ) -> Self {
        Self {
            inner,
            pen,
            left_wheel,
            right_wheel,
            delay: Duration::from_millis(2),
            move_scale: 100.0,
            rotate_scale: 23.0,
            sleep: std::thread::sleep,
        }
    }

    /// Assembles the device-backed robot described by `config`:
    /// pi-blaster PWM → servo → pen, and exported GPIO lines → wheel steppers.
    pub fn from_config(config: &RobotConfig, inner: T) -> Result<Self, HardwareError> {
        let pwm = PiBlaster::open(config.pen_servo_pin, &config.pwm_device)?;
        let servo = PwmServo::new(
            pwm,
            config.servo.min_angle,
            config.servo.max_angle,
            config.servo.min_duty_cycle,
            config.servo.max_duty_cycle,
        )?;
        let pen = ServoPen::new(
            Box::new(servo) as Box<dyn Servo>,
            config.pen.up_angle,
            config.pen.down_angle,
        );

        let left_wheel = wheel(config, &config.left_wheel_pins)?;
        let right_wheel = wheel(config, &config.right_wheel_pins)?;

        Ok(Self::new(inner, pen, Box::new(left_wheel), Box::new(right_wheel))
            .with_delay(config.step_delay())
            .with_scales(config.move_scale, config.rotate_scale))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_scales(mut self, move_scale: f64, rotate_scale: f64) -> Self {
        self.move_scale = move_scale;
        self.rotate_scale = rotate_scale;
        self
    }

    /// Replaces the function used for delays (builder pattern).
    pub fn with_sleep(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    /// Advances both wheels one phase at a time until `phases` is reached.
    ///
    /// The count is compared as a float, so a fractional remainder still
    /// earns one final phase.
    fn drive(&mut self, phases: f64, left_dir: i32, right_dir: i32) -> Result<(), HardwareError> {
        if !phases.is_finite() {
            return Err(HardwareError::Range);
        }

        let mut step = 0.0;
        while step < phases {
            self.left_wheel.step_one(left_dir)?;
            self.right_wheel.step_one(right_dir)?;
            (self.sleep)(self.delay);
            step += 1.0;
        }
        Ok(())
    }
}

fn wheel(config: &RobotConfig, pins: &[u32]) -> Result<GpioStepper<SysfsGpio>, HardwareError> {
    let lines = device::export_pins(pins, &config.gpio_root)?;
    GpioStepper::new(config.wheel_step_delay(), lines, standard_pattern())
}

fn direction(value: f64) -> i32 {
    if value < 0.0 { -1 } else { 1 }
}

impl<T: Turtle> Turtle for RobotTurtle<T> {
    fn move_steps(&mut self, steps: f64) -> Result<DVec2, HardwareError> {
        let dir = direction(steps);
        // Straight line: both wheels turn the same way.
        self.drive(steps.abs() * self.move_scale, dir, dir)?;
        self.inner.move_steps(steps)
    }

    fn rotate(&mut self, deg: f64) -> Result<f64, HardwareError> {
        let dir = direction(deg);
        // Turn in place: wheels turn in opposite directions.
        self.drive(deg.abs() * self.rotate_scale, dir, -dir)?;
        self.inner.rotate(deg)
    }

    fn pen_up(&mut self, state: bool) -> Result<bool, HardwareError> {
        if state {
            self.pen.up()?;
        } else {
            self.pen.down()?;
        }
        (self.sleep)(self.delay);
        self.inner.pen_up(state)
    }

    fn state(&self) -> TurtleState {
        self.inner.state()
    }

    /// Lifts the pen so the robot never rests drawing.
    fn close(&mut self) -> Result<(), HardwareError> {
        self.pen_up(true)?;
        self.inner.close()
    }
}

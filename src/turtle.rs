//! Turtle state and the capability interface every turtle implements.

use crate::error::HardwareError;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::Write;

/// Snapshot of a turtle: where it is, which way it faces, and the pen.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TurtleState {
    /// Position relative to the origin.
    pub position: DVec2,

    /// Heading in degrees. Kept in `(-360, 360)`; the sign follows the turns taken.
    pub heading: f64,

    /// `true` while the pen is lifted (not drawing).
    pub pen_up: bool,
}

impl Default for TurtleState {
    fn default() -> Self {
        Self {
            position: DVec2::ZERO,
            heading: 0.0,
            pen_up: false, // Start drawing
        }
    }
}

impl TurtleState {
    pub fn x(&self) -> f64 {
        self.position.x
    }

    pub fn y(&self) -> f64 {
        self.position.y
    }

    /// Unit vector along the current heading.
    pub fn direction(&self) -> DVec2 {
        DVec2::from_angle(self.heading.to_radians())
    }
}

/// The operations a program can ask of a turtle.
///
/// Errors leave the turtle in its last known state, readable through [`state`](Turtle::state).
pub trait Turtle {
    /// Moves `steps` along the heading; negative moves backward.
    /// Returns the resulting position.
    fn move_steps(&mut self, steps: f64) -> Result<DVec2, HardwareError>;

    /// Rotates clockwise by `deg`; negative rotates counter-clockwise.
    /// Returns the resulting heading.
    fn rotate(&mut self, deg: f64) -> Result<f64, HardwareError>;

    /// `pen_up(true)` stops drawing, `pen_up(false)` starts again.
    /// Returns the resulting pen flag.
    fn pen_up(&mut self, state: bool) -> Result<bool, HardwareError>;

    fn state(&self) -> TurtleState;

    /// Releases the turtle. Physical turtles park their pen here.
    fn close(&mut self) -> Result<(), HardwareError> {
        Ok(())
    }
}

impl<T: Turtle + ?Sized> Turtle for Box<T> {
    fn move_steps(&mut self, steps: f64) -> Result<DVec2, HardwareError> {
        (**self).move_steps(steps)
    }

    fn rotate(&mut self, deg: f64) -> Result<f64, HardwareError> {
        (**self).rotate(deg)
    }

    fn pen_up(&mut self, state: bool) -> Result<bool, HardwareError> {
        (**self).pen_up(state)
    }

    fn state(&self) -> TurtleState {
        (**self).state()
    }

    fn close(&mut self) -> Result<(), HardwareError> {
        (**self).close()
    }
}

/// Pure kinematic turtle.
///
/// `move_steps` places the turtle `steps` away from the *origin* along the
/// current heading; it does not add to the previous position. Successive moves
/// at one heading therefore overwrite each other.
#[derive(Clone, Debug, Default)]
pub struct BaseTurtle {
    state: TurtleState,
}

impl BaseTurtle {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Turtle for BaseTurtle {
    fn move_steps(&mut self, steps: f64) -> Result<DVec2, HardwareError> {
        self.state.position = self.state.direction() * steps;
        Ok(self.state.position)
    }

    fn rotate(&mut self, deg: f64) -> Result<f64, HardwareError> {
        // `%` keeps the dividend's sign, so left turns from 0 go negative.
        self.state.heading = (self.state.heading + deg) % 360.0;
        Ok(self.state.heading)
    }

    fn pen_up(&mut self, state: bool) -> Result<bool, HardwareError> {
        self.state.pen_up = state;
        Ok(self.state.pen_up)
    }

    fn state(&self) -> TurtleState {
        self.state
    }
}

struct PenLabel(bool);

/// Shortest round-trip form, switching to exponent notation for very small
/// or very large magnitudes so near-zero coordinates stay readable.
struct Num(f64);

impl fmt::Display for Num {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.abs();
        if self.0.is_finite() && magnitude != 0.0 && !(1e-4..1e21).contains(&magnitude) {
            write!(f, "{:e}", self.0)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

impl fmt::Display for PenLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(if self.0 { "up" } else { "down" })
    }
}

/// Decorator that reports every operation of the wrapped turtle to a sink.
///
/// The report line is written after the inner call returns, whether or not it
/// failed, and describes the state the turtle ended up in.
pub struct TracingTurtle<T, W> {
    inner: T,
    output: W,
}

impl<T: Turtle, W: Write> TracingTurtle<T, W> {
    pub fn new(inner: T, output: W) -> Self {
        Self { inner, output }
    }

    pub fn inner(&self) -> &T {
        &self.inner
    }

    pub fn into_parts(self) -> (T, W) {
        (self.inner, self.output)
    }

    fn report(&mut self, line: fmt::Arguments<'_>) -> Result<(), HardwareError> {
        writeln!(self.output, "{line}")?;
        Ok(())
    }
}

impl TracingTurtle<BaseTurtle, std::io::Stdout> {
    /// A kinematic turtle narrating to standard output.
    pub fn stdout() -> Self {
        Self::new(BaseTurtle::new(), std::io::stdout())
    }
}

impl<T: Turtle, W: Write> Turtle for TracingTurtle<T, W> {
    fn move_steps(&mut self, steps: f64) -> Result<DVec2, HardwareError> {
        let result = self.inner.move_steps(steps);
        let state = self.inner.state();
        self.report(format_args!(
            "Moved {} steps. Now at ({}, {})",
            Num(steps),
            Num(state.x()),
            Num(state.y())
        ))?;
        result
    }

    fn rotate(&mut self, deg: f64) -> Result<f64, HardwareError> {
        let result = self.inner.rotate(deg);
        let heading = Num(self.inner.state().heading);
        self.report(format_args!(
            "Rotated {} degrees. Now facing {heading}",
            Num(deg)
        ))?;
        result
    }

    fn pen_up(&mut self, state: bool) -> Result<bool, HardwareError> {
        let result = self.inner.pen_up(state);
        let pen = PenLabel(self.inner.state().pen_up);
        self.report(format_args!("Pen is now {pen}"))?;
        result
    }

    fn state(&self) -> TurtleState {
        self.inner.state()
    }

    fn close(&mut self) -> Result<(), HardwareError> {
        self.inner.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_move_repositions_from_origin() {
        let mut turtle = BaseTurtle::new();
        turtle.move_steps(10.0).unwrap();
        turtle.move_steps(4.0).unwrap();
        // Absolute placement: the second move does not accumulate.
        assert_eq!(turtle.state().position, DVec2::new(4.0, 0.0));
    }

    #[test]
    fn test_move_follows_heading() {
        let mut turtle = BaseTurtle::new();
        turtle.rotate(90.0).unwrap();
        let pos = turtle.move_steps(2.0).unwrap();
        assert!(pos.x.abs() < 1e-12);
        assert!((pos.y - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_rotation_wraps_with_sign() {
        let mut turtle = BaseTurtle::new();
        assert_eq!(turtle.rotate(270.0).unwrap(), 270.0);
        assert_eq!(turtle.rotate(180.0).unwrap(), 90.0);
        assert_eq!(turtle.rotate(-135.0).unwrap(), -45.0);
    }

    #[test]
    fn test_pen_round_trip() {
        let mut turtle = BaseTurtle::new();
        assert!(!turtle.state().pen_up);
        assert!(turtle.pen_up(true).unwrap());
        assert!(!turtle.pen_up(false).unwrap());
    }

    #[test]
    fn test_tracing_lines() {
        let mut turtle = TracingTurtle::new(BaseTurtle::new(), Vec::new());
        turtle.move_steps(10.0).unwrap();
        turtle.rotate(90.0).unwrap();
        turtle.pen_up(true).unwrap();
        turtle.pen_up(false).unwrap();

        let (_, output) = turtle.into_parts();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Moved 10 steps. Now at (10, 0)\n\
             Rotated 90 degrees. Now facing 90\n\
             Pen is now up\n\
             Pen is now down\n"
        );
    }

    #[test]
    fn test_tracing_tiny_coordinates_use_exponent() {
        let mut turtle = TracingTurtle::new(BaseTurtle::new(), Vec::new());
        turtle.rotate(90.0).unwrap();
        turtle.move_steps(1.0).unwrap();

        let (_, output) = turtle.into_parts();
        let output = String::from_utf8(output).unwrap();
        let last = output.lines().last().unwrap();
        assert_eq!(last, "Moved 1 steps. Now at (6.123233995736766e-17, 1)");
    }

    /// Turtle whose motor refuses to move.
    struct Jammed(BaseTurtle);

    impl Turtle for Jammed {
        fn move_steps(&mut self, _steps: f64) -> Result<DVec2, HardwareError> {
            Err(HardwareError::Range)
        }

        fn rotate(&mut self, deg: f64) -> Result<f64, HardwareError> {
            self.0.rotate(deg)
        }

        fn pen_up(&mut self, state: bool) -> Result<bool, HardwareError> {
            self.0.pen_up(state)
        }

        fn state(&self) -> TurtleState {
            self.0.state()
        }
    }

    #[test]
    fn test_tracing_reports_failed_move() {
        let mut turtle = TracingTurtle::new(Jammed(BaseTurtle::new()), Vec::new());
        let err = turtle.move_steps(5.0).unwrap_err();
        assert!(matches!(err, HardwareError::Range));

        // The line still describes where the turtle actually is.
        let (_, output) = turtle.into_parts();
        assert_eq!(
            String::from_utf8(output).unwrap(),
            "Moved 5 steps. Now at (0, 0)\n"
        );
    }
}

//! Error taxonomy for parsing, evaluation and turtle/hardware failures.
//!
//! Every failure is terminal for the call that produced it: a [`ParseError`]
//! aborts the parse, anything else aborts the enclosing program run.

use crate::lexer::Position;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Malformed source text.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{pos}: {message}")]
pub struct ParseError {
    /// Where in the source the failure was detected.
    pub pos: Position,
    /// Human-readable description.
    pub message: String,
}

impl ParseError {
    pub fn new(pos: Position, message: impl Into<String>) -> Self {
        Self {
            pos,
            message: message.into(),
        }
    }
}

/// Failure while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// A variable reference with no binding in the context.
    #[error("{pos}: unknown variable {name:?}")]
    UnknownVariable { name: String, pos: Position },

    /// An operator or command received an operand of the wrong kind.
    #[error("{pos}: {message}")]
    TypeError { message: String, pos: Position },
}

impl EvalError {
    pub fn type_error(pos: Position, message: impl Into<String>) -> Self {
        Self::TypeError {
            message: message.into(),
            pos,
        }
    }
}

/// Failures raised by turtles, steppers, servos and the device files behind them.
#[derive(Debug, Error)]
pub enum HardwareError {
    #[error("value out of range")]
    Range,

    #[error("no pins")]
    NoPins,

    #[error("pattern doesn't match pins")]
    BadPattern,

    #[error("max angle not greater than min")]
    AngleBounds,

    #[error("max duty cycle not greater than min")]
    DutyCycleBounds,

    #[error("gpio pin {0} not initialized")]
    Uninitialized(u32),

    #[error("gpio not available for pin {pin}: {reason}")]
    NoGpio { pin: u32, reason: String },

    #[error("i/o failed: {0}")]
    Io(#[from] io::Error),
}

/// Terminal error of a program run.
#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("turtle failed: {0}")]
    Hardware(#[from] HardwareError),

    #[error("i/o failed: {0}")]
    Io(#[from] io::Error),
}

/// Failures loading a [`RobotConfig`](crate::config::RobotConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file {}: {source}", .file.display())]
    Io { file: PathBuf, source: io::Error },

    #[error("invalid TOML in {}: {source}", .file.display())]
    Toml {
        file: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Either stage of [`execute`](crate::execute) failing.
#[derive(Debug, Error)]
pub enum Error {
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

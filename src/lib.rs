//! # logo-robot
//!
//! A small Logo dialect driving a turtle, which is either a kinematic
//! simulation narrating its moves or a two-wheeled stepper robot with a
//! servo-lifted pen.
//!
//! Source text is parsed into a [`Program`] by [`parse`], then executed
//! against any [`Turtle`] by an [`Interpreter`]:
//!
//! ```
//! use logo_robot::{BaseTurtle, Turtle, execute};
//!
//! let mut turtle = BaseTurtle::new();
//! execute("RIGHT 90\nFORWARD 3 * (2 + 1)\n", &mut turtle).unwrap();
//! assert_eq!(turtle.state().heading, 90.0);
//! ```

pub mod config;
pub mod device;
pub mod driver;
pub mod error;
pub mod eval;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod program;
pub mod robot;
pub mod scalar;
pub mod turtle;

pub use config::*;
pub use device::*;
pub use driver::*;
pub use error::*;
pub use eval::*;
pub use interpreter::*;
pub use lexer::*;
pub use parser::*;
pub use program::*;
pub use robot::*;
pub use scalar::*;
pub use turtle::*;

/// Parses `source` and runs it once against `turtle` with no variables,
/// no functions and no input or output streams.
pub fn execute(source: &str, turtle: &mut dyn Turtle) -> Result<(), Error> {
    let program = parse(source)?;
    Interpreter::new().run(&program, turtle, &mut std::io::empty(), &mut std::io::sink())?;
    Ok(())
}

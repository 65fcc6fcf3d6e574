//! Executes a parsed [`Program`] against a [`Turtle`].
//!
//! The entry point is [`Interpreter`]. Seed it with variables via
//! [`Interpreter::with_var`] and host functions via
//! [`Interpreter::with_function`], then call [`Interpreter::run`] once per
//! program. Every run starts from a fresh [`Scope`] built from those seeds.
//!
//! The first evaluation or turtle failure aborts the run; commands before it
//! have already had their effect on the turtle.

use crate::error::{EvalError, RuntimeError};
use crate::eval::{Evaluate, Function, FunctionTable, Scope};
use crate::lexer::Position;
use crate::program::{Command, CommandKind, Expression, Program};
use crate::scalar::Scalar;
use crate::turtle::Turtle;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::rc::Rc;
use std::time::Duration;

/// Everything one program run can touch.
pub struct Context<'a> {
    pub scope: Scope,
    pub turtle: &'a mut dyn Turtle,
    pub input: &'a mut dyn Read,
    pub output: &'a mut dyn Write,
}

impl<'a> Context<'a> {
    pub fn new(
        scope: Scope,
        turtle: &'a mut dyn Turtle,
        input: &'a mut dyn Read,
        output: &'a mut dyn Write,
    ) -> Self {
        Self {
            scope,
            turtle,
            input,
            output,
        }
    }
}

/// Runs programs with a fixed set of seed variables and functions.
pub struct Interpreter {
    vars: HashMap<String, Scalar>,
    functions: FunctionTable,
    sleep: fn(Duration),
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates an interpreter with no variables or functions that sleeps on
    /// the calling thread.
    pub fn new() -> Self {
        Self {
            vars: HashMap::new(),
            functions: FunctionTable::new(),
            sleep: std::thread::sleep,
        }
    }

    /// Binds `name` in the scope of every subsequent run (builder pattern).
    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<Scalar>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    /// Registers a host function (builder pattern).
    ///
    /// No built-in command calls functions yet; they are carried in the scope
    /// for hosts that evaluate expressions themselves.
    pub fn with_function<F>(mut self, name: impl Into<String>, function: F) -> Self
    where
        F: Fn(&[Scalar]) -> Result<Scalar, EvalError> + 'static,
    {
        self.functions.insert(name.into(), Rc::new(function) as Function);
        self
    }

    /// Replaces the function `SLEEP` blocks with (builder pattern).
    pub fn with_sleeper(mut self, sleep: fn(Duration)) -> Self {
        self.sleep = sleep;
        self
    }

    /// Binds a variable in place; see [`with_var`](Self::with_var).
    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<Scalar>) {
        self.vars.insert(name.into(), value.into());
    }

    /// A fresh scope holding the seed variables and functions.
    pub fn scope(&self) -> Scope {
        Scope {
            vars: self.vars.clone(),
            functions: self.functions.clone(),
        }
    }

    /// Executes `program` top to bottom.
    ///
    /// The turtle is left in whatever state the last successful command put
    /// it in; it is not closed.
    pub fn run(
        &self,
        program: &Program,
        turtle: &mut dyn Turtle,
        input: &mut dyn Read,
        output: &mut dyn Write,
    ) -> Result<(), RuntimeError> {
        let mut ctx = Context::new(self.scope(), turtle, input, output);
        self.run_commands(&program.commands, &mut ctx)?;
        ctx.output.flush()?;
        Ok(())
    }

    /// Executes `commands` in order, stopping at the first failure.
    pub fn run_commands(&self, commands: &[Command], ctx: &mut Context<'_>) -> Result<(), RuntimeError> {
        for command in commands {
            self.run_command(command, ctx)?;
        }
        Ok(())
    }

    fn run_command(&self, command: &Command, ctx: &mut Context<'_>) -> Result<(), RuntimeError> {
        match &command.kind {
            // --- MOTION ---
            CommandKind::Forward(expr) => {
                let steps = number(expr, command.pos, &ctx.scope)?;
                ctx.turtle.move_steps(steps)?;
            }
            CommandKind::Backward(expr) => {
                let steps = number(expr, command.pos, &ctx.scope)?;
                ctx.turtle.move_steps(-steps)?;
            }
            CommandKind::Right(expr) => {
                let deg = number(expr, command.pos, &ctx.scope)?;
                ctx.turtle.rotate(deg)?;
            }
            CommandKind::Left(expr) => {
                let deg = number(expr, command.pos, &ctx.scope)?;
                ctx.turtle.rotate(-deg)?;
            }

            // --- PEN ---
            CommandKind::PenUp => {
                ctx.turtle.pen_up(true)?;
            }
            CommandKind::PenDown => {
                ctx.turtle.pen_up(false)?;
            }

            // --- FLOW ---
            CommandKind::Sleep(expr) => {
                let ms = number(expr, command.pos, &ctx.scope)?;
                if let Ok(duration) = Duration::try_from_secs_f64(ms / 1000.0) {
                    (self.sleep)(duration);
                }
            }
            CommandKind::Repeat { times, body } => {
                let count = number(times, command.pos, &ctx.scope)?;
                // Counting in floats: a fractional count runs one extra pass.
                let mut i = 0.0;
                while i < count {
                    self.run_commands(body, ctx)?;
                    i += 1.0;
                }
            }
            CommandKind::Stop | CommandKind::Comment(_) => {}
        }
        Ok(())
    }
}

/// Evaluates `expr` and requires a number, reporting a mismatch at `pos`.
fn number(expr: &Expression, pos: Position, scope: &Scope) -> Result<f64, EvalError> {
    match expr.evaluate(scope)? {
        Scalar::Number(n) => Ok(n),
        other => Err(EvalError::type_error(
            pos,
            format!("expected a number, got {}", other.kind()),
        )),
    }
}

/// Runs `program` once with an empty variable set and the given functions.
pub fn run(
    program: &Program,
    turtle: &mut dyn Turtle,
    input: &mut dyn Read,
    output: &mut dyn Write,
    functions: FunctionTable,
) -> Result<(), RuntimeError> {
    let interpreter = Interpreter {
        functions,
        ..Interpreter::new()
    };
    interpreter.run(program, turtle, input, output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::turtle::BaseTurtle;
    use pretty_assertions::assert_eq;
    use std::cell::Cell;
    use std::io;

    fn run_source(interpreter: &Interpreter, source: &str) -> (BaseTurtle, Result<(), RuntimeError>) {
        let program = parse(source).unwrap();
        let mut turtle = BaseTurtle::new();
        let result = interpreter.run(&program, &mut turtle, &mut io::empty(), &mut io::sink());
        (turtle, result)
    }

    thread_local! {
        static SLEPT: Cell<Duration> = const { Cell::new(Duration::ZERO) };
    }

    fn record_sleep(duration: Duration) {
        SLEPT.with(|slept| slept.set(slept.get() + duration));
    }

    #[test]
    fn test_backward_and_left_negate() {
        let (turtle, result) = run_source(&Interpreter::new(), "LT 90\nBK 5\n");
        result.unwrap();
        let state = turtle.state();
        assert_eq!(state.heading, -90.0);
        assert!(state.x().abs() < 1e-9);
        assert!((state.y() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_seed_variables_are_visible() {
        let interpreter = Interpreter::new().with_var("size", 7.0);
        let (turtle, result) = run_source(&interpreter, "FD size * 2\n");
        result.unwrap();
        assert_eq!(turtle.state().x(), 14.0);
    }

    #[test]
    fn test_bool_operand_is_type_error() {
        let (turtle, result) = run_source(&Interpreter::new(), "FD 1 < 2\n");
        let err = result.unwrap_err();
        assert!(
            matches!(err, RuntimeError::Eval(EvalError::TypeError { .. })),
            "{err}"
        );
        assert_eq!(turtle.state().x(), 0.0);
    }

    #[test]
    fn test_sleep_uses_injected_sleeper() {
        let interpreter = Interpreter::new().with_sleeper(record_sleep);
        SLEPT.with(|slept| slept.set(Duration::ZERO));

        let (_, result) = run_source(&interpreter, "SLEEP 250\nSP -5\nSP 1 / 0\n");
        result.unwrap();
        assert_eq!(SLEPT.with(Cell::get), Duration::from_millis(250));
    }

    #[test]
    fn test_fractional_repeat_rounds_up() {
        let (turtle, result) = run_source(&Interpreter::new(), "REPEAT 2.5 [ RT 10 ]\n");
        result.unwrap();
        assert_eq!(turtle.state().heading, 30.0);
    }

    #[test]
    fn test_non_positive_repeat_runs_nothing() {
        let (turtle, result) = run_source(&Interpreter::new(), "REPEAT 0 [ RT 10 ]\nREPEAT -3 [ RT 10 ]\n");
        result.unwrap();
        assert_eq!(turtle.state().heading, 0.0);
    }

    #[test]
    fn test_functions_reach_the_scope() {
        let interpreter = Interpreter::new().with_function("answer", |_| Ok(Scalar::Number(42.0)));
        let scope = interpreter.scope();
        let answer = scope.function("answer").unwrap();
        assert_eq!(answer(&[]).unwrap(), Scalar::Number(42.0));
    }
}

//! The parsed form of a program: commands and their operand expressions.
//!
//! Expressions follow a fixed precedence ladder, loosest first:
//! [`Comparison`] > [`ArithExpr`] > [`Term`] > [`Factor`] > [`Value`].
//! Every node owns its children; the tree is immutable once parsed.

use crate::lexer::Position;
use std::fmt;

/// The top-level expression rule.
pub type Expression = Comparison;

/// A leaf, or a parenthesised expression that restarts the ladder.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    /// Numeric literal, sign included.
    Number(f64),
    /// String literal with escapes resolved.
    Str(String),
    /// Reference to a variable, resolved at evaluation time.
    Variable { name: String, pos: Position },
    /// `( expr )`
    Subexpression(Box<Expression>),
}

/// A [`Value`] optionally raised to a power with `^`.
#[derive(Clone, Debug, PartialEq)]
pub struct Factor {
    /// Position of the base's first token.
    pub pos: Position,
    pub base: Value,
    /// Right operand of `^`. Not chained: `2 ^ 3 ^ 2` does not parse.
    pub exponent: Option<Value>,
}

/// One `op rhs` link of a left-associative chain.
#[derive(Clone, Debug, PartialEq)]
pub struct Operation<O, N> {
    /// Position of the operator token.
    pub pos: Position,
    pub op: O,
    /// Operand on the right of `op`.
    pub rhs: N,
}

/// `Factor (('*' | '/') Factor)*`
#[derive(Clone, Debug, PartialEq)]
pub struct Term {
    pub left: Factor,
    pub right: Vec<Operation<MulOp, Factor>>,
}

/// `Term (('+' | '-') Term)*`
#[derive(Clone, Debug, PartialEq)]
pub struct ArithExpr {
    pub left: Term,
    pub right: Vec<Operation<AddOp, Term>>,
}

/// `ArithExpr (CmpOp ArithExpr)*`
#[derive(Clone, Debug, PartialEq)]
pub struct Comparison {
    pub left: ArithExpr,
    pub right: Vec<Operation<CmpOp, ArithExpr>>,
}

/// Operators binding tighter than `+`/`-`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MulOp {
    Mul,
    Div,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AddOp {
    Add,
    Sub,
}

/// Comparison operators. Two-character forms are glued by the parser.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CmpOp {
    /// `=`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `>`
    Gt,
    /// `<=`
    Le,
    /// `>=`
    Ge,
}

impl fmt::Display for MulOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Mul => "*",
            Self::Div => "/",
        })
    }
}

impl fmt::Display for AddOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Add => "+",
            Self::Sub => "-",
        })
    }
}

impl fmt::Display for CmpOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Gt => ">",
            Self::Le => "<=",
            Self::Ge => ">=",
        })
    }
}

/// What a [`Command`] does.
#[derive(Clone, Debug, PartialEq)]
pub enum CommandKind {
    // --- Motion ---
    /// `FORWARD|FD <expr>`
    Forward(Expression),
    /// `BACKWARD|BK <expr>`
    Backward(Expression),
    /// `RIGHT|RT <expr>` (clockwise, degrees)
    Right(Expression),
    /// `LEFT|LT <expr>`
    Left(Expression),

    // --- Pen ---
    /// `PENUP|PU`
    PenUp,
    /// `PENDOWN|PD`
    PenDown,

    // --- Flow ---
    /// `SLEEP|SP <expr>` (milliseconds)
    Sleep(Expression),
    /// `REPEAT <expr> [ <command>+ ]`
    Repeat {
        times: Expression,
        body: Vec<Command>,
    },
    /// `STOP`. Recognised but currently inert.
    Stop,

    /// `REM ...` / `# ...`, kept with its text. Never executed.
    Comment(String),
}

/// A single command and where it started in the source.
#[derive(Clone, Debug, PartialEq)]
pub struct Command {
    pub pos: Position,
    pub kind: CommandKind,
}

/// An ordered sequence of top-level commands produced by one parse.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Program {
    pub commands: Vec<Command>,
}

impl Program {
    pub fn new(commands: Vec<Command>) -> Self {
        Self { commands }
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }
}

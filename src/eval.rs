//! Expression evaluation against a variable/function [`Scope`].
//!
//! Arithmetic and exponentiation require numbers on both sides. Comparisons
//! accept number/number or string/string, decided by the left operand, and
//! produce [`Scalar::Bool`]. Floating-point edge cases (division by zero,
//! `pow` domain errors) yield `inf`/`NaN` rather than errors.

use crate::error::EvalError;
use crate::lexer::Position;
use crate::program::{AddOp, ArithExpr, CmpOp, Comparison, Factor, MulOp, Term, Value};
use crate::scalar::Scalar;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// A host-provided function callable by name.
///
/// Shared so one table can seed the scope of every run.
pub type Function = Rc<dyn Fn(&[Scalar]) -> Result<Scalar, EvalError>>;

/// Functions available to a program run, keyed by name.
pub type FunctionTable = HashMap<String, Function>;

/// Names visible to expressions during one program run.
#[derive(Default)]
pub struct Scope {
    pub vars: HashMap<String, Scalar>,
    pub functions: FunctionTable,
}

impl Scope {
    pub fn new(functions: FunctionTable) -> Self {
        Self {
            vars: HashMap::new(),
            functions,
        }
    }

    pub fn set_var(&mut self, name: impl Into<String>, value: impl Into<Scalar>) {
        self.vars.insert(name.into(), value.into());
    }

    pub fn var(&self, name: &str) -> Option<&Scalar> {
        self.vars.get(name)
    }

    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("vars", &self.vars)
            .field("functions", &self.functions.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// A node that reduces to a [`Scalar`].
pub trait Evaluate {
    fn evaluate(&self, scope: &Scope) -> Result<Scalar, EvalError>;
}

impl Evaluate for Value {
    fn evaluate(&self, scope: &Scope) -> Result<Scalar, EvalError> {
        match self {
            Value::Number(n) => Ok(Scalar::Number(*n)),
            Value::Str(s) => Ok(Scalar::Str(s.clone())),
            Value::Variable { name, pos } => {
                scope
                    .var(name)
                    .cloned()
                    .ok_or_else(|| EvalError::UnknownVariable {
                        name: name.clone(),
                        pos: *pos,
                    })
            }
            Value::Subexpression(expr) => expr.evaluate(scope),
        }
    }
}

impl Evaluate for Factor {
    fn evaluate(&self, scope: &Scope) -> Result<Scalar, EvalError> {
        let base = self.base.evaluate(scope)?;
        let Some(exponent) = &self.exponent else {
            return Ok(base);
        };
        let exponent = exponent.evaluate(scope)?;
        let (base, exponent) = numbers(&base, &exponent, self.pos, "^")?;
        Ok(Scalar::Number(base.powf(exponent)))
    }
}

impl Evaluate for Term {
    fn evaluate(&self, scope: &Scope) -> Result<Scalar, EvalError> {
        let mut lhs = self.left.evaluate(scope)?;
        for operation in &self.right {
            let rhs = operation.rhs.evaluate(scope)?;
            let op = operation.op;
            let (a, b) = numbers(&lhs, &rhs, operation.pos, &op.to_string())?;
            lhs = Scalar::Number(match op {
                MulOp::Mul => a * b,
                MulOp::Div => a / b,
            });
        }
        Ok(lhs)
    }
}

impl Evaluate for ArithExpr {
    fn evaluate(&self, scope: &Scope) -> Result<Scalar, EvalError> {
        let mut lhs = self.left.evaluate(scope)?;
        for operation in &self.right {
            let rhs = operation.rhs.evaluate(scope)?;
            let op = operation.op;
            let (a, b) = numbers(&lhs, &rhs, operation.pos, &op.to_string())?;
            lhs = Scalar::Number(match op {
                AddOp::Add => a + b,
                AddOp::Sub => a - b,
            });
        }
        Ok(lhs)
    }
}

impl Evaluate for Comparison {
    fn evaluate(&self, scope: &Scope) -> Result<Scalar, EvalError> {
        let mut lhs = self.left.evaluate(scope)?;
        for operation in &self.right {
            let rhs = operation.rhs.evaluate(scope)?;
            let op = operation.op;
            let result = match (&lhs, &rhs) {
                (Scalar::Number(a), Scalar::Number(b)) => compare(op, a, b),
                (Scalar::Str(a), Scalar::Str(b)) => compare(op, a, b),
                (Scalar::Number(_), _) => {
                    return Err(EvalError::type_error(
                        operation.pos,
                        format!("rhs of {op} must be a number, got {}", rhs.kind()),
                    ));
                }
                (Scalar::Str(_), _) => {
                    return Err(EvalError::type_error(
                        operation.pos,
                        format!("rhs of {op} must be a string, got {}", rhs.kind()),
                    ));
                }
                (Scalar::Bool(_), _) => {
                    return Err(EvalError::type_error(
                        operation.pos,
                        format!("lhs of {op} must be a number or string, got {}", lhs.kind()),
                    ));
                }
            };
            lhs = Scalar::Bool(result);
        }
        Ok(lhs)
    }
}

fn compare<T: PartialOrd + ?Sized>(op: CmpOp, a: &T, b: &T) -> bool {
    match op {
        CmpOp::Eq => a == b,
        CmpOp::Ne => a != b,
        CmpOp::Lt => a < b,
        CmpOp::Gt => a > b,
        CmpOp::Le => a <= b,
        CmpOp::Ge => a >= b,
    }
}

fn numbers(lhs: &Scalar, rhs: &Scalar, pos: Position, op: &str) -> Result<(f64, f64), EvalError> {
    let Some(a) = lhs.as_number() else {
        return Err(EvalError::type_error(
            pos,
            format!("invalid arguments for {op}: lhs must be a number, got {}", lhs.kind()),
        ));
    };
    let Some(b) = rhs.as_number() else {
        return Err(EvalError::type_error(
            pos,
            format!("invalid arguments for {op}: rhs must be a number, got {}", rhs.kind()),
        ));
    };
    Ok((a, b))
}

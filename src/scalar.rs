//! The evaluator's runtime value.

use std::fmt;

/// A dynamically typed value. Every operator checks the variants it is handed.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    /// Every numeric value is a double; there is no integer type.
    Number(f64),
    /// Text, compared byte-wise.
    Str(String),
    /// Result of a comparison.
    Bool(bool),
}

impl Scalar {
    /// Short name of the variant, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Number(_) => "number",
            Self::Str(_) => "string",
            Self::Bool(_) => "boolean",
        }
    }

    /// The payload of [`Scalar::Number`], `None` for other variants.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Interprets command-line style text: a number if it parses as one, otherwise a string.
    pub fn from_literal(text: &str) -> Self {
        match text.trim().parse::<f64>() {
            Ok(n) => Self::Number(n),
            Err(_) => Self::Str(text.to_string()),
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Str(s) => f.write_str(s),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<f64> for Scalar {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<&str> for Scalar {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<String> for Scalar {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<bool> for Scalar {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

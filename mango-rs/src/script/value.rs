//! Runtime value type for the Mango scripting language.
//!
//! Mango is string-typed at the edges: variables hold text and every value a
//! script can observe is text.  Inside the evaluator a value is kept in its
//! most specific form so that arithmetic chains do not round-trip through
//! formatting, and errors stay distinguishable until they reach the store.

use std::fmt;

use super::error::ErrorKind;

/// Longest text a repeat (`"ab" * n`, `strrep`) may produce.
pub const MAX_TEXT_LEN: usize = 1 << 20;

/// A Mango runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Num(f64),
    Text(String),
    Error(ErrorKind),
}

impl Default for Value {
    fn default() -> Self {
        Value::Text(String::new())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            // `{}` on f64 already drops a zero fraction: 7.0 prints as "7".
            Value::Num(x) => write!(f, "{x}"),
            Value::Text(s) => write!(f, "{s}"),
            Value::Error(kind) => write!(f, "{kind}"),
        }
    }
}

impl Value {
    /// Numeric view of the value, if it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Num(x) => Some(*x),
            Value::Text(s) => parse_number(s),
            Value::Error(_) => None,
        }
    }

    /// Integer view, accepted only when the number has no fractional part.
    pub fn as_integer(&self) -> Option<i64> {
        let x = self.as_number()?;
        if x.fract() == 0.0 && x.abs() < 9.0e15 {
            Some(x as i64)
        } else {
            None
        }
    }

    /// Boolean view: `true`/`false` in any case, anything else is `None`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Text(s) => parse_bool(s),
            _ => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// Consume into the textual form stored in variables.
    pub fn into_text(self) -> String {
        match self {
            Value::Text(s) => s,
            other => other.to_string(),
        }
    }
}

/// Parse text as a number.
///
/// Only decimal forms are accepted; words such as `inf` or `nan` stay text so
/// that they can be used as variable values without turning numeric.
pub fn parse_number(s: &str) -> Option<f64> {
    let t = s.trim();
    let first = t.chars().next()?;
    if !(first.is_ascii_digit() || matches!(first, '.' | '-' | '+')) {
        return None;
    }
    if t.chars().any(|c| c.is_ascii_alphabetic() && c != 'e' && c != 'E') {
        return None;
    }
    t.parse::<f64>().ok()
}

/// Parse text as a boolean (case-insensitive, surrounding whitespace ignored).
pub fn parse_bool(s: &str) -> Option<bool> {
    let t = s.trim();
    if t.eq_ignore_ascii_case("true") {
        Some(true)
    } else if t.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Num(x)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Num(n as f64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_owned())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Text(if b { "True" } else { "False" }.to_owned())
    }
}

impl From<ErrorKind> for Value {
    fn from(kind: ErrorKind) -> Self {
        Value::Error(kind)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

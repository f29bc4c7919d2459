//! Error categories for script evaluation, loading, and execution.
//!
//! Evaluation errors are in-band: an [`ErrorKind`] becomes a value whose text
//! is the `Error:<Kind>` marker, and it flows through further computation like
//! any other string.  Loading errors are fatal for the whole load.  Execution
//! errors either get reported and skipped (a single statement failed) or
//! abort the run (budget, cancellation, runaway recursion).

use thiserror::Error;

/// The in-band error taxonomy visible to scripts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ErrorKind {
    #[error("Error:Unknown")]
    Unknown,
    /// A value failed to parse as the required type, or a required name was
    /// not found.
    #[error("Error:InvalidVariable")]
    InvalidVariable,
    /// Malformed control-flow syntax.
    #[error("Error:InvalidFunction")]
    InvalidFunction,
    /// Wrong argument shape passed to a native function.
    #[error("Error:InvalidArgs")]
    InvalidArgs,
}

impl ErrorKind {
    /// Recognise an `Error:<Kind>` marker produced by [`Display`](std::fmt::Display).
    pub fn from_marker(text: &str) -> Option<ErrorKind> {
        match text.trim().strip_prefix("Error:")? {
            "Unknown" => Some(ErrorKind::Unknown),
            "InvalidVariable" => Some(ErrorKind::InvalidVariable),
            "InvalidFunction" => Some(ErrorKind::InvalidFunction),
            "InvalidArgs" => Some(ErrorKind::InvalidArgs),
            _ => None,
        }
    }
}

/// A structural problem that aborts [`load_script`](super::loader::load_script).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("line {line}: nested functions are not supported")]
    NestedFunction { line: usize },
    #[error("line {line}: mismatched braces in the script")]
    MismatchedBraces { line: usize },
    #[error("line {line}: function keyword without a name")]
    MissingFunctionName { line: usize },
    #[error("line {line}: function `{name}` is already defined")]
    DuplicateFunction { name: String, line: usize },
}

/// Failure while executing a statement or a function body.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecError {
    /// One statement failed; the body runner reports it and carries on.
    #[error("{0}")]
    Script(ErrorKind),
    #[error("step budget of {0} statements exhausted")]
    StepBudget(u64),
    #[error("execution cancelled")]
    Cancelled,
    #[error("call depth limit of {0} exceeded")]
    CallDepth(usize),
}

impl ExecError {
    /// `true` for errors that must unwind the whole execution.
    pub fn is_abort(&self) -> bool {
        !matches!(self, ExecError::Script(_))
    }
}

impl From<ErrorKind> for ExecError {
    fn from(kind: ErrorKind) -> Self {
        ExecError::Script(kind)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_round_trips_through_display() {
        for kind in [
            ErrorKind::Unknown,
            ErrorKind::InvalidVariable,
            ErrorKind::InvalidFunction,
            ErrorKind::InvalidArgs,
        ] {
            assert_eq!(ErrorKind::from_marker(&kind.to_string()), Some(kind));
        }
    }

    #[test]
    fn plain_text_is_not_a_marker() {
        assert_eq!(ErrorKind::from_marker("Error:"), None);
        assert_eq!(ErrorKind::from_marker("hello"), None);
    }

    #[test]
    fn load_error_mentions_line() {
        let e = LoadError::MismatchedBraces { line: 7 };
        assert_eq!(e.to_string(), "line 7: mismatched braces in the script");
    }

    #[test]
    fn script_errors_do_not_abort() {
        assert!(!ExecError::from(ErrorKind::InvalidFunction).is_abort());
        assert!(ExecError::Cancelled.is_abort());
        assert!(ExecError::StepBudget(10).is_abort());
    }
}

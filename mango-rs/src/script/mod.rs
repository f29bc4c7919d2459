//! Mango scripting language.
//!
//! A script is a set of named functions whose bodies are plain text lines,
//! interpreted one line at a time against a single global variable store:
//!
//! - Loading: `function <name> { … }` blocks, see [`loader`]
//! - Statements: assignment, `if`/`elif`/`else`/`endif`, one-line `for` and
//!   `while` loops, native and script function calls
//! - Expressions: quoted splices, left-to-right `+ - * /`, variable
//!   substitution and native calls, see [`expr`]
//! - A small native library registered through [`Registry`]
//!
//! # Quick start
//!
//! ```rust
//! use mango::script::{load_script, Interpreter};
//!
//! let script = load_script("function start {\nx = 6 * 7\nprint(x)\n}").unwrap();
//! let mut interp = Interpreter::default();
//! script.execute(&mut interp, "start").unwrap();
//! assert_eq!(interp.get_variable("x"), Some("42"));
//! assert_eq!(interp.output, vec!["42"]);
//! ```

pub mod builtins;
pub mod error;
pub mod expr;
pub mod interp;
pub mod loader;
pub mod registry;
pub mod stmt;
pub mod value;

// Re-exports for convenience.
pub use error::{ErrorKind, ExecError, LoadError};
pub use expr::EvalContext;
pub use interp::{CancelToken, Interpreter, Limits};
pub use loader::{load_script, Function, Script};
pub use registry::Registry;
pub use value::Value;

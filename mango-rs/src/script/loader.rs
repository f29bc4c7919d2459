//! Script loader: groups source lines into named function bodies.
//!
//! ```text
//! function start {
//!     x = 0
//! }
//!
//! function update
//!     x += 1
//!     {
//!         print(x)
//!     }
//! }
//!
//! function reset { x = 0; print("reset") }
//! ```
//!
//! The `function <name>` header opens a block by itself; a trailing `{` on
//! the header is optional.  A line that is exactly `{` opens a nested block,
//! a line that is exactly `}` closes one, and the function is sealed when
//! its block count returns to zero.  Nested blocks are kept verbatim in the
//! body and are no-ops at run time.  Bodies are stored as text and
//! re-dispatched on every call.
//!
//! In the one-line form a `for` or `while` takes the rest of the line as
//! its body, exactly as it does on a line of its own.

use std::collections::HashMap;

use super::error::{ExecError, LoadError};
use super::interp::Interpreter;
use super::stmt::{split_statements, starts_loop};

/// A script-defined function: its name and verbatim body lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    name: String,
    body: Vec<String>,
}

impl Function {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn body(&self) -> &[String] {
        &self.body
    }

    /// The body as newline-joined source text.
    pub fn source(&self) -> String {
        self.body.join("\n")
    }
}

/// A loaded script: function name → function.
#[derive(Debug, Clone, Default)]
pub struct Script {
    functions: HashMap<String, Function>,
}

impl Script {
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }

    /// Function names in sorted order.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Run function `name` on `interp`.  Unknown names are a no-op.
    pub fn execute(&self, interp: &mut Interpreter, name: &str) -> Result<(), ExecError> {
        interp.execute(self, name)
    }

    fn insert(&mut self, name: String, body: Vec<String>, line: usize) -> Result<(), LoadError> {
        if self.functions.contains_key(&name) {
            return Err(LoadError::DuplicateFunction { name, line });
        }
        tracing::debug!(function = %name, lines = body.len(), "function loaded");
        self.functions.insert(name.clone(), Function { name, body });
        Ok(())
    }
}

/// The function currently being accumulated.
struct OpenFunction {
    name: String,
    line: usize,
    depth: usize,
    body: Vec<String>,
}

/// Parse `src` into a [`Script`].
pub fn load_script(src: &str) -> Result<Script, LoadError> {
    let mut script = Script::default();
    let mut open: Option<OpenFunction> = None;

    for (idx, raw) in src.lines().enumerate() {
        let lineno = idx + 1;
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(rest) = function_header(line) {
            if open.is_some() {
                return Err(LoadError::NestedFunction { line: lineno });
            }
            let (name, tail) = header_name(rest).ok_or(LoadError::MissingFunctionName { line: lineno })?;
            match tail.strip_prefix('{').map(str::trim) {
                // `function f { a; b }`: the whole function on one line.
                Some(inline) if inline.ends_with('}') => {
                    let body = inline_body(&inline[..inline.len() - 1]);
                    script.insert(name.to_owned(), body, lineno)?;
                }
                Some(first) => {
                    let body = if first.is_empty() { Vec::new() } else { vec![first.to_owned()] };
                    open = Some(OpenFunction { name: name.to_owned(), line: lineno, depth: 1, body });
                }
                None => {
                    if !tail.is_empty() {
                        tracing::debug!(line = lineno, ignored = tail, "text after function name");
                    }
                    open = Some(OpenFunction { name: name.to_owned(), line: lineno, depth: 1, body: Vec::new() });
                }
            }
            continue;
        }

        let Some(func) = open.as_mut() else {
            tracing::debug!(line = lineno, "ignoring text outside a function");
            continue;
        };
        match line {
            "{" => {
                func.depth += 1;
                func.body.push(line.to_owned());
            }
            "}" => {
                func.depth -= 1;
                if func.depth == 0 {
                    if let Some(done) = open.take() {
                        script.insert(done.name, done.body, done.line)?;
                    }
                } else {
                    func.body.push(line.to_owned());
                }
            }
            _ => func.body.push(line.to_owned()),
        }
    }

    if let Some(func) = open {
        return Err(LoadError::MismatchedBraces { line: func.line });
    }
    Ok(script)
}

/// Statements of a single-line function.  A `for` or `while` keeps every
/// statement after it as its loop body, as it would on a line of its own.
fn inline_body(inner: &str) -> Vec<String> {
    let parts = split_statements(inner);
    let split = parts.iter().position(|s| starts_loop(s)).unwrap_or(parts.len());
    let mut body: Vec<String> = parts[..split].iter().map(|s| (*s).to_owned()).collect();
    if split < parts.len() {
        body.push(parts[split..].join("; "));
    }
    body
}

/// If `line` is a `function` header, the text after the keyword.
fn function_header(line: &str) -> Option<&str> {
    let rest = line.strip_prefix("function")?;
    match rest.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() => Some(rest.trim_start()),
        Some(_) => None,
    }
}

/// Split a header remainder into the function name and what follows it.
/// An empty `()` after the name is accepted and dropped.
fn header_name(rest: &str) -> Option<(&str, &str)> {
    let end = rest
        .find(|c: char| !(c.is_alphanumeric() || c == '_'))
        .unwrap_or(rest.len());
    if end == 0 {
        return None;
    }
    let (name, tail) = rest.split_at(end);
    let tail = tail.trim_start();
    let tail = tail.strip_prefix("()").unwrap_or(tail).trim_start();
    Some((name, tail))
}

// ── Tests ─────────────────────────────────────────────────────────────────────

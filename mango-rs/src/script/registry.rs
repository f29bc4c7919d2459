//! Native function table.
//!
//! Host code registers callables under a textual name before any script
//! runs.  The finished [`Registry`] is shared read-only (behind an `Arc`)
//! between every interpreter that uses it.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::value::Value;

/// Signature of a native handler.
///
/// `args` are the already-evaluated argument strings in call order; `output`
/// is the interpreter's output buffer, for natives that print.
pub type NativeHandler = Arc<dyn Fn(&[String], &mut Vec<String>) -> Value + Send + Sync>;

/// One registered native function.
#[derive(Clone)]
pub struct NativeFunction {
    pub name: String,
    pub info: String,
    handler: NativeHandler,
}

impl NativeFunction {
    pub fn call(&self, args: &[String], output: &mut Vec<String>) -> Value {
        (self.handler)(args, output)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("name", &self.name)
            .field("info", &self.info)
            .finish()
    }
}

/// Name → native function.
#[derive(Debug, Default, Clone)]
pub struct Registry {
    functions: HashMap<String, NativeFunction>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-populated with the standard library.
    pub fn with_std() -> Self {
        let mut reg = Self::new();
        super::builtins::register_std(&mut reg);
        reg
    }

    /// Register (or replace) a native.  The last registration of a name wins.
    pub fn register<F>(&mut self, name: impl Into<String>, info: impl Into<String>, handler: F)
    where
        F: Fn(&[String], &mut Vec<String>) -> Value + Send + Sync + 'static,
    {
        let name = name.into();
        self.functions.insert(
            name.clone(),
            NativeFunction {
                name,
                info: info.into(),
                handler: Arc::new(handler),
            },
        );
    }

    pub fn lookup(&self, name: &str) -> Option<&NativeFunction> {
        self.functions.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names in sorted order.
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
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_and_call() {
        let mut reg = Registry::new();
        reg.register("twice", "Doubles its argument.", |args, _| {
            Value::Text(args.concat().repeat(2))
        });
        let f = reg.lookup("twice").unwrap();
        assert_eq!(f.info, "Doubles its argument.");
        let mut out = Vec::new();
        assert_eq!(f.call(&["ab".to_owned()], &mut out), Value::from("abab"));
    }

    #[test]
    fn last_registration_wins() {
        let mut reg = Registry::new();
        reg.register("f", "first", |_, _| Value::from("1"));
        reg.register("f", "second", |_, _| Value::from("2"));
        assert_eq!(reg.len(), 1);
        let f = reg.lookup("f").unwrap();
        assert_eq!(f.info, "second");
        assert_eq!(f.call(&[], &mut Vec::new()), Value::from("2"));
    }

    #[test]
    fn missing_name_is_none() {
        let reg = Registry::new();
        assert!(reg.lookup("nope").is_none());
        assert!(!reg.contains("nope"));
        assert!(reg.is_empty());
    }

    #[test]
    fn handler_can_write_output() {
        let mut reg = Registry::new();
        reg.register("say", "", |args, out| {
            out.push(args.join(" "));
            Value::default()
        });
        let mut out = Vec::new();
        reg.lookup("say")
            .unwrap()
            .call(&["hi".to_owned(), "there".to_owned()], &mut out);
        assert_eq!(out, vec!["hi there"]);
    }

    #[test]
    fn names_are_sorted() {
        let mut reg = Registry::new();
        reg.register("b", "", |_, _| Value::default());
        reg.register("a", "", |_, _| Value::default());
        assert_eq!(reg.names(), vec!["a", "b"]);
    }
}

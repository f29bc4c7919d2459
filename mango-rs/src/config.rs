//! `.mangorc` configuration file parser.
//!
//! | Line | Action |
//! |------|--------|
//! | `tick_ms = <n>` | milliseconds between `update` ticks |
//! | `ticks = <n>` | number of ticks to run, `0` for no limit |
//! | `max_depth = <n>` | expression nesting and call depth limit |
//! | `step_budget = <n>` | statements per execution, `0` or `none` for no limit |
//! | `set <name>=<value>` or `set <name> <value>` | pre-seed a script variable |
//! | Lines starting with `;` | comment, ignored |
//!
//! Bad lines are collected and returned next to the parsed config; they
//! never abort the load.

use std::path::Path;

use thiserror::Error;

use crate::script::{Interpreter, Limits};
use crate::var::VarStore;

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a config file.
#[derive(Debug, Error)]
#[error("line {line}: {message}")]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

/// Host settings plus variables to seed before the script runs.
#[derive(Debug)]
pub struct Config {
    pub tick_ms: u64,
    pub ticks: u64,
    pub limits: Limits,
    pub vars: VarStore,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            tick_ms: 100,
            ticks: 0,
            limits: Limits::default(),
            vars: VarStore::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a config string.
    ///
    /// Returns the config and a list of errors for lines that could not be
    /// applied.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut config = Config::new();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            // blank lines and comments (`;` or `;;` prefix)
            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let result = match line.strip_prefix("set") {
                Some(rest) if rest.starts_with(|c: char| c.is_ascii_whitespace()) => {
                    parse_set(&split_args(rest), &mut config.vars)
                }
                _ => match line.split_once('=') {
                    Some((key, value)) => config.apply_setting(key.trim(), value.trim()),
                    None => Err(format!("expected `key = value` or `set`, got '{line}'")),
                },
            };
            if let Err(message) = result {
                errors.push(ConfigError { line: lineno, message });
            }
        }

        (config, errors)
    }

    /// Read and parse a config file from disk.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let s = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&s))
    }

    /// Copy the seeded variables into `interp`.
    pub fn seed(&self, interp: &mut Interpreter) {
        for (name, value) in self.vars.iter() {
            interp.set_variable(name.as_str(), value.as_str());
        }
    }

    fn apply_setting(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "tick_ms" => self.tick_ms = parse_u64(key, value)?,
            "ticks" => self.ticks = parse_u64(key, value)?,
            "max_depth" => {
                let n = parse_u64(key, value)?;
                if n == 0 {
                    return Err("max_depth must be at least 1".into());
                }
                self.limits.max_depth = usize::try_from(n).map_err(|_| format!("max_depth too large: {n}"))?;
            }
            "step_budget" => {
                self.limits.step_budget = if value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(parse_u64(key, value)?).filter(|&n| n > 0)
                };
            }
            _ => return Err(format!("unknown setting '{key}'")),
        }
        Ok(())
    }
}

fn parse_u64(key: &str, value: &str) -> Result<u64, String> {
    value
        .parse()
        .map_err(|_| format!("{key}: expected a non-negative integer, got '{value}'"))
}

// ── Argument tokenizer ────────────────────────────────────────────────────────

/// Split `s` into whitespace-delimited tokens, honouring double-quoted strings
/// and `\"` escapes within them.
fn split_args(s: &str) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    let mut cur = String::new();
    let mut in_quotes = false;
    let mut chars = s.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => in_quotes = !in_quotes,
            '\\' if in_quotes => {
                if let Some(escaped) = chars.next() {
                    cur.push(escaped);
                }
            }
            c if c.is_ascii_whitespace() && !in_quotes => {
                if !cur.is_empty() {
                    args.push(std::mem::take(&mut cur));
                }
            }
            c => cur.push(c),
        }
    }
    if !cur.is_empty() {
        args.push(cur);
    }
    args
}

// ── set ──────────────────────────────────────────────────────────────────────

/// Parse `set <name>=<value>` or `set <name> <value>`.
fn parse_set(tokens: &[String], vars: &mut VarStore) -> Result<(), String> {
    if tokens.is_empty() {
        return Err("set: requires an argument".into());
    }

    let (name, value) = if let Some(eq) = tokens[0].find('=') {
        let rest = tokens[1..].iter().map(String::as_str);
        let value: Vec<&str> = std::iter::once(&tokens[0][eq + 1..]).chain(rest).collect();
        (tokens[0][..eq].to_owned(), value.join(" ").trim().to_owned())
    } else if tokens.len() >= 2 {
        (tokens[0].clone(), tokens[1..].join(" "))
    } else {
        return Err(format!("set: missing value for '{}'", tokens[0]));
    };

    if name.is_empty() {
        return Err("set: variable name cannot be empty".into());
    }
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return Err(format!("set: '{name}' is not a valid variable name"));
    }

    vars.set(name, value);
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_quoted_spaces() {
        assert_eq!(split_args(r#" greeting "hello world" "#), ["greeting", "hello world"]);
        assert_eq!(split_args(r#""say \"hi\"""#), [r#"say "hi""#]);
    }

    #[test]
    fn defaults() {
        let (cfg, errs) = Config::load_str("");
        assert!(errs.is_empty());
        assert_eq!(cfg.tick_ms, 100);
        assert_eq!(cfg.ticks, 0);
        assert_eq!(cfg.limits, Limits::default());
        assert!(cfg.vars.is_empty());
    }

    #[test]
    fn settings() {
        let (cfg, errs) = Config::load_str("tick_ms = 16\nticks=10\nmax_depth = 32\nstep_budget = 5000");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.tick_ms, 16);
        assert_eq!(cfg.ticks, 10);
        assert_eq!(cfg.limits.max_depth, 32);
        assert_eq!(cfg.limits.step_budget, Some(5000));
    }

    #[test]
    fn step_budget_can_be_unlimited() {
        let (cfg, errs) = Config::load_str("step_budget = 10\nstep_budget = none");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.limits.step_budget, None);
        let (cfg, _) = Config::load_str("step_budget = 0");
        assert_eq!(cfg.limits.step_budget, None);
    }

    #[test]
    fn set_equals_syntax() {
        let (cfg, errs) = Config::load_str("set speed=2");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("speed"), Some("2"));
    }

    #[test]
    fn set_space_syntax() {
        let (cfg, errs) = Config::load_str("set greeting hello world");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("greeting"), Some("hello world"));
    }

    #[test]
    fn set_quoted_value() {
        let (cfg, errs) = Config::load_str(r#"set title="Mango demo""#);
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.get("title"), Some("Mango demo"));
    }

    #[test]
    fn bad_lines_are_collected() {
        let src = "tick_ms = fast\nmax_depth = 0\ncolour = blue\nset\nset x\nset a-b=1\njunk";
        let (cfg, errs) = Config::load_str(src);
        let lines: Vec<usize> = errs.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(cfg.tick_ms, 100);
        assert!(errs[0].to_string().starts_with("line 1: tick_ms"));
    }

    #[test]
    fn comments_and_blank_lines() {
        let (cfg, errs) = Config::load_str(";; header\n\n; note\nset real=yes\n");
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.vars.len(), 1);
    }

    #[test]
    fn settings_name_is_not_set() {
        // `settings = 1` is an unknown key, not a `set` directive.
        let (_, errs) = Config::load_str("settings = 1");
        assert_eq!(errs.len(), 1);
        assert!(errs[0].message.contains("unknown setting"));
    }

    #[test]
    fn seed_copies_variables() {
        let (cfg, _) = Config::load_str("set x=5\nset name=Bob");
        let mut interp = Interpreter::default();
        cfg.seed(&mut interp);
        assert_eq!(interp.get_variable("x"), Some("5"));
        assert_eq!(interp.get_variable("name"), Some("Bob"));
    }

    #[test]
    fn load_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mangorc");
        std::fs::write(&path, "ticks = 3\nset x=1\n").unwrap();
        let (cfg, errs) = Config::load_file(&path).unwrap();
        assert!(errs.is_empty(), "{errs:?}");
        assert_eq!(cfg.ticks, 3);
        assert_eq!(cfg.vars.get("x"), Some("1"));
    }
}

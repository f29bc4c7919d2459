//! Variable store.
//!
//! Every script variable lives in one flat, string-valued table owned by the
//! interpreter.  There is no scoping: a function body mutates the same table
//! as its caller and the host.

use std::collections::HashMap;

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};

/// Global key/value variable store.
#[derive(Debug, Default)]
pub struct VarStore {
    vars: HashMap<String, String>,
    /// Name matcher for [`VarStore::substitute`]; rebuilt lazily when a new
    /// name is added.
    matcher: Option<NameMatcher>,
}

#[derive(Debug)]
struct NameMatcher {
    ac: AhoCorasick,
    names: Vec<String>,
}

impl VarStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set (or overwrite) a variable.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        if !self.vars.contains_key(&name) {
            self.matcher = None;
        }
        self.vars.insert(name, value.into());
    }

    /// Get the string value of a variable.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }

    /// Iterate over all variables.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Replace every whole-identifier occurrence of a known variable name in
    /// `text` with its value.
    ///
    /// Matching is leftmost-longest, so with `n` and `nn` both defined, `nn`
    /// is never read as `n` followed by `n`.  The scan is a single pass over
    /// the original text; substituted values are not scanned again.
    /// Returns `None` when nothing was replaced.
    pub fn substitute(&mut self, text: &str) -> Option<String> {
        if self.vars.is_empty() {
            return None;
        }
        let vars = &self.vars;
        let matcher = self.matcher.get_or_insert_with(|| {
            let names: Vec<String> = vars.keys().cloned().collect();
            let ac = AhoCorasickBuilder::new()
                .match_kind(MatchKind::LeftmostLongest)
                .build(&names);
            NameMatcher { ac, names }
        });

        let mut out = String::with_capacity(text.len());
        let mut last = 0;
        let mut replaced = false;
        for m in matcher.ac.find_iter(text) {
            if !is_whole_word(text, m.start(), m.end()) {
                continue;
            }
            let name = &matcher.names[m.pattern()];
            let Some(value) = vars.get(name) else { continue };
            out.push_str(&text[last..m.start()]);
            out.push_str(value);
            last = m.end();
            replaced = true;
        }
        if !replaced {
            return None;
        }
        out.push_str(&text[last..]);
        Some(out)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// `true` when `text[start..end]` is not glued to identifier characters on
/// either side.
fn is_whole_word(text: &str, start: usize, end: usize) -> bool {
    let before = text[..start].chars().next_back();
    let after = text[end..].chars().next();
    !before.is_some_and(is_ident_char) && !after.is_some_and(is_ident_char)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Statement classification.
//!
//! A Mango statement is one trimmed source line.  There is no tokenizer: the
//! kind of a statement is decided by ordered lexical tests on the line, first
//! match wins.  Loop bodies are `;`-separated statements on the same line.

use std::sync::OnceLock;

use regex::Regex;

use super::error::ErrorKind;

/// A classified statement, borrowing from the source line.
#[derive(Debug, Clone, PartialEq)]
pub enum Stmt<'a> {
    /// Blank line, comment, or a `{` / `}` block marker.
    Nop,
    /// `if <cond>`
    If { cond: &'a str },
    /// `elif <cond>`
    Elif { cond: &'a str },
    /// `else`
    Else,
    /// `endif`
    Endif,
    /// `for <var> = <start> to <end> <s1>; <s2>; …`
    For {
        var: &'a str,
        start: &'a str,
        end: &'a str,
        body: Vec<&'a str>,
    },
    /// `while <cond> <s1>; <s2>; …`
    While { cond: &'a str, body: Vec<&'a str> },
    /// `name = value` or `name op= value`
    Assign {
        name: &'a str,
        op: Option<char>,
        value: &'a str,
    },
    /// Anything else: a native or script function call.
    Call(&'a str),
}

/// Marker that turns a whole line into a comment.
pub const COMMENT: &str = "//";

/// Classify one line.
///
/// `info:` queries are not part of the classification; see [`info_query`].
pub fn classify(line: &str) -> Result<Stmt<'_>, ErrorKind> {
    let line = line.trim();
    if line.is_empty() || line.contains(COMMENT) || line == "{" || line == "}" {
        return Ok(Stmt::Nop);
    }

    if let Some(cond) = strip_keyword(line, "if") {
        return Ok(Stmt::If { cond });
    }
    if let Some(cond) = strip_keyword(line, "elif") {
        return Ok(Stmt::Elif { cond });
    }
    if strip_keyword(line, "else").is_some() {
        return Ok(Stmt::Else);
    }
    if line == "endif" {
        return Ok(Stmt::Endif);
    }
    if strip_keyword(line, "for").is_some() {
        return parse_for(line);
    }
    if strip_keyword(line, "while").is_some() {
        return parse_while(line);
    }
    if let Some(eq) = assignment_eq(line) {
        return parse_assign(line, eq);
    }
    Ok(Stmt::Call(line))
}

/// The native name named by an `info:<name>` query on this line, if any.
pub fn info_query(line: &str) -> Option<&str> {
    if !line.contains("info") {
        return None;
    }
    let (_, rest) = line.split_once(':')?;
    let name = rest.split(':').next().unwrap_or("").trim();
    (!name.is_empty()).then_some(name)
}

/// True if `line` is a `for` or `while` statement, whose body runs to the
/// end of the line.
pub fn starts_loop(line: &str) -> bool {
    let line = line.trim_start();
    strip_keyword(line, "for").is_some() || strip_keyword(line, "while").is_some()
}

/// Split `body` into statements on `;`, ignoring separators inside double
/// quotes or parentheses.  Empty pieces are dropped.
pub fn split_statements(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut in_str = false;
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in body.char_indices() {
        match ch {
            '"' => in_str = !in_str,
            '(' if !in_str => depth += 1,
            ')' if !in_str => depth = depth.saturating_sub(1),
            ';' if !in_str && depth == 0 => {
                parts.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&body[start..]);
    parts
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

// ── Internal helpers ──────────────────────────────────────────────────────────

/// If `line` starts with keyword `kw` followed by whitespace, `(`, or the end
/// of the line, return the trimmed remainder.
fn strip_keyword<'a>(line: &'a str, kw: &str) -> Option<&'a str> {
    let rest = line.strip_prefix(kw)?;
    match rest.chars().next() {
        None => Some(""),
        Some(c) if c.is_whitespace() || c == '(' => Some(rest.trim()),
        Some(_) => None,
    }
}

fn for_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^for\s+([A-Za-z_]\w*)\s*=\s*(\S+)\s+to\s+(\S+)(?:\s+(.*))?$")
            .expect("for-loop pattern is valid")
    })
}

fn while_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^while\s+(\S+(?:\s+(?:==|!=|>=|<=|>|<)\s+\S+)?)(?:\s+(.*))?$")
            .expect("while-loop pattern is valid")
    })
}

fn parse_for(line: &str) -> Result<Stmt<'_>, ErrorKind> {
    let caps = for_regex().captures(line).ok_or(ErrorKind::InvalidFunction)?;
    let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    Ok(Stmt::For {
        var: group(1),
        start: group(2),
        end: group(3),
        body: split_statements(group(4)),
    })
}

fn parse_while(line: &str) -> Result<Stmt<'_>, ErrorKind> {
    let caps = while_regex().captures(line).ok_or(ErrorKind::InvalidFunction)?;
    let group = |i: usize| caps.get(i).map_or("", |m| m.as_str());
    let body = split_statements(group(2));
    // `while x + 1 < 5 ...`: the condition ran into the body.
    if body
        .first()
        .is_some_and(|s| s.starts_with(|c: char| matches!(c, '+' | '-' | '*' | '/' | '<' | '>' | '=' | '!')))
    {
        return Err(ErrorKind::InvalidFunction);
    }
    Ok(Stmt::While { cond: group(1), body })
}

/// Byte offset of the assignment `=` in `line`, if the line is an assignment.
///
/// The `=` must not belong to `==`, `!=`, `<=` or `>=`, and it must come
/// before any `(`, otherwise the line reads as a call such as `print(a=b)`.
fn assignment_eq(line: &str) -> Option<usize> {
    let bytes = line.as_bytes();
    for (i, &b) in bytes.iter().enumerate() {
        match b {
            b'(' | b'"' => return None,
            b'=' => {
                let prev = i.checked_sub(1).map(|p| bytes[p]);
                let next = bytes.get(i + 1).copied();
                if matches!(prev, Some(b'=' | b'!' | b'<' | b'>')) || next == Some(b'=') {
                    continue;
                }
                return Some(i);
            }
            _ => {}
        }
    }
    None
}

fn parse_assign(line: &str, eq: usize) -> Result<Stmt<'_>, ErrorKind> {
    let lhs = &line[..eq];
    let value = line[eq + 1..].trim();
    let (name, op) = match lhs.chars().next_back() {
        Some(c @ ('+' | '-' | '*' | '/')) => (&lhs[..lhs.len() - 1], Some(c)),
        _ => (lhs, None),
    };
    let name = name.trim();
    if name.is_empty() {
        return Err(ErrorKind::InvalidVariable);
    }
    Ok(Stmt::Assign { name, op, value })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn ok(line: &str) -> Stmt<'_> {
        classify(line).expect("classify failed")
    }

    #[test]
    fn blanks_comments_and_braces_are_nops() {
        assert_eq!(ok(""), Stmt::Nop);
        assert_eq!(ok("   "), Stmt::Nop);
        assert_eq!(ok("// note"), Stmt::Nop);
        assert_eq!(ok("x = 1 // trailing"), Stmt::Nop);
        assert_eq!(ok("{"), Stmt::Nop);
        assert_eq!(ok("}"), Stmt::Nop);
    }

    #[test]
    fn conditionals() {
        assert_eq!(ok("if x > 1"), Stmt::If { cond: "x > 1" });
        assert_eq!(ok("elif x == 2"), Stmt::Elif { cond: "x == 2" });
        assert_eq!(ok("else"), Stmt::Else);
        assert_eq!(ok("endif"), Stmt::Endif);
    }

    #[test]
    fn keywords_need_a_boundary() {
        assert_eq!(
            ok("iffy = 3"),
            Stmt::Assign { name: "iffy", op: None, value: "3" }
        );
        assert_eq!(
            ok("format = 1"),
            Stmt::Assign { name: "format", op: None, value: "1" }
        );
        assert_eq!(ok("endiff()"), Stmt::Call("endiff()"));
    }

    #[test]
    fn for_loop() {
        assert_eq!(
            ok("for i = 1 to 3 s = s + i; print(s)"),
            Stmt::For {
                var: "i",
                start: "1",
                end: "3",
                body: vec!["s = s + i", "print(s)"],
            }
        );
    }

    #[test]
    fn for_loop_without_spaces_around_eq() {
        assert_eq!(
            ok("for i=0 to n x += i"),
            Stmt::For { var: "i", start: "0", end: "n", body: vec!["x += i"] }
        );
    }

    #[test]
    fn malformed_for_is_invalid_function() {
        assert_eq!(classify("for i 1 to 3 x = 1"), Err(ErrorKind::InvalidFunction));
        assert_eq!(classify("for i = 1 3 x = 1"), Err(ErrorKind::InvalidFunction));
        assert_eq!(classify("for"), Err(ErrorKind::InvalidFunction));
    }

    #[test]
    fn while_with_spaced_condition() {
        assert_eq!(
            ok("while x < 10 x = x + 1; print(x)"),
            Stmt::While { cond: "x < 10", body: vec!["x = x + 1", "print(x)"] }
        );
    }

    #[test]
    fn while_with_single_token_condition() {
        assert_eq!(
            ok("while x<10 x += 1"),
            Stmt::While { cond: "x<10", body: vec!["x += 1"] }
        );
        assert_eq!(
            ok("while running tick()"),
            Stmt::While { cond: "running", body: vec!["tick()"] }
        );
    }

    #[test]
    fn malformed_while_is_invalid_function() {
        assert_eq!(classify("while"), Err(ErrorKind::InvalidFunction));
    }

    #[test]
    fn while_condition_with_arithmetic_is_rejected() {
        assert_eq!(classify("while x + 1 < 5 x += 1"), Err(ErrorKind::InvalidFunction));
        assert_eq!(classify("while x * 2 x += 1"), Err(ErrorKind::InvalidFunction));
        // Unspaced arithmetic stays one token.
        assert_eq!(
            ok("while x+1 < 5 x += 1"),
            Stmt::While { cond: "x+1 < 5", body: vec!["x += 1"] }
        );
    }

    #[test]
    fn loop_statements() {
        assert!(starts_loop("for i = 1 to 3 x += 1"));
        assert!(starts_loop("while x < 3 x += 1"));
        assert!(!starts_loop("format = 1"));
        assert!(!starts_loop("whiles = 2"));
    }

    #[test]
    fn assignment_forms() {
        assert_eq!(ok("x = 1"), Stmt::Assign { name: "x", op: None, value: "1" });
        assert_eq!(ok("x += 2"), Stmt::Assign { name: "x", op: Some('+'), value: "2" });
        assert_eq!(ok("x/=2"), Stmt::Assign { name: "x", op: Some('/'), value: "2" });
        assert_eq!(
            ok("y = sum(1, 2)"),
            Stmt::Assign { name: "y", op: None, value: "sum(1, 2)" }
        );
        assert_eq!(
            ok("s = \"a=b\""),
            Stmt::Assign { name: "s", op: None, value: "\"a=b\"" }
        );
    }

    #[test]
    fn comparisons_and_calls_are_not_assignments() {
        assert_eq!(ok("print(a=b)"), Stmt::Call("print(a=b)"));
        assert_eq!(ok("x == 1"), Stmt::Call("x == 1"));
        assert_eq!(ok("x <= 1"), Stmt::Call("x <= 1"));
        assert_eq!(ok("print(\"hi\")"), Stmt::Call("print(\"hi\")"));
    }

    #[test]
    fn missing_assignment_target() {
        assert_eq!(classify("= 5"), Err(ErrorKind::InvalidVariable));
    }

    #[test]
    fn info_query_names() {
        assert_eq!(info_query("info:print"), Some("print"));
        assert_eq!(info_query("info: sum "), Some("sum"));
        assert_eq!(info_query("info"), None);
        assert_eq!(info_query("x = 1"), None);
    }

    #[test]
    fn split_respects_quotes_and_parens() {
        assert_eq!(
            split_statements("print(\"a;b\"); x = f(1;2) ;; y = 2"),
            vec!["print(\"a;b\")", "x = f(1;2)", "y = 2"]
        );
        assert!(split_statements("   ").is_empty());
    }
}

//! Mango expression and condition evaluator.
//!
//! There is no lexer or grammar.  An expression is a raw text fragment that
//! is reduced by a fixed sequence of lexical rules, each of which recurses
//! back into [`eval`] on smaller fragments:
//!
//! 1. A fragment that is exactly one call, `name(args)`, calls a native.
//!    An empty name is plain grouping: `(1 + 2)`.
//! 2. Two or more `"` characters: the text between the first and last quote
//!    is a literal.  The text before it is evaluated and prefixed; the text
//!    after it is evaluated and appended, repeated (`"ab" * 3`), or
//!    concatenated (`"x" + y`).
//! 3. Arithmetic: for `+ - * /` in that fixed order, the leftmost
//!    occurrence at parenthesis depth 0 splits the fragment.  This is *not*
//!    precedence: `2 * 3 + 4` splits on `+` first, `2 - 3 * 4` on `-`.
//! 4. Variable substitution of whole identifiers, longest name first.
//!
//! Evaluation is total.  Numeric failures come back as `Error:<Kind>`
//! values, and a fragment no rule applies to is returned unchanged.

use super::error::ErrorKind;
use super::value::{Value, MAX_TEXT_LEN};

// ── EvalContext ───────────────────────────────────────────────────────────────

/// Dependency-injection interface used by the expression evaluator.
///
/// An [`Interpreter`](super::interp::Interpreter) implements this trait to give
/// the evaluator access to variables and native functions.
pub trait EvalContext {
    /// Substitute known variable names in `text`; `None` if nothing matched.
    fn substitute_vars(&mut self, text: &str) -> Option<String>;

    /// Call a registered native; `None` if no native has that name.
    fn call_native(&mut self, name: &str, args: &[String]) -> Option<Value>;

    /// Recursion limit for a single evaluation.
    fn max_depth(&self) -> usize;
}

/// Arithmetic operators in the order they are tried.
const ARITH_OPS: [char; 4] = ['+', '-', '*', '/'];

/// Comparison operators in the order they are tried at each position.
const CMP_OPS: [&str; 6] = ["==", "!=", ">=", "<=", ">", "<"];

// ── Public API ────────────────────────────────────────────────────────────────

/// Evaluate `src` to a value.
pub fn eval(src: &str, ctx: &mut dyn EvalContext) -> Value {
    eval_at(src, ctx, 0)
}

/// Evaluate `src` to its textual form.
pub fn eval_str(src: &str, ctx: &mut dyn EvalContext) -> String {
    eval(src, ctx).into_text()
}

/// Evaluate a condition.
///
/// With no comparison operator the whole text must evaluate to a boolean
/// (anything else is false).  With exactly one, both sides are evaluated;
/// `==`/`!=` compare text, the ordering operators require numbers on both
/// sides and fail with `InvalidVariable` otherwise.  More than one
/// comparison operator is `InvalidFunction`.
pub fn eval_condition(src: &str, ctx: &mut dyn EvalContext) -> Result<bool, ErrorKind> {
    let src = src.trim();
    if let Some(("", inner)) = split_call(src) {
        return eval_condition(inner, ctx);
    }
    match find_comparisons(src).as_slice() {
        [] => Ok(eval(src, ctx).as_bool().unwrap_or(false)),
        &[(pos, op)] => {
            let left = eval(&src[..pos], ctx);
            let right = eval(&src[pos + op.len()..], ctx);
            match op {
                "==" => Ok(left.into_text() == right.into_text()),
                "!=" => Ok(left.into_text() != right.into_text()),
                _ => {
                    let a = left.as_number().ok_or(ErrorKind::InvalidVariable)?;
                    let b = right.as_number().ok_or(ErrorKind::InvalidVariable)?;
                    Ok(match op {
                        ">=" => a >= b,
                        "<=" => a <= b,
                        ">" => a > b,
                        _ => a < b,
                    })
                }
            }
        }
        _ => Err(ErrorKind::InvalidFunction),
    }
}

/// If `text` is exactly one call `name(args)`, return `(name, args)`.
///
/// `name` is empty for a parenthesised group.  An unbalanced parenthesis,
/// or anything after the closing one, means `text` is not a call.
pub fn split_call(text: &str) -> Option<(&str, &str)> {
    let text = text.trim();
    let open = text.find('(')?;
    let name = text[..open].trim_end();
    if !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
        return None;
    }
    let close = matching_paren(text, open)?;
    if close != text.len() - 1 {
        return None;
    }
    Some((name, &text[open + 1..close]))
}

/// Split a call's argument text on top-level commas.
///
/// Commas inside quotes or nested parentheses do not split.  Blank argument
/// text is an empty list.
pub fn split_args(inner: &str) -> Vec<&str> {
    if inner.trim().is_empty() {
        return Vec::new();
    }
    let mut args = Vec::new();
    let mut in_str = false;
    let mut depth = 0usize;
    let mut start = 0;
    for (i, ch) in inner.char_indices() {
        match ch {
            '"' => in_str = !in_str,
            '(' if !in_str => depth += 1,
            ')' if !in_str => depth = depth.saturating_sub(1),
            ',' if !in_str && depth == 0 => {
                args.push(inner[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    args.push(inner[start..].trim());
    args
}

/// Evaluate the arguments of a split call and dispatch it.
///
/// An unknown native leaves `text` unevaluated.
pub fn eval_call(text: &str, name: &str, inner: &str, ctx: &mut dyn EvalContext) -> Value {
    call_at(text, name, inner, ctx, 0)
}

/// Apply a binary arithmetic operator to two evaluated operands.
pub fn apply_operator(op: char, left: Value, right: Value) -> Value {
    match (left.as_number(), right.as_number()) {
        (Some(a), Some(b)) => match op {
            '+' => Value::Num(a + b),
            '-' => Value::Num(a - b),
            '*' => Value::Num(a * b),
            '/' if b == 0.0 => Value::Error(ErrorKind::InvalidVariable),
            '/' => Value::Num(a / b),
            _ => Value::Error(ErrorKind::Unknown),
        },
        _ if op == '+' => {
            let mut s = left.into_text();
            s.push_str(&right.into_text());
            Value::Text(s)
        }
        _ => Value::Error(ErrorKind::InvalidVariable),
    }
}

// ── Evaluator ─────────────────────────────────────────────────────────────────

fn eval_at(src: &str, ctx: &mut dyn EvalContext, depth: usize) -> Value {
    if depth > ctx.max_depth() {
        tracing::debug!(expr = src, depth, "expression nesting limit reached");
        return Value::Error(ErrorKind::Unknown);
    }
    let text = src.trim();
    if text.is_empty() {
        return Value::default();
    }

    if let Some((name, inner)) = split_call(text) {
        return call_at(text, name, inner, ctx, depth);
    }

    if let (Some(first), Some(last)) = (text.find('"'), text.rfind('"')) {
        if first != last {
            return splice(text, first, last, ctx, depth);
        }
    }

    for op in ARITH_OPS {
        if let Some(pos) = find_operator(text, op) {
            // Both halves are strictly shorter, so a split is not nesting.
            let left = eval_at(&text[..pos], ctx, depth);
            let right = eval_at(&text[pos + 1..], ctx, depth);
            return apply_operator(op, left, right);
        }
    }

    match ctx.substitute_vars(text) {
        Some(s) => Value::Text(s),
        None => Value::Text(text.to_owned()),
    }
}

fn call_at(text: &str, name: &str, inner: &str, ctx: &mut dyn EvalContext, depth: usize) -> Value {
    if name.is_empty() {
        return eval_at(inner, ctx, depth + 1);
    }
    let args: Vec<String> = split_args(inner)
        .into_iter()
        .map(|a| eval_at(a, ctx, depth + 1).into_text())
        .collect();
    match ctx.call_native(name, &args) {
        Some(v) => v,
        None => {
            tracing::debug!(function = name, "unknown function, left unevaluated");
            Value::Text(text.to_owned())
        }
    }
}

/// Quoted literal splice around the first and last `"` of `text`.
fn splice(text: &str, first: usize, last: usize, ctx: &mut dyn EvalContext, depth: usize) -> Value {
    let literal = &text[first + 1..last];
    let before = text[..first].trim();
    let after = text[last + 1..].trim();

    let mut out = match before.strip_suffix('+') {
        Some(b) => eval_at(b, ctx, depth + 1).into_text(),
        None => eval_at(before, ctx, depth + 1).into_text(),
    };

    if let Some(rest) = after.strip_prefix('*') {
        match eval_at(rest, ctx, depth + 1).as_integer() {
            Some(n) if n >= 0 && literal.len().saturating_mul(n as usize) <= MAX_TEXT_LEN => {
                out.push_str(&literal.repeat(n as usize))
            }
            _ => return Value::Error(ErrorKind::InvalidVariable),
        }
    } else {
        let rest = after.strip_prefix('+').unwrap_or(after);
        out.push_str(literal);
        out.push_str(&eval_at(rest, ctx, depth + 1).into_text());
    }
    Value::Text(out)
}

// ── Lexical helpers ───────────────────────────────────────────────────────────

/// Byte offset of the `)` matching the `(` at `open`, skipping quoted text.
fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_str = false;
    for (i, ch) in text[open..].char_indices() {
        match ch {
            '"' => in_str = !in_str,
            '(' if !in_str => depth += 1,
            ')' if !in_str => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

/// Leftmost binary occurrence of `op` at parenthesis depth 0.
///
/// Position 0 never splits, and a `+`/`-` directly after another operator
/// (or an exponent such as `1e-3`) is a sign, not an operator.
fn find_operator(text: &str, op: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut prev: Option<char> = None;
    for (i, ch) in text.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            c if c == op && depth == 0 && i > 0 => {
                let is_sign = matches!(op, '+' | '-')
                    && (matches!(prev, None | Some('+' | '-' | '*' | '/')) || is_exponent_sign(text, i));
                if !is_sign {
                    return Some(i);
                }
            }
            _ => {}
        }
        if !ch.is_whitespace() {
            prev = Some(ch);
        }
    }
    None
}

/// True when the sign at `i` directly follows the `e` of a numeric literal
/// such as `1e-3` or `2.5E+4`.
fn is_exponent_sign(text: &str, i: usize) -> bool {
    let Some(mantissa) = text[..i].strip_suffix(|c: char| c == 'e' || c == 'E') else {
        return false;
    };
    let len = mantissa
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_')
        .count();
    let token = &mantissa[mantissa.len() - len..];
    !token.is_empty() && token.chars().all(|c| c.is_ascii_digit() || c == '.')
}

/// Every comparison operator in `text` outside quotes, leftmost first.
fn find_comparisons(text: &str) -> Vec<(usize, &'static str)> {
    let mut found = Vec::new();
    let mut in_str = false;
    let mut i = 0;
    while i < text.len() {
        let rest = &text[i..];
        if rest.starts_with('"') {
            in_str = !in_str;
        } else if !in_str {
            if let Some(op) = CMP_OPS.into_iter().find(|op| rest.starts_with(op)) {
                found.push((i, op));
                i += op.len();
                continue;
            }
        }
        i += rest.chars().next().map_or(1, char::len_utf8);
    }
    found
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Native standard library.
//!
//! Each function receives its already-evaluated argument strings and returns
//! a [`Value`].  Failures are returned in-band as `Value::Error`, never as a
//! panic, so a bad argument shows up in the script as an `Error:<Kind>` marker.

use super::error::ErrorKind;
use super::registry::Registry;
use super::value::{parse_number, Value, MAX_TEXT_LEN};

/// Names and `info:` descriptions of every standard native.
pub const STD_FUNCTIONS: &[(&str, &str)] = &[
    ("print", "Prints text to the console."),
    ("sum", "Adds all arguments."),
    ("mul", "Multiplies all arguments."),
    ("div", "Divides the first argument by each of the others."),
    ("sqrt", "Square root of a non-negative number."),
    ("max", "Largest of the arguments."),
    ("min", "Smallest of the arguments."),
    ("abs", "Absolute value."),
    ("strlen", "Number of characters in a string."),
    ("substr", "substr(s, start[, len]): slice of a string by character."),
    ("toupper", "Upper-cases a string."),
    ("tolower", "Lower-cases a string."),
    ("strrep", "strrep(s, n): repeats a string n times."),
];

/// Register every entry of [`STD_FUNCTIONS`] into `reg`.
pub fn register_std(reg: &mut Registry) {
    for &(name, info) in STD_FUNCTIONS {
        reg.register(name, info, move |args, output| {
            call_builtin(name, args, output).unwrap_or(Value::Error(ErrorKind::InvalidFunction))
        });
    }
}

/// Dispatch a standard native by name.
///
/// Returns `None` if `name` is not part of the standard library.
pub fn call_builtin(name: &str, args: &[String], output: &mut Vec<String>) -> Option<Value> {
    // Inner function returns Result<Option<Value>, ErrorKind>:
    //   Ok(None)    → not a builtin
    //   Ok(Some(v)) → success
    //   Err(kind)   → call failed, reported in-band
    fn inner(
        name: &str,
        args: &[String],
        output: &mut Vec<String>,
    ) -> Result<Option<Value>, ErrorKind> {
        Ok(Some(match name {
            // ── Output ───────────────────────────────────────────────────────
            "print" => {
                output.push(args.join(" "));
                Value::default()
            }

            // ── Arithmetic folds ─────────────────────────────────────────────
            "sum" => Value::Num(numbers(args)?.iter().sum()),
            "mul" => Value::Num(numbers(args)?.iter().product()),
            "div" => {
                let nums = numbers(args)?;
                let (first, rest) = nums.split_first().ok_or(ErrorKind::InvalidArgs)?;
                let mut acc = *first;
                for &d in rest {
                    if d == 0.0 {
                        return Err(ErrorKind::InvalidVariable);
                    }
                    acc /= d;
                }
                Value::Num(acc)
            }
            "max" => {
                let nums = numbers(args)?;
                if nums.is_empty() {
                    return Err(ErrorKind::InvalidArgs);
                }
                Value::Num(nums.into_iter().fold(f64::MIN, f64::max))
            }
            "min" => {
                let nums = numbers(args)?;
                if nums.is_empty() {
                    return Err(ErrorKind::InvalidArgs);
                }
                Value::Num(nums.into_iter().fold(f64::MAX, f64::min))
            }

            // ── Unary math ───────────────────────────────────────────────────
            "sqrt" => {
                let x = single_number(args)?;
                if x < 0.0 {
                    return Err(ErrorKind::InvalidArgs);
                }
                Value::Num(x.sqrt())
            }
            "abs" => Value::Num(single_number(args)?.abs()),

            // ── Strings ──────────────────────────────────────────────────────
            "strlen" => {
                let s = single_str(args)?;
                Value::Num(s.chars().count() as f64)
            }
            "substr" => {
                if !(2..=3).contains(&args.len()) {
                    return Err(ErrorKind::InvalidArgs);
                }
                let start = get_index(args, 1)?;
                let chars: Vec<char> = args[0].chars().collect();
                let start = start.min(chars.len());
                let end = match args.get(2) {
                    Some(_) => (start + get_index(args, 2)?).min(chars.len()),
                    None => chars.len(),
                };
                Value::Text(chars[start..end].iter().collect())
            }
            "toupper" => Value::Text(single_str(args)?.to_uppercase()),
            "tolower" => Value::Text(single_str(args)?.to_lowercase()),
            "strrep" => {
                if args.len() != 2 {
                    return Err(ErrorKind::InvalidArgs);
                }
                let n = get_index(args, 1)?;
                if args[0].len().saturating_mul(n) > MAX_TEXT_LEN {
                    return Err(ErrorKind::InvalidArgs);
                }
                Value::Text(args[0].repeat(n))
            }

            _ => return Ok(None),
        }))
    }

    match inner(name, args, output) {
        Ok(v) => v,
        Err(kind) => {
            tracing::debug!(native = name, error = %kind, "native call failed");
            Some(Value::Error(kind))
        }
    }
}

// ── Argument helpers ─────────────────────────────────────────────────────────

fn numbers(args: &[String]) -> Result<Vec<f64>, ErrorKind> {
    args.iter()
        .map(|a| parse_number(a).ok_or(ErrorKind::InvalidVariable))
        .collect()
}

fn single_number(args: &[String]) -> Result<f64, ErrorKind> {
    match args {
        [a] => parse_number(a).ok_or(ErrorKind::InvalidVariable),
        _ => Err(ErrorKind::InvalidArgs),
    }
}

fn single_str(args: &[String]) -> Result<&str, ErrorKind> {
    match args {
        [a] => Ok(a.as_str()),
        _ => Err(ErrorKind::InvalidArgs),
    }
}

/// Non-negative integer argument at `idx`.
fn get_index(args: &[String], idx: usize) -> Result<usize, ErrorKind> {
    let v = Value::from(args.get(idx).ok_or(ErrorKind::InvalidArgs)?.as_str());
    match v.as_integer() {
        Some(n) if n >= 0 => Ok(n as usize),
        _ => Err(ErrorKind::InvalidVariable),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn call(name: &str, args: &[&str]) -> Value {
        let args: Vec<String> = args.iter().map(|&s| s.to_owned()).collect();
        call_builtin(name, &args, &mut Vec::new()).expect("not a builtin")
    }

    #[test]
    fn print_joins_with_spaces() {
        let mut out = Vec::new();
        let args = vec!["a".to_owned(), "b".to_owned()];
        let v = call_builtin("print", &args, &mut out).unwrap();
        assert_eq!(v, Value::default());
        assert_eq!(out, vec!["a b"]);
    }

    #[test]
    fn sum_and_mul() {
        assert_eq!(call("sum", &["1", "2", "3.5"]), Value::Num(6.5));
        assert_eq!(call("sum", &[]), Value::Num(0.0));
        assert_eq!(call("mul", &["2", "3"]), Value::Num(6.0));
        assert_eq!(call("mul", &[]), Value::Num(1.0));
    }

    #[test]
    fn non_numeric_argument_is_invalid_variable() {
        assert_eq!(call("sum", &["1", "x"]), Value::Error(ErrorKind::InvalidVariable));
    }

    #[test]
    fn div_left_to_right() {
        assert_eq!(call("div", &["100", "5", "2"]), Value::Num(10.0));
        assert_eq!(call("div", &["1", "0"]), Value::Error(ErrorKind::InvalidVariable));
        assert_eq!(call("div", &[]), Value::Error(ErrorKind::InvalidArgs));
    }

    #[test]
    fn sqrt_checks_arity_and_sign() {
        assert_eq!(call("sqrt", &["9"]), Value::Num(3.0));
        assert_eq!(call("sqrt", &["-1"]), Value::Error(ErrorKind::InvalidArgs));
        assert_eq!(call("sqrt", &["1", "2"]), Value::Error(ErrorKind::InvalidArgs));
    }

    #[test]
    fn max_min_abs() {
        assert_eq!(call("max", &["3", "-1", "7"]), Value::Num(7.0));
        assert_eq!(call("min", &["3", "-1", "7"]), Value::Num(-1.0));
        assert_eq!(call("abs", &["-4.5"]), Value::Num(4.5));
        assert_eq!(call("max", &[]), Value::Error(ErrorKind::InvalidArgs));
    }

    #[test]
    fn string_functions() {
        assert_eq!(call("strlen", &["héllo"]), Value::Num(5.0));
        assert_eq!(call("substr", &["hello", "1", "3"]), Value::from("ell"));
        assert_eq!(call("substr", &["hello", "2"]), Value::from("llo"));
        assert_eq!(call("substr", &["hi", "5"]), Value::from(""));
        assert_eq!(call("toupper", &["Hello"]), Value::from("HELLO"));
        assert_eq!(call("tolower", &["Hello"]), Value::from("hello"));
        assert_eq!(call("strrep", &["ab", "3"]), Value::from("ababab"));
        assert_eq!(call("strrep", &["ab", "-1"]), Value::Error(ErrorKind::InvalidVariable));
        assert_eq!(call("strrep", &["ab", "1e12"]), Value::Error(ErrorKind::InvalidArgs));
    }

    #[test]
    fn unknown_name_is_none() {
        assert!(call_builtin("nope", &[], &mut Vec::new()).is_none());
    }

    #[test]
    fn register_std_covers_table() {
        let mut reg = Registry::new();
        register_std(&mut reg);
        assert_eq!(reg.len(), STD_FUNCTIONS.len());
        assert_eq!(
            reg.lookup("print").map(|f| f.info.as_str()),
            Some("Prints text to the console.")
        );
    }
}

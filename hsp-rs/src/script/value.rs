//! Runtime value type for HSP scripts.
//!
//! A variable holds either a 64-bit float or a string.  Counters that are
//! integral in nature (loop-record success counts, the `$item` flags set by a
//! goal) are stored as floats and print without a fractional part.

use std::fmt;

/// An HSP runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Num(f64),
    Str(String),
}

impl Default for Value {
    fn default() -> Self {
        Value::Num(0.0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Num(x) => f.write_str(&format_number(*x)),
            Value::Str(s) => f.write_str(s),
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Num(_) => "number",
            Value::Str(_) => "string",
        }
    }

    /// Parse `text` as a number, falling back to the raw text as a string.
    pub fn parse_lenient(text: &str) -> Value {
        match text.trim().parse::<f64>() {
            Ok(x) => Value::Num(x),
            Err(_) => Value::Str(text.to_owned()),
        }
    }
}

/// Format a float for display.
///
/// Magnitudes outside `[0.001, 1e6]` use two-digit scientific notation;
/// everything else is rounded to four decimals with trailing zeros (and a
/// dangling point) removed.
///
/// Two cases intentionally differ from a strict reading of that rule: zero
/// prints as `0` rather than `0.00e0`, and exponents use Rust's compact form
/// (`2.50e7`, not `2.50e+07`).
pub fn format_number(x: f64) -> String {
    if x == 0.0 {
        return "0".to_owned();
    }
    let mag = x.abs();
    if mag < 0.001 || mag > 1e6 {
        return format!("{x:.2e}");
    }
    let fixed = format!("{x:.4}");
    fixed
        .trim_end_matches('0')
        .trim_end_matches('.')
        .to_owned()
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Num(x)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::Num(n as f64)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_owned())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

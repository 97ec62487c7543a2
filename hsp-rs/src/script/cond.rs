//! Conditional statements: `?(<left> <op> <right>) ⇒ <action>`.
//!
//! Each operand is a math call, a `#name` variable, a number, or raw text.
//! Operators are found by substring search; two-character operators are
//! tried before `>` and `<` so `#x>=5` never splits as `#x>` / `=5`.

use std::cmp::Ordering;

use once_cell::sync::Lazy;
use regex::Regex;

use super::{
    error::HspError,
    interp::{Interpreter, MATH_PREFIX},
    value::Value,
};

/// Limit on `?(…) ⇒ ?(…) ⇒ …` chains.
const MAX_NESTING: usize = 64;

static COND_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\?\((.+?)\)\s*⇒\s*(.+)").expect("valid regex"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Ge,
    Le,
    Eq,
    Ne,
    Gt,
    Lt,
}

impl CmpOp {
    /// Search order: every two-character operator precedes its prefix.
    const SCAN_ORDER: [(&'static str, CmpOp); 6] = [
        (">=", CmpOp::Ge),
        ("<=", CmpOp::Le),
        ("==", CmpOp::Eq),
        ("!=", CmpOp::Ne),
        (">", CmpOp::Gt),
        ("<", CmpOp::Lt),
    ];

    fn holds(self, ord: Option<Ordering>) -> bool {
        match (self, ord) {
            (_, None) => self == CmpOp::Ne,
            (CmpOp::Ge, Some(o)) => o != Ordering::Less,
            (CmpOp::Le, Some(o)) => o != Ordering::Greater,
            (CmpOp::Eq, Some(o)) => o == Ordering::Equal,
            (CmpOp::Ne, Some(o)) => o != Ordering::Equal,
            (CmpOp::Gt, Some(o)) => o == Ordering::Greater,
            (CmpOp::Lt, Some(o)) => o == Ordering::Less,
        }
    }
}

/// Compare two resolved operands.
///
/// Numbers compare numerically and strings lexically.  A number and a string
/// are never equal; ordering them is an error.
pub fn compare(op: CmpOp, left: &Value, right: &Value) -> Result<bool, HspError> {
    match (left, right) {
        (Value::Num(a), Value::Num(b)) => Ok(op.holds(a.partial_cmp(b))),
        (Value::Str(a), Value::Str(b)) => Ok(op.holds(Some(a.cmp(b)))),
        _ => match op {
            CmpOp::Eq => Ok(false),
            CmpOp::Ne => Ok(true),
            _ => Err(HspError::Incomparable {
                left: left.type_name().to_owned(),
                right: right.type_name().to_owned(),
            }),
        },
    }
}

impl Interpreter {
    /// Handle a conditional statement, dispatching the action when it holds.
    pub fn execute_condition(&mut self, line: &str) -> Result<(), HspError> {
        let Some(caps) = COND_RE.captures(line) else {
            self.emit(format!("⚠️ Condition format error: {line}"));
            return Ok(());
        };
        let cond = caps[1].to_owned();
        let action = caps[2].trim().to_owned();

        if self.eval_condition(&cond)? {
            if self.nesting >= MAX_NESTING {
                return Err(HspError::TooDeep(MAX_NESTING));
            }
            self.emit(format!("✅ Condition met, running: {action}"));
            self.nesting += 1;
            let result = self.execute_line(&action);
            self.nesting -= 1;
            result
        } else {
            self.emit("⏭️ Condition not met");
            Ok(())
        }
    }

    /// Evaluate `<left> <op> <right>`.  Text without a usable operator is
    /// simply false.
    pub fn eval_condition(&mut self, cond: &str) -> Result<bool, HspError> {
        for (sym, op) in CmpOp::SCAN_ORDER {
            if !cond.contains(sym) {
                continue;
            }
            let parts: Vec<&str> = cond.split(sym).collect();
            if let [lhs, rhs] = parts[..] {
                let left = self.eval_operand(lhs);
                let right = self.eval_operand(rhs);
                return compare(op, &left, &right);
            }
        }
        Ok(false)
    }

    fn eval_operand(&mut self, token: &str) -> Value {
        let token = token.trim();
        if token.starts_with(MATH_PREFIX) {
            Value::Num(self.evaluate_math(token))
        } else if let Some(name) = token.strip_prefix('#') {
            self.vars.get_or_zero(name)
        } else {
            Value::parse_lenient(token)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn with_x(x: f64) -> Interpreter {
        let mut interp = Interpreter::with_seed(0);
        interp.run(&format!("#x = {x}"));
        interp
    }

    #[test]
    fn two_char_operators_win() {
        let mut interp = with_x(5.0);
        assert!(interp.eval_condition("#x>=5").unwrap());
        assert!(!interp.eval_condition("#x>5").unwrap());
        assert!(interp.eval_condition("#x<=5").unwrap());
        assert!(!interp.eval_condition("#x<5").unwrap());
        assert!(interp.eval_condition("#x == 5").unwrap());
        assert!(!interp.eval_condition("#x != 5").unwrap());
    }

    #[test]
    fn undefined_variable_is_zero() {
        let mut interp = Interpreter::with_seed(0);
        assert!(interp.eval_condition("#ghost == 0").unwrap());
    }

    #[test]
    fn math_operands() {
        let mut interp = with_x(3.0);
        assert!(interp.eval_condition("&A(#x * 2) > 5").unwrap());
    }

    #[test]
    fn string_comparisons() {
        let mut interp = Interpreter::with_seed(0);
        interp.run("#rank = \"SSR\"");
        assert!(interp.eval_condition("#rank == SSR").unwrap());
        assert!(interp.eval_condition("#rank != SR").unwrap());
        assert!(interp.eval_condition("abc < abd").unwrap());
    }

    #[test]
    fn mixed_types() {
        let mut interp = Interpreter::with_seed(0);
        assert!(!interp.eval_condition("5 == five").unwrap());
        assert!(interp.eval_condition("5 != five").unwrap());
        assert!(matches!(
            interp.eval_condition("5 > five"),
            Err(HspError::Incomparable { .. })
        ));
    }

    #[test]
    fn no_operator_is_false() {
        let mut interp = with_x(1.0);
        assert!(!interp.eval_condition("#x").unwrap());
        assert!(!interp.eval_condition("").unwrap());
    }

    #[test]
    fn ambiguous_split_falls_through() {
        // Three `==` parts are not a comparison; no other operator matches.
        let mut interp = Interpreter::with_seed(0);
        assert!(!interp.eval_condition("1 == 1 == 1").unwrap());
    }

    #[test]
    fn met_condition_dispatches_action() {
        let mut interp = with_x(10.0);
        interp.run("?(#x > 5) ⇒ #y = 1");
        assert_eq!(
            interp.output,
            vec!["✅ Condition met, running: #y = 1", "📊 #y = 1"]
        );
        assert_eq!(interp.var("y"), Some(&Value::Num(1.0)));
    }

    #[test]
    fn unmet_condition_does_nothing() {
        let mut interp = with_x(1.0);
        interp.run("?(#x > 5) ⇒ #y = 1");
        assert_eq!(interp.output, vec!["⏭️ Condition not met"]);
        assert!(interp.var("y").is_none());
    }

    #[test]
    fn nested_conditions() {
        let mut interp = with_x(7.0);
        interp.run("?(#x > 5) ⇒ ?(#x < 10) ⇒ ¢, between #x");
        assert_eq!(interp.output.last().unwrap(), "between 7");
    }

    #[test]
    fn runaway_nesting_is_an_error() {
        let mut interp = Interpreter::with_seed(0);
        let chain = "?(1 == 1) ⇒ ".repeat(5_000);
        interp.run(&format!("{chain}¢, deep\n¢, next"));
        let n = interp.output.len();
        assert_eq!(interp.output[n - 2], "❌ Error: conditions nest more than 64 deep");
        assert_eq!(interp.output[n - 1], "next");
        assert_eq!(n - 2, MAX_NESTING);
    }

    #[test]
    fn goal_flag_in_condition() {
        let mut interp = Interpreter::with_seed(0);
        interp.run("(100:/SSR)#sure\n<$SSR,#sure×1,*10>\n?(#$SSR == 1) ⇒ ¢, got it");
        assert_eq!(interp.output.last().unwrap(), "got it");
    }

    #[test]
    fn incomparable_caught_by_run() {
        let mut interp = Interpreter::with_seed(0);
        interp.run("?(5 > five) ⇒ #y = 1\n¢, next");
        assert_eq!(interp.output[0], "❌ Error: cannot compare number with string");
        assert_eq!(interp.output[1], "next");
    }
}

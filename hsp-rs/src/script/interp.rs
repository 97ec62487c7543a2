//! HSP interpreter session and line dispatcher.
//!
//! The [`Interpreter`] owns every piece of session state: variables, pools,
//! the most recent loop record, run statistics, the output log, and the RNG.
//! Statements are classified one line at a time by [`classify`] and routed to
//! exactly one handler.  Handlers append human-readable messages to
//! [`Interpreter::output`]; printing and timestamping belong to the caller.

use std::path::Path;
use std::time::{Duration, Instant};

use log::{debug, warn};
use once_cell::sync::Lazy;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use regex::{Captures, Regex};

use super::{
    error::HspError,
    expr::{eval_str, EvalContext},
    pool::{Pool, PoolStore},
    prob::parse_probability,
    record::LoopRecord,
    value::Value,
    vars::VarStore,
};

/// Opening marker of a math call; the envelope closes with `)`.
pub const MATH_PREFIX: &str = "&A(";
/// Reference to the rate of the most recent loop record.
pub const PREV_RATE: &str = "#¢.rate";

static POOL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\((.+?):/(.+?)\)#(.+)").expect("valid regex"));
static ASSIGN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#(.+?)\s*=\s*(.+)").expect("valid regex"));
static VAR_REF_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#(\w+)").expect("valid regex"));

// ── LineKind ──────────────────────────────────────────────────────────────────

/// Statement kinds, in dispatch priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind {
    /// `¢,text`: print text with `#name` substitution.
    Print,
    /// `(prob:/a,b,c)#name`
    Pool,
    /// `<$item,#pool×batch,*guarantee>`
    Goal,
    /// `#name = value`
    Assign,
    /// `&A(expr)`
    Math,
    /// `#¢{label}±(times)`
    LoopRecord,
    Stats,
    Clear,
    /// `?(cond) ⇒ action`
    Condition,
    /// Anything else; echoed back with a pending marker.
    Pending,
}

/// Classify a trimmed line.  The first matching marker wins.
pub fn classify(line: &str) -> LineKind {
    if line.starts_with("¢,") {
        LineKind::Print
    } else if line.contains(")#") && line.contains(":/") {
        LineKind::Pool
    } else if line.starts_with('<') && line.contains(",*") {
        LineKind::Goal
    } else if line.starts_with('#') && line.contains('=') {
        LineKind::Assign
    } else if line.starts_with(MATH_PREFIX) {
        LineKind::Math
    } else if line.starts_with("#¢{") && line.contains("}±") {
        LineKind::LoopRecord
    } else if line == "#stats" {
        LineKind::Stats
    } else if line == "#clear" {
        LineKind::Clear
    } else if line.starts_with('?') && line.contains('⇒') {
        LineKind::Condition
    } else {
        LineKind::Pending
    }
}

/// `¢` starts a comment, except for the `¢,` print statement.
pub fn is_comment(line: &str) -> bool {
    line.starts_with('¢') && !line.starts_with("¢,")
}

pub(super) fn strip_ws(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect()
}

pub(super) fn parse_count(s: &str) -> Result<u64, HspError> {
    s.parse().map_err(|_| HspError::InvalidCount(s.to_owned()))
}

// ── RunStats ──────────────────────────────────────────────────────────────────

/// Counters reset at the start of every batch run.
#[derive(Debug, Clone)]
pub struct RunStats {
    /// Lines dispatched (comments and blank lines excluded).
    pub lines: u64,
    /// Goals that ended with a random hit.
    pub successes: u64,
    /// Draws consumed by all goals.
    pub draws: u64,
    pub started: Instant,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            lines: 0,
            successes: 0,
            draws: 0,
            started: Instant::now(),
        }
    }
}

impl RunStats {
    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// `successes / draws` as a percentage, if any draw happened.
    pub fn success_rate(&self) -> Option<f64> {
        (self.draws > 0).then(|| self.successes as f64 / self.draws as f64 * 100.0)
    }
}

// ── Interpreter ───────────────────────────────────────────────────────────────

/// One interpreter session.
pub struct Interpreter {
    pub(super) vars: VarStore,
    pub(super) pools: PoolStore,
    pub(super) last_record: Option<LoopRecord>,
    pub(super) stats: RunStats,
    pub(super) rng: ChaCha8Rng,
    /// Current depth of condition actions dispatching further statements.
    pub(super) nesting: usize,
    /// Messages emitted so far.  Reset by [`Interpreter::run`].
    pub output: Vec<String>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalContext for Interpreter {
    fn get_var(&self, name: &str) -> Option<Value> {
        self.vars.get(name).cloned()
    }
}

impl Interpreter {
    /// A session whose draws are seeded from OS entropy.
    pub fn new() -> Self {
        Self::with_rng(ChaCha8Rng::from_entropy())
    }

    /// A session with reproducible draws.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    fn with_rng(rng: ChaCha8Rng) -> Self {
        Interpreter {
            vars: VarStore::new(),
            pools: PoolStore::new(),
            last_record: None,
            stats: RunStats::default(),
            rng,
            nesting: 0,
            output: Vec::new(),
        }
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn vars(&self) -> &VarStore {
        &self.vars
    }

    pub fn pool(&self, name: &str) -> Option<&Pool> {
        self.pools.find(name)
    }

    pub fn pools(&self) -> &PoolStore {
        &self.pools
    }

    pub fn last_record(&self) -> Option<&LoopRecord> {
        self.last_record.as_ref()
    }

    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    pub(super) fn emit(&mut self, msg: impl Into<String>) {
        self.output.push(msg.into());
    }

    // ── Entry points ──────────────────────────────────────────────────────────

    /// Run a whole script and return the output log.
    ///
    /// The log and the run statistics are reset first.  Blank lines and
    /// comments are skipped; a failing statement is reported and the run
    /// continues with the next line.
    pub fn run(&mut self, src: &str) -> &[String] {
        self.output.clear();
        self.stats = RunStats::default();

        for raw in src.lines() {
            let line = raw.trim();
            if line.is_empty() || is_comment(line) {
                continue;
            }
            self.stats.lines = self.stats.lines.saturating_add(1);
            self.exec_guarded(line);
        }
        &self.output
    }

    /// Read a script file and [`run`](Interpreter::run) it.
    pub fn run_file(&mut self, path: &Path) -> Result<&[String], HspError> {
        let src = std::fs::read_to_string(path)?;
        debug!("running {}", path.display());
        Ok(self.run(&src))
    }

    /// Execute one line typed at an interactive prompt.
    ///
    /// Unlike [`Interpreter::run`] the log is not reset.  Returns the
    /// messages this line produced.
    pub fn exec_interactive(&mut self, line: &str) -> &[String] {
        let start = self.output.len();
        let line = line.trim();
        if !line.is_empty() && !is_comment(line) {
            self.stats.lines = self.stats.lines.saturating_add(1);
            self.exec_guarded(line);
        }
        &self.output[start..]
    }

    fn exec_guarded(&mut self, line: &str) {
        if let Err(e) = self.execute_line(line) {
            warn!("line rejected: {line:?}: {e}");
            self.emit(format!("❌ Error: {e}"));
        }
    }

    /// Execute exactly one statement against the live session.
    pub fn execute_line(&mut self, line: &str) -> Result<(), HspError> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(());
        }
        let kind = classify(line);
        debug!("{kind:?}: {line}");

        match kind {
            LineKind::Print => {
                let text = self.format_text(line["¢,".len()..].trim());
                self.emit(text);
                Ok(())
            }
            LineKind::Pool => self.define_pool(line),
            LineKind::Goal => self.execute_goal(line),
            LineKind::Assign => self.assign_variable(line),
            LineKind::Math => {
                let result = self.evaluate_math(line);
                self.emit(format!("= {}", Value::Num(result)));
                Ok(())
            }
            LineKind::LoopRecord => self.run_loop_record(line),
            LineKind::Stats => {
                self.report_stats();
                Ok(())
            }
            LineKind::Clear => {
                self.vars.clear();
                self.emit("🧹 Variables cleared");
                Ok(())
            }
            LineKind::Condition => self.execute_condition(line),
            LineKind::Pending => {
                self.emit(format!("⏳ {line}"));
                Ok(())
            }
        }
    }

    // ── Text and math ─────────────────────────────────────────────────────────

    /// Replace every `#name` whose variable exists with its display form.
    /// Unknown references are left as written.
    pub fn format_text(&self, text: &str) -> String {
        VAR_REF_RE
            .replace_all(text, |caps: &Captures| match self.vars.get(&caps[1]) {
                Some(v) => v.to_string(),
                None => caps[0].to_owned(),
            })
            .into_owned()
    }

    /// Evaluate a math call `&A(expr)`.
    ///
    /// Failures are reported in the log and yield `0`.
    pub fn evaluate_math(&mut self, text: &str) -> f64 {
        let text = text.trim();
        let inner = text.strip_prefix(MATH_PREFIX).unwrap_or(text);
        let inner = inner.strip_suffix(')').unwrap_or(inner);
        match eval_str(inner, &*self) {
            Ok(x) => x,
            Err(e) => {
                self.emit(format!("⚠️ Math error: {e}"));
                0.0
            }
        }
    }

    // ── Pools ─────────────────────────────────────────────────────────────────

    /// Handle `(prob:/item1,item2,…)#name`.
    pub fn define_pool(&mut self, line: &str) -> Result<(), HspError> {
        let compact = strip_ws(line);
        let Some(caps) = POOL_RE.captures(&compact) else {
            self.emit(format!("⚠️ Pool format error: {compact}"));
            return Ok(());
        };
        let probability = parse_probability(&caps[1])?;
        let items: Vec<String> = caps[2].split(',').map(|s| s.trim().to_owned()).collect();
        let count = items.len();

        let Some(pool) = Pool::new(&caps[3], probability, items) else {
            self.emit(format!("⚠️ Pool format error: {compact}"));
            return Ok(());
        };
        let msg = format!(
            "📦 Pool '{}' ({count} items, {}%)",
            pool.name,
            Value::Num(probability)
        );
        self.pools.upsert(pool);
        self.emit(msg);
        Ok(())
    }

    // ── Assignment ────────────────────────────────────────────────────────────

    /// Handle `#name = value`.
    pub fn assign_variable(&mut self, line: &str) -> Result<(), HspError> {
        let Some(caps) = ASSIGN_RE.captures(line) else {
            self.emit(format!("⚠️ Assignment format error: {line}"));
            return Ok(());
        };
        let name = caps[1].to_owned();
        let rhs = caps[2].trim();

        let value = if rhs == PREV_RATE {
            Value::Num(self.last_record.map_or(0.0, |r| r.rate))
        } else if rhs.starts_with(MATH_PREFIX) {
            Value::Num(self.evaluate_math(rhs))
        } else if let Some(s) = rhs
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
        {
            Value::Str(s.to_owned())
        } else {
            Value::parse_lenient(rhs)
        };

        self.emit(format!("📊 #{name} = {value}"));
        self.vars.set(&name, value);
        Ok(())
    }

    // ── Stats ─────────────────────────────────────────────────────────────────

    fn report_stats(&mut self) {
        let rule = "=".repeat(50);
        let mut lines = vec![
            rule.clone(),
            "📊 Statistics".to_owned(),
            rule.clone(),
            format!("Elapsed: {:.2}s", self.stats.elapsed().as_secs_f64()),
            format!("Lines executed: {}", self.stats.lines),
            format!("Total draws: {}", self.stats.draws),
            format!("Successes: {}", self.stats.successes),
        ];
        if let Some(rate) = self.stats.success_rate() {
            lines.push(format!("Success rate: {rate:.4}%"));
        }
        lines.push(format!("Variables: {}", self.vars.len()));
        lines.push(format!("Pools: {}", self.pools.len()));
        if !self.vars.is_empty() {
            lines.push("📋 Variable list:".to_owned());
            lines.extend(
                self.vars
                    .iter()
                    .take(10)
                    .map(|(name, v)| format!("  #{name} = {v}")),
            );
        }
        lines.push(rule);
        self.output.extend(lines);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Interpreter {
        Interpreter::with_seed(7)
    }

    fn output(src: &str) -> Vec<String> {
        session().run(src).to_vec()
    }

    #[test]
    fn classify_priority_order() {
        assert_eq!(classify("¢, hello #x"), LineKind::Print);
        assert_eq!(classify("(6:/A,B)#std"), LineKind::Pool);
        assert_eq!(classify("<$A,#std×10,*90>"), LineKind::Goal);
        assert_eq!(classify("#x = 5"), LineKind::Assign);
        assert_eq!(classify("&A(1+1)"), LineKind::Math);
        assert_eq!(classify("#¢{pull}±(10)"), LineKind::LoopRecord);
        assert_eq!(classify("#stats"), LineKind::Stats);
        assert_eq!(classify("#clear"), LineKind::Clear);
        assert_eq!(classify("?(#x > 1) ⇒ #stats"), LineKind::Condition);
        assert_eq!(classify("hello"), LineKind::Pending);
    }

    #[test]
    fn assignment_outranks_loop_record() {
        // A loop-record label containing `=` is claimed by assignment first.
        assert_eq!(classify("#¢{a=b}±(3)"), LineKind::Assign);
    }

    #[test]
    fn comment_lines_skipped() {
        let out = output("¢ a comment\n\n   \n¢, shown");
        assert_eq!(out, vec!["shown"]);
    }

    #[test]
    fn print_substitutes_known_vars_only() {
        let out = output("#x = 3.14159\n#name = \"Kiana\"\n¢, #name rolled #x, #unknown stays");
        assert_eq!(out.last().unwrap(), "Kiana rolled 3.1416, #unknown stays");
    }

    #[test]
    fn assignment_forms() {
        let mut interp = session();
        interp.run("#a = 12\n#b = \"SSR card\"\n#c = &A(2^3)\n#d = not a number");
        assert_eq!(interp.var("a"), Some(&Value::Num(12.0)));
        assert_eq!(interp.var("b"), Some(&Value::Str("SSR card".into())));
        assert_eq!(interp.var("c"), Some(&Value::Num(8.0)));
        assert_eq!(interp.var("d"), Some(&Value::Str("not a number".into())));
        assert_eq!(interp.output[0], "📊 #a = 12");
    }

    #[test]
    fn assignment_round_trip_format() {
        let out = output("#x = 3.14159");
        assert_eq!(out, vec!["📊 #x = 3.1416"]);
    }

    #[test]
    fn prev_rate_without_record_is_zero() {
        let mut interp = session();
        interp.run("#r = #¢.rate");
        assert_eq!(interp.var("r"), Some(&Value::Num(0.0)));
    }

    #[test]
    fn math_statement_prints_result() {
        assert_eq!(output("&A(2^3)"), vec!["= 8"]);
        assert_eq!(output("&A(#nothing + 1)"), vec!["= 1"]);
    }

    #[test]
    fn math_error_reports_and_yields_zero() {
        let out = output("&A(1/0)");
        assert_eq!(out, vec!["⚠️ Math error: division by zero", "= 0"]);
    }

    #[test]
    fn deeply_nested_math_is_reported() {
        let n = 10_000;
        let src = format!("&A({}1{})\n¢, next", "(".repeat(n), ")".repeat(n));
        let out = output(&src);
        assert_eq!(
            out,
            vec!["⚠️ Math error: expression nests too deeply", "= 0", "next"]
        );
    }

    #[test]
    fn string_var_in_math_is_reported() {
        let mut interp = session();
        interp.run("#s = \"abc\"\n#y = &A(#s + 1)");
        assert_eq!(interp.var("y"), Some(&Value::Num(0.0)));
        assert!(interp.output.iter().any(|l| l.starts_with("⚠️ Math error")));
    }

    #[test]
    fn pool_definition() {
        let mut interp = session();
        interp.run("(6:/A, B , C,D)#limited");
        let pool = interp.pool("limited").unwrap();
        assert_eq!(pool.items, ["A", "B", "C", "D"]);
        assert_eq!(pool.per_item, 1.5);
        assert_eq!(interp.output, vec!["📦 Pool 'limited' (4 items, 6%)"]);
    }

    #[test]
    fn pool_scientific_probability() {
        let mut interp = session();
        interp.run("(1.7/-97:/Miracle)#void");
        let pool = interp.pool("void").unwrap();
        assert!((pool.probability / 1.7e-97 - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pool_redefinition_overwrites() {
        let mut interp = session();
        interp.run("(6:/A,B)#p\n(2:/Z)#p");
        let pool = interp.pool("p").unwrap();
        assert_eq!(pool.items, ["Z"]);
        assert_eq!(interp.pools().len(), 1);
    }

    #[test]
    fn pool_format_error_changes_nothing() {
        let mut interp = session();
        interp.run("(6:/)#p x");
        assert!(interp.pools().is_empty());
        assert!(interp.output[0].starts_with("⚠️ Pool format error"));
    }

    #[test]
    fn bad_probability_caught_by_run() {
        let mut interp = session();
        interp.run("(lots:/A)#p\n¢, still running");
        assert!(interp.pools().is_empty());
        assert_eq!(interp.output[0], "❌ Error: invalid probability 'lots'");
        assert_eq!(interp.output[1], "still running");
    }

    #[test]
    fn pending_lines_echoed() {
        assert_eq!(output("draw some cards"), vec!["⏳ draw some cards"]);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut interp = session();
        interp.run("#clear\n#clear");
        assert!(interp.vars().is_empty());
        assert_eq!(interp.output, vec!["🧹 Variables cleared"; 2]);
    }

    #[test]
    fn clear_empties_store() {
        let mut interp = session();
        interp.run("#x = 1\n#y = 2\n#clear");
        assert!(interp.vars().is_empty());
    }

    #[test]
    fn stats_report() {
        let mut interp = session();
        interp.run("(100:/A)#sure\n<$A,#sure×1,*10>\n#x = 2\n#stats");
        let out = &interp.output;
        assert!(out.iter().any(|l| l == "Lines executed: 4"));
        assert!(out.iter().any(|l| l == "Total draws: 1"));
        assert!(out.iter().any(|l| l == "Successes: 1"));
        assert!(out.iter().any(|l| l == "Success rate: 100.0000%"));
        assert!(out.iter().any(|l| l == "Pools: 1"));
        assert!(out.iter().any(|l| l == "  #x = 2"));
    }

    #[test]
    fn stats_lists_at_most_ten_vars() {
        let mut interp = session();
        let script: String = (0..15).map(|i| format!("#v{i} = {i}\n")).collect();
        interp.run(&format!("{script}#stats"));
        let listed = interp.output.iter().filter(|l| l.starts_with("  #v")).count();
        assert_eq!(listed, 10);
        assert!(interp.output.iter().any(|l| l == "  #v0 = 0"));
        assert!(!interp.output.iter().any(|l| l == "  #v10 = 10"));
    }

    #[test]
    fn run_resets_log_and_stats() {
        let mut interp = session();
        interp.run("#x = 1\n#y = 2");
        assert_eq!(interp.stats().lines, 2);
        let out = interp.run("#z = 3").to_vec();
        assert_eq!(out, vec!["📊 #z = 3"]);
        assert_eq!(interp.stats().lines, 1);
        // Variables survive across runs.
        assert!(interp.var("x").is_some());
    }

    #[test]
    fn run_file_reads_script() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("draws.hsp");
        std::fs::write(&path, "¢ header\n#x = 4\n").unwrap();
        let mut interp = session();
        assert_eq!(interp.run_file(&path).unwrap(), ["📊 #x = 4"]);
        assert!(matches!(
            interp.run_file(&dir.path().join("missing.hsp")),
            Err(HspError::Io(_))
        ));
    }

    #[test]
    fn interactive_appends_without_reset() {
        let mut interp = session();
        assert_eq!(interp.exec_interactive("#x = 1"), ["📊 #x = 1"]);
        assert_eq!(interp.exec_interactive("¢, x is #x"), ["x is 1"]);
        assert!(interp.exec_interactive("¢ comment").is_empty());
        assert_eq!(interp.output.len(), 2);
        assert_eq!(interp.stats().lines, 2);
    }
}

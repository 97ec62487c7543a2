//! Loop records: `#¢{<label>}±(<times>)`.
//!
//! Runs `times` independent trials, each succeeding with probability one
//! half.  Pools are not consulted.  The outcome becomes the session's
//! [`LoopRecord`] and is mirrored into `¢.success`, `¢.total` and `¢.rate`.

use log::{debug, trace};
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use super::{
    error::HspError,
    interp::{parse_count, Interpreter},
};

static LOOP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^#¢\{(.+?)\}±\s*\((\d+)\)").expect("valid regex"));

const TRIAL_PROBABILITY: f64 = 0.5;

/// Outcome of the most recent loop record.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LoopRecord {
    pub successes: u64,
    pub total: u64,
    /// `successes / total * 100`.
    pub rate: f64,
}

impl LoopRecord {
    pub fn failures(&self) -> u64 {
        self.total - self.successes
    }
}

impl Interpreter {
    /// Handle a loop-record statement.
    pub fn run_loop_record(&mut self, line: &str) -> Result<(), HspError> {
        let Some(caps) = LOOP_RE.captures(line) else {
            self.emit(format!("⚠️ Loop format error: {line}"));
            return Ok(());
        };
        let times = parse_count(&caps[2])?;
        if times == 0 {
            return Err(HspError::InvalidCount(caps[2].to_owned()));
        }
        debug!("loop record {:?} x{times}", &caps[1]);

        self.emit(format!("🔄 Loop {times} times"));

        let step = (times / 10).max(1);
        let mut successes = 0u64;
        for i in 1..=times {
            if self.rng.gen::<f64>() < TRIAL_PROBABILITY {
                successes += 1;
            }
            if i % step == 0 {
                let pct = i as f64 / times as f64 * 100.0;
                self.emit(format!("⏳ {pct:.0}% ({i}/{times})"));
            }
        }
        trace!("loop record done: {successes}/{times}");

        let record = LoopRecord {
            successes,
            total: times,
            rate: successes as f64 / times as f64 * 100.0,
        };
        self.emit(format!(
            "📊 Success rate: {:.1}% ({successes}/{times})",
            record.rate
        ));

        self.last_record = Some(record);
        self.vars.set("¢.success", record.successes);
        self.vars.set("¢.total", record.total);
        self.vars.set("¢.rate", record.rate);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! Goal statements: simulated draws against a pool with a pity guarantee.
//!
//! Syntax (whitespace is insignificant):
//!
//! ```text
//! <$<item>,#<pool>×<batch>,*<guarantee>>
//! ```
//!
//! `*` is accepted in place of `×`.  Draws proceed in checkpoints of `batch`
//! pulls.  Each checkpoint makes one roll against the pool's per-item
//! probability; the first hit ends the goal.  Reaching `guarantee` without a
//! hit still obtains the item.

use log::trace;
use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;

use super::{
    error::HspError,
    interp::{parse_count, strip_ws, Interpreter},
};

static GOAL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"<\$(.+?),#(.+?)[×*](\d+),\*(\d+)>").expect("valid regex"));

/// Name of the flag variable set when `item` is obtained.
pub fn item_var(item: &str) -> String {
    format!("${item}")
}

impl Interpreter {
    /// Handle a goal statement.
    pub fn execute_goal(&mut self, line: &str) -> Result<(), HspError> {
        let compact = strip_ws(line);
        let Some(caps) = GOAL_RE.captures(&compact) else {
            self.emit(format!("⚠️ Goal format error: {compact}"));
            return Ok(());
        };
        let item = caps[1].to_owned();
        let pool_name = &caps[2];
        let batch = parse_count(&caps[3])?;
        let guarantee = parse_count(&caps[4])?;

        let Some(per_item) = self.pools.find(pool_name).map(|p| p.per_item) else {
            self.emit(format!("❌ Pool '{pool_name}' not found"));
            return Ok(());
        };
        if batch == 0 {
            return Err(HspError::InvalidCount(caps[3].to_owned()));
        }

        self.emit(format!(
            "🎯 Goal: {item}, guaranteed by draw {guarantee} ({batch} per pull)"
        ));

        let mut checkpoint: u64 = 1;
        while checkpoint <= guarantee {
            let draws = checkpoint.saturating_add(batch - 1).min(guarantee);
            let roll = self.rng.gen::<f64>() * 100.0;
            trace!("checkpoint {checkpoint}: roll {roll} vs {per_item}");

            if roll < per_item {
                self.emit(format!("✨ Got {item} on draw {draws}!"));
                self.stats.successes = self.stats.successes.saturating_add(1);
                self.stats.draws = self.stats.draws.saturating_add(draws);
                self.vars.set(&item_var(&item), 1.0);
                return Ok(());
            }
            if draws % 10 == 0 {
                self.emit(format!("⏳ {draws} draws so far..."));
            }
            match checkpoint.checked_add(batch) {
                Some(next) => checkpoint = next,
                None => break,
            }
        }

        self.emit(format!("🎯 Pity: {item} guaranteed on draw {guarantee}"));
        self.stats.draws = self.stats.draws.saturating_add(guarantee);
        self.vars.set(&item_var(&item), 1.0);
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

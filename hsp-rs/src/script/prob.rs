//! Probability literals.
//!
//! | Form | Meaning |
//! |------|---------|
//! | `1.7/-97` | `1.7 × 10⁻⁹⁷` |
//! | `1.7/+80` | `1.7 × 10⁸⁰` |
//! | `0.6/`    | `0.6` (the slash is a unit marker) |
//! | `50`      | `50` |
//!
//! Results are percentages on a 0–100 scale.

use super::error::HspError;

/// Parse a probability literal.  Fails with [`HspError::Format`] when the
/// text matches none of the accepted forms.
pub fn parse_probability(text: &str) -> Result<f64, HspError> {
    let text = text.trim();
    let bad = || HspError::Format(text.to_owned());

    if let Some((mantissa, exp)) = text.split_once("/-") {
        let m: f64 = mantissa.trim().parse().map_err(|_| bad())?;
        let e: i32 = exp.trim().parse().map_err(|_| bad())?;
        return Ok(m * 10f64.powi(-e));
    }
    if let Some((mantissa, exp)) = text.split_once("/+") {
        let m: f64 = mantissa.trim().parse().map_err(|_| bad())?;
        let e: i32 = exp.trim().parse().map_err(|_| bad())?;
        return Ok(m * 10f64.powi(e));
    }
    if let Some(number) = text.strip_suffix('/') {
        return number.trim().parse().map_err(|_| bad());
    }
    text.parse().map_err(|_| bad())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

//! `hsprc` settings file parser.
//!
//! | Line | Action |
//! |------|--------|
//! | `seed = <u64>` | fixed RNG seed |
//! | `timestamps = on\|off` | prefix output with `[HH:MM:SS]` |
//! | `color = on\|off` | dim the timestamp prefix |
//! | `prelude = <path>` | script run before anything else |
//! | Lines starting with `;` | comment, ignored |
//!
//! Environment overrides are applied afterwards: `HSP_SEED` replaces the
//! file seed and a non-empty `NO_COLOR` turns colour off.

use std::path::{Path, PathBuf};

// ── Public API ────────────────────────────────────────────────────────────────

/// A non-fatal error encountered while loading a settings file.
#[derive(Debug)]
pub struct ConfigError {
    pub line: usize,
    pub message: String,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

impl std::error::Error for ConfigError {}

/// Front-end settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub seed: Option<u64>,
    pub timestamps: bool,
    pub color: bool,
    pub prelude: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seed: None,
            timestamps: true,
            color: true,
            prelude: None,
        }
    }
}

impl Settings {
    /// Parse a settings string.
    ///
    /// Bad lines are reported and skipped; the remaining lines still apply.
    pub fn load_str(s: &str) -> (Self, Vec<ConfigError>) {
        let mut settings = Settings::default();
        let mut errors = Vec::new();

        for (i, raw) in s.lines().enumerate() {
            let lineno = i + 1;
            let line = raw.trim();

            if line.is_empty() || line.starts_with(';') {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                errors.push(ConfigError {
                    line: lineno,
                    message: format!("expected key = value: {line}"),
                });
                continue;
            };
            if let Err(message) = settings.apply(key.trim(), value.trim()) {
                errors.push(ConfigError { line: lineno, message });
            }
        }

        (settings, errors)
    }

    /// Load and parse a settings file from `path`.
    pub fn load_file(path: &Path) -> std::io::Result<(Self, Vec<ConfigError>)> {
        let content = std::fs::read_to_string(path)?;
        Ok(Self::load_str(&content))
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(seed) = lookup("HSP_SEED").and_then(|s| s.trim().parse().ok()) {
            self.seed = Some(seed);
        }
        if lookup("NO_COLOR").is_some_and(|v| !v.is_empty()) {
            self.color = false;
        }
    }

    fn apply(&mut self, key: &str, value: &str) -> Result<(), String> {
        match key {
            "seed" => {
                let seed = value.parse().map_err(|_| format!("invalid seed: {value}"))?;
                self.seed = Some(seed);
            }
            "timestamps" => self.timestamps = parse_flag(value)?,
            "color" | "colour" => self.color = parse_flag(value)?,
            "prelude" => {
                if value.is_empty() {
                    return Err("prelude needs a path".to_owned());
                }
                self.prelude = Some(PathBuf::from(value));
            }
            other => return Err(format!("unknown setting: {other}")),
        }
        Ok(())
    }
}

fn parse_flag(value: &str) -> Result<bool, String> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "on" | "yes" | "true" => Ok(true),
        "0" | "off" | "no" | "false" => Ok(false),
        _ => Err(format!("expected on/off, got {value}")),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

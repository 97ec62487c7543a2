//! Terminal output: optional `[HH:MM:SS]` prefix and colour.

use std::io::{self, Write};

use chrono::{Local, NaiveTime};
use crossterm::style::{style, Stylize};

/// Formats interpreter messages for the terminal.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    pub timestamps: bool,
    pub color: bool,
}

impl Renderer {
    pub fn new(timestamps: bool, color: bool) -> Self {
        Self { timestamps, color }
    }

    /// Format `msg` as if it were printed at `time`.
    pub fn render_at(&self, msg: &str, time: NaiveTime) -> String {
        let body = if self.color { colorize(msg) } else { msg.to_owned() };
        if !self.timestamps {
            return body;
        }
        let stamp = format!("[{}]", time.format("%H:%M:%S"));
        if self.color {
            format!("{} {body}", style(stamp).dim())
        } else {
            format!("{stamp} {body}")
        }
    }

    pub fn render(&self, msg: &str) -> String {
        self.render_at(msg, Local::now().time())
    }

    /// Write every line in `lines`, one per row.
    pub fn write_lines(&self, out: &mut impl Write, lines: &[String]) -> io::Result<()> {
        for line in lines {
            writeln!(out, "{}", self.render(line))?;
        }
        out.flush()
    }
}

// Failures red, warnings yellow, everything else untouched.
fn colorize(msg: &str) -> String {
    if msg.starts_with('❌') {
        style(msg).red().to_string()
    } else if msg.starts_with('⚠') {
        style(msg).yellow().to_string()
    } else {
        msg.to_owned()
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn noon() -> NaiveTime {
        NaiveTime::from_hms_opt(12, 3, 4).unwrap()
    }

    #[test]
    fn plain_with_timestamp() {
        let r = Renderer::new(true, false);
        assert_eq!(r.render_at("= 42", noon()), "[12:03:04] = 42");
    }

    #[test]
    fn plain_without_timestamp() {
        let r = Renderer::new(false, false);
        assert_eq!(r.render_at("= 42", noon()), "= 42");
    }

    #[test]
    fn colored_timestamp_keeps_text() {
        let r = Renderer::new(true, true);
        let s = r.render_at("= 42", noon());
        assert!(s.contains("[12:03:04]"));
        assert!(s.ends_with(" = 42"));
        assert!(s.contains('\x1b'));
    }

    #[test]
    fn errors_colored_only_with_color() {
        let msg = "❌ Error: invalid count '0'";
        assert_eq!(Renderer::new(false, false).render_at(msg, noon()), msg);
        let colored = Renderer::new(false, true).render_at(msg, noon());
        assert_ne!(colored, msg);
        assert!(colored.contains(msg));
    }

    #[test]
    fn write_lines_one_per_row() {
        let r = Renderer::new(false, false);
        let mut buf = Vec::new();
        r.write_lines(&mut buf, &["a".to_owned(), "b".to_owned()]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "a\nb\n");
    }
}

/// End-to-end tests: run scripts through the `hsp` binary and check stdout.
///
/// Every invocation passes `-q` (no banner, no timestamps) and `-f` (skip
/// the settings file) so output is independent of the user's environment.

use std::io::Write;
use std::process::{Command, Output, Stdio};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn binary() -> std::path::PathBuf {
    std::path::PathBuf::from(env!("CARGO_BIN_EXE_hsp"))
}

fn hsp(args: &[&str]) -> Command {
    let mut cmd = Command::new(binary());
    cmd.args(["-q", "-f"])
        .args(args)
        .env_remove("HSP_SEED")
        .env("NO_COLOR", "1");
    cmd
}

fn stdout_lines(out: &Output) -> Vec<String> {
    String::from_utf8_lossy(&out.stdout)
        .lines()
        .map(str::to_owned)
        .collect()
}

/// Pipe `input` into an interactive session.
fn interactive(args: &[&str], input: &str) -> Output {
    let mut child = hsp(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn hsp binary");
    child
        .stdin
        .as_mut()
        .expect("stdin not open")
        .write_all(input.as_bytes())
        .expect("write to stdin");
    child.wait_with_output().expect("wait for hsp")
}

// ── Script files ──────────────────────────────────────────────────────────────

#[test]
fn runs_script_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "¢ pools").unwrap();
    writeln!(file, "(6:/A, B, C)#std").unwrap();
    writeln!(file, "#n = &A(2 ^ 10)").unwrap();
    writeln!(file, "¢, n is #n").unwrap();
    file.flush().unwrap();

    let out = hsp(&[file.path().to_str().unwrap()]).output().unwrap();
    assert!(out.status.success());
    assert_eq!(
        stdout_lines(&out),
        ["📦 Pool 'std' (3 items, 6%)", "📊 #n = 1024", "n is 1024"]
    );
}

#[test]
fn missing_script_exits_one() {
    let out = hsp(&["/no/such/script.hsp"]).output().unwrap();
    assert_eq!(out.status.code(), Some(1));
    let err = String::from_utf8_lossy(&out.stderr);
    assert!(err.contains("file not found: /no/such/script.hsp"), "{err}");
}

#[test]
fn bad_usage_exits_two() {
    let out = hsp(&["-z"]).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&out.stderr).contains("Usage: hsp"));
}

#[test]
fn help_prints_usage() {
    let out = hsp(&["--help"]).output().unwrap();
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).starts_with("Usage: hsp"));
}

// ── -e and seeding ────────────────────────────────────────────────────────────

#[test]
fn eval_flag() {
    let out = hsp(&["-e", "&A(10 ÷ 4)"]).output().unwrap();
    assert_eq!(stdout_lines(&out), ["= 2.5"]);
}

#[test]
fn seeded_runs_match() {
    let script = "(3:/A)#p\n<$A,#p×1,*300>\n#¢{x}±(40)";
    let a = hsp(&["-s", "11", "-e", script]).output().unwrap();
    let b = hsp(&["-s", "11", "-e", script]).output().unwrap();
    assert!(a.status.success());
    assert_eq!(a.stdout, b.stdout);
}

#[test]
fn env_seed_used_without_flag() {
    let script = "#¢{x}±(40)";
    let a = hsp(&["-e", script]).env("HSP_SEED", "5").output().unwrap();
    let b = hsp(&["-s5", "-e", script]).output().unwrap();
    assert_eq!(a.stdout, b.stdout);
}

// ── Settings file ─────────────────────────────────────────────────────────────

#[test]
fn explicit_settings_prelude() {
    let dir = tempfile::tempdir().unwrap();
    let prelude = dir.path().join("pools.hsp");
    std::fs::write(&prelude, "(100:/X)#sure\n").unwrap();
    let rc = dir.path().join("hsprc");
    std::fs::write(&rc, format!("timestamps = off\nprelude = {}\n", prelude.display())).unwrap();

    let rc_arg = format!("-f{}", rc.display());
    let out = Command::new(binary())
        .args(["-q", &rc_arg, "-e", "<$X,#sure×10,*90>"])
        .env("NO_COLOR", "1")
        .output()
        .unwrap();
    let lines = stdout_lines(&out);
    assert_eq!(lines[0], "📦 Pool 'sure' (1 items, 100%)");
    assert_eq!(lines.last().unwrap(), "✨ Got X on draw 10!");
}

// ── Interactive ───────────────────────────────────────────────────────────────

#[test]
fn interactive_session_keeps_state() {
    let out = interactive(&["-i"], "#x = 2\n&A(#x * 21)\nquit\n&A(1)\n");
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("📊 #x = 2"));
    assert!(stdout.contains("= 42"));
    assert!(!stdout.contains("= 1\n"), "input after quit must be ignored");
}

#[test]
fn interactive_stops_at_eof() {
    let out = interactive(&[], "#clear\n");
    assert!(out.status.success());
    assert!(String::from_utf8_lossy(&out.stdout).contains("🧹 Variables cleared"));
}

#[test]
fn interactive_continues_after_script() {
    let out = interactive(&["-i", "-e", "#x = 5"], "¢, x=#x\nexit\n");
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.starts_with("📊 #x = 5\n"));
    assert!(stdout.contains("x=5"));
}

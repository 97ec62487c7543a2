//! Command-line argument parsing.
//!
//! Usage:
//!   hsp [-i] [-q] [-s<seed>] [-f[<file>]] [<script>]
//!   hsp [-i] [-q] [-s<seed>] [-f[<file>]] -e<code>

use std::path::PathBuf;

pub const USAGE: &str = "\
Usage: hsp [-i] [-q] [-s<seed>] [-f[<file>]] [<script>]
       hsp [-i] [-q] [-s<seed>] [-f[<file>]] -e<code>

  <script>    run a script file
  -e<code>    run code given on the command line
  -i          interactive prompt (default when nothing else is given;
              after a script or -e, continue interactively)
  -s<seed>    seed the random draws for reproducible runs
  -q          quiet: no banner, no timestamps
  -f<file>    read settings from <file>; bare -f skips the settings file
  -h, --help  show this help";

// ── Public types ──────────────────────────────────────────────────────────────

/// Parsed command-line arguments.
#[derive(Debug, Default)]
pub struct CliArgs {
    /// What to run before (or instead of) the interactive prompt.
    pub source: Source,
    /// Enter the interactive prompt even when a source was given (`-i`).
    pub interactive: bool,
    /// Which settings file to load.
    pub config: ConfigFile,
    /// RNG seed (`-s<seed>`).
    pub seed: Option<u64>,
    /// No banner, no timestamps (`-q`).
    pub quiet: bool,
    /// `-h` / `--help`.
    pub help: bool,
}

/// Script source named on the command line.
#[derive(Debug, Default, PartialEq, Eq)]
pub enum Source {
    #[default]
    None,
    /// `-e<code>`
    Eval(String),
    /// Positional script path.
    File(PathBuf),
}

/// How to choose the settings file.
#[derive(Debug, Default, PartialEq, Eq)]
pub enum ConfigFile {
    /// `$HSP_CONFIG`, the platform config dir, then `./.hsprc` (default).
    #[default]
    Search,
    /// `-f` with no file argument: skip the settings file.
    Skip,
    /// `-f<file>`: load this specific file.
    Explicit(PathBuf),
}

impl CliArgs {
    /// Whether the interactive prompt should run.
    pub fn wants_prompt(&self) -> bool {
        self.interactive || self.source == Source::None
    }
}

// ── Parsing ───────────────────────────────────────────────────────────────────

/// Parse `std::env::args()` and return [`CliArgs`] or an error message.
pub fn parse_args() -> Result<CliArgs, String> {
    let raw: Vec<String> = std::env::args().collect();
    parse_argv(raw.get(1..).unwrap_or_default())
}

/// Parse a slice of argument strings (exposed for testing).
pub fn parse_argv(argv: &[String]) -> Result<CliArgs, String> {
    let mut args = CliArgs::default();
    let mut positional: Vec<String> = Vec::new();
    let mut i = 0;

    while i < argv.len() {
        let arg = argv[i].as_str();

        if arg == "--help" {
            args.help = true;
            i += 1;
            continue;
        }

        // `--` ends flag processing.
        if arg == "--" {
            i += 1;
            positional.extend(argv[i..].iter().cloned());
            break;
        }

        // Non-flag argument.
        if !arg.starts_with('-') || arg == "-" {
            positional.push(arg.to_owned());
            i += 1;
            continue;
        }

        // Flag argument: iterate over characters after the leading `-`.
        let chars: Vec<char> = arg[1..].chars().collect();
        let mut j = 0;
        while j < chars.len() {
            match chars[j] {
                'i' => args.interactive = true,
                'q' => args.quiet = true,
                'h' => args.help = true,

                // -f[<file>]
                'f' => {
                    if j + 1 < chars.len() {
                        let file: String = chars[j + 1..].iter().collect();
                        args.config = ConfigFile::Explicit(PathBuf::from(file));
                        j = chars.len();
                    } else {
                        args.config = ConfigFile::Skip;
                    }
                }

                // -e<code>
                'e' => {
                    let code = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-e requires a code argument".to_owned());
                    };
                    args.source = Source::Eval(code);
                }

                // -s<seed>
                's' => {
                    let raw = if j + 1 < chars.len() {
                        let s: String = chars[j + 1..].iter().collect();
                        j = chars.len();
                        s
                    } else if i + 1 < argv.len() {
                        i += 1;
                        argv[i].clone()
                    } else {
                        return Err("-s requires a seed argument".to_owned());
                    };
                    let seed = raw
                        .parse()
                        .map_err(|_| format!("invalid seed: {raw}"))?;
                    args.seed = Some(seed);
                }

                c => return Err(format!("unknown option: -{c}")),
            }
            j += 1;
        }
        i += 1;
    }

    match positional.len() {
        0 => {}
        1 if args.source != Source::None => {
            return Err("cannot combine -e with a script file".to_owned());
        }
        1 => args.source = Source::File(PathBuf::from(positional.remove(0))),
        n => return Err(format!("too many arguments ({n})")),
    }

    Ok(args)
}

/// Search for a settings file.
///
/// Priority: `$HSP_CONFIG` → `<platform config dir>/hsp/hsprc` → `./.hsprc`.
pub fn find_user_config() -> Option<PathBuf> {
    let mut candidates = Vec::new();
    if let Ok(p) = std::env::var("HSP_CONFIG") {
        candidates.push(PathBuf::from(p));
    }
    if let Some(dirs) = directories::ProjectDirs::from("", "", "hsp") {
        candidates.push(dirs.config_dir().join("hsprc"));
    }
    candidates.push(PathBuf::from("./.hsprc"));
    candidates.into_iter().find(|p| p.exists())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

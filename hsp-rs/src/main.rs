use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use crossterm::tty::IsTty;
use log::{debug, warn};

use hsp::cli::{self, CliArgs, ConfigFile, Source};
use hsp::config::Settings;
use hsp::render::Renderer;
use hsp::script::{HspError, Interpreter};

const RULE: &str = "==================================================";

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = match cli::parse_args() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("hsp: {e}");
            eprintln!("{}", cli::USAGE);
            return ExitCode::from(2);
        }
    };
    if args.help {
        println!("{}", cli::USAGE);
        return ExitCode::SUCCESS;
    }

    let settings = load_settings(&args.config);
    let renderer = Renderer::new(
        settings.timestamps && !args.quiet,
        settings.color && io::stdout().is_tty(),
    );

    // ── Interpreter, seeded by -s, then HSP_SEED / hsprc ──────────────────────
    let mut interp = match args.seed.or(settings.seed) {
        Some(seed) => {
            debug!("seeding with {seed}");
            Interpreter::with_seed(seed)
        }
        None => Interpreter::new(),
    };

    if let Some(prelude) = &settings.prelude {
        match std::fs::read_to_string(prelude) {
            Ok(src) => print_lines(&renderer, interp.run(&src)),
            Err(e) => eprintln!("hsp: warning: prelude {}: {e}", prelude.display()),
        }
    }

    match &args.source {
        Source::None => {}
        Source::Eval(code) => print_lines(&renderer, interp.run(code)),
        Source::File(path) => match interp.run_file(path) {
            Ok(lines) => print_lines(&renderer, lines),
            Err(HspError::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                eprintln!("hsp: file not found: {}", path.display());
                return ExitCode::FAILURE;
            }
            Err(e) => {
                eprintln!("hsp: {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
    }

    if args.wants_prompt() {
        if let Err(e) = repl(&mut interp, &renderer, &args) {
            eprintln!("hsp: {e}");
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}

/// Resolve the settings file, then layer environment overrides on top.
fn load_settings(which: &ConfigFile) -> Settings {
    let path = match which {
        ConfigFile::Skip => None,
        ConfigFile::Explicit(p) => Some(p.clone()),
        ConfigFile::Search => cli::find_user_config(),
    };
    let mut settings = match path {
        None => Settings::default(),
        Some(path) => match Settings::load_file(&path) {
            Ok((settings, errors)) => {
                for e in errors {
                    eprintln!("hsp: {}: {e}", path.display());
                }
                settings
            }
            Err(e) => {
                eprintln!("hsp: warning: {}: {e}", path.display());
                Settings::default()
            }
        },
    };
    settings.apply_env(|k| std::env::var(k).ok());
    settings
}

fn print_lines(renderer: &Renderer, lines: &[String]) {
    if let Err(e) = renderer.write_lines(&mut io::stdout().lock(), lines) {
        warn!("stdout: {e}");
    }
}

fn repl(interp: &mut Interpreter, renderer: &Renderer, args: &CliArgs) -> io::Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();

    if !args.quiet {
        writeln!(stdout, "{RULE}")?;
        writeln!(stdout, "HSP interpreter v{}", env!("CARGO_PKG_VERSION"))?;
        writeln!(stdout, "Commands: #stats, #clear, exit")?;
        writeln!(stdout, "{RULE}")?;
    }

    let mut line = String::new();
    loop {
        write!(stdout, "HSP> ")?;
        stdout.flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let cmd = line.trim();
        if cmd.eq_ignore_ascii_case("exit") || cmd.eq_ignore_ascii_case("quit") {
            break;
        }
        if cmd.is_empty() {
            continue;
        }
        renderer.write_lines(&mut stdout, interp.exec_interactive(cmd))?;
    }
    writeln!(stdout)?;
    Ok(())
}

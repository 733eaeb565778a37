pub mod cli;
pub mod command;
pub mod config;
pub mod document;
pub mod engine;
pub mod error;
pub mod formatter;
pub mod fs;
pub mod parselet;
pub mod repl;
pub mod selector;
pub mod session;

use std::fs::File;
use std::io::BufReader;

use anyhow::{Context, Result};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use cli::Args;
use config::load_config;
use formatter::create_formatter;
use session::Session;

/// Run the shell. Returns the exit code: 0 = ok, 1 = a script command failed.
pub fn run(args: Args) -> Result<i32> {
    init_logging(args.debug);

    let config = load_config(args.config.as_deref())?;
    match config.source() {
        Some(path) => debug!(path = %path.display(), "config loaded"),
        None => debug!("no config file found"),
    }

    let mut session = Session::open(&args.input, args.parselet.clone(), &config)
        .with_context(|| format!("failed to load {}", args.input))?;

    if args.resume && args.parselet.exists() {
        let count = session.resume(&args.parselet)?;
        debug!(count, "resumed existing parselet");
    }

    let formatter = create_formatter(args.format_or(&config.format));
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &args.script {
        Some(path) => {
            let file = File::open(path)
                .with_context(|| format!("failed to open script {}", path.display()))?;
            match repl::run_script(&mut session, BufReader::new(file), &mut out, &*formatter) {
                Ok(count) => {
                    debug!(count, "script finished");
                    Ok(0)
                }
                Err(e) => {
                    eprintln!("error: {e:#}");
                    Ok(1)
                }
            }
        }
        None => {
            let stdin = std::io::stdin();
            repl::run_interactive(&mut session, stdin.lock(), &mut out, &*formatter)?;
            Ok(0)
        }
    }
}

/// Log to stderr. `RUST_LOG` takes precedence; otherwise `--debug` selects
/// debug level and the default is warnings only.
fn init_logging(debug: bool) {
    let default = if debug { "parselab=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .without_time()
        .try_init();
}

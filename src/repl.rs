//! Line-oriented front end: an interactive prompt and a script runner, both
//! driving [`command::dispatch`] over a session they own a handle to.

use std::io::{BufRead, Write};

use anyhow::{Context, Result};

use crate::command::{self, Command, Outcome};
use crate::formatter::Formatter;
use crate::session::{Session, SessionState};

const PROMPT: &str = ">>> ";

/// Parse and apply one line. `None` for blank lines and comments.
pub fn execute_line(session: &mut Session, line: &str) -> Result<Option<Outcome>> {
    let Some(command) = Command::parse(line)? else {
        return Ok(None);
    };
    Ok(Some(command::dispatch(session, command)?))
}

/// Interactive loop: prompt, read, apply, print, until `quit` or end of input.
/// Errors are reported and the loop carries on.
pub fn run_interactive(
    session: &mut Session,
    input: impl BufRead,
    out: &mut dyn Write,
    formatter: &dyn Formatter,
) -> Result<()> {
    writeln!(
        out,
        "Loaded {}; parselet will be saved to {}\n\n{}",
        session.document().source(),
        session.output().display(),
        command::HELP
    )?;

    let mut lines = input.lines();
    loop {
        write!(out, "{PROMPT}")?;
        out.flush()?;

        let Some(line) = lines.next() else {
            writeln!(out)?;
            break;
        };
        let line = line.context("failed to read input")?;

        match execute_line(session, &line) {
            Ok(Some(Outcome::Quit)) => break,
            Ok(Some(outcome)) => formatter.format_to(&outcome, out),
            Ok(None) => {}
            Err(e) => writeln!(out, "error: {e:#}")?,
        }
    }

    if session.state() == SessionState::Unsaved {
        writeln!(
            out,
            "note: unsaved changes were not written to {}",
            session.output().display()
        )?;
    }
    Ok(())
}

/// Run commands from `input` without prompting. Stops at the first failing
/// line; the error names its line number. Returns the number of commands run.
pub fn run_script(
    session: &mut Session,
    input: impl BufRead,
    out: &mut dyn Write,
    formatter: &dyn Formatter,
) -> Result<usize> {
    let mut executed = 0;
    for (idx, line) in input.lines().enumerate() {
        let line = line.context("failed to read script")?;
        let outcome = execute_line(session, &line)
            .with_context(|| format!("line {}: {}", idx + 1, line.trim()))?;
        match outcome {
            Some(Outcome::Quit) => break,
            Some(outcome) => {
                executed += 1;
                formatter.format_to(&outcome, out);
            }
            None => {}
        }
    }
    Ok(executed)
}

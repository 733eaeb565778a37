//! Shell commands: parsing input lines and applying them to a [`Session`].
//!
//! Arguments are separated by whitespace and may be quoted with `"` or `'`.
//! The last argument of `test`, `add*` takes the rest of the line, so
//! selector expressions can contain spaces without quoting:
//!
//! ```text
//! add_list items ul.results > li
//! add_nested items title h2 a
//! ```

use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

use crate::error::SessionError;
use crate::parselet::Parselet;
use crate::session::Session;

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^\s*(?:"([^"]*)"|'([^']*)'|(\S+))"#).expect("token pattern is valid")
});

pub const HELP: &str = "\
Available commands:

  test <expression>                  test a CSS expression (append @attr for attributes)
  fetch <url|file> [parselet]        load a new document; with a parselet path, start a new parselet
  extract                            run the extraction using the current parselet
  add <name> <expression>            add a simple property
  add_list <name> <expression>       add a list property
  add_object <name> <expression>     add an object property
  add_nested <parent> <name> <expr>  add a property to a list or object property
  remove <name>                      remove a property
  show                               print the current parselet
  save [path]                        write the parselet to disk
  new [parselet]                     discard the current parselet and start over
  load <path>                        continue from an existing parselet file
  help                               show this message
  quit                               leave the shell
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Test { expression: String },
    Fetch { source: String, parselet: Option<PathBuf> },
    Add { name: String, expression: String },
    AddList { name: String, expression: String },
    AddObject { name: String, expression: String },
    AddNested { parent: String, name: String, expression: String },
    Remove { name: String },
    Save { path: Option<PathBuf> },
    Extract,
    Show,
    New { parselet: Option<PathBuf> },
    Load { path: PathBuf },
    Help,
    Quit,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("unknown command {0:?} (type `help` for the list)")]
    Unknown(String),

    #[error("`{command}` is missing <{argument}>")]
    MissingArgument {
        command: &'static str,
        argument: &'static str,
    },

    #[error("`{command}` takes at most {max} argument(s)")]
    TooManyArguments { command: &'static str, max: usize },
}

/// Result of a successfully applied command.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Done,
    Value(Value),
    Saved(PathBuf),
    Parselet(Parselet),
    Message(String),
    Quit,
}

impl Command {
    /// Parse one input line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Command>, CommandError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (name, rest) = match line.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest),
            None => (line, ""),
        };

        let command = match name {
            "test" => {
                let ([], expression) = leading::<0>(rest, "test", "expression")?;
                Command::Test { expression }
            }
            "add" => {
                let ([name], expression) = leading::<1>(rest, "add", "expression")?;
                Command::Add { name, expression }
            }
            "add_list" => {
                let ([name], expression) = leading::<1>(rest, "add_list", "expression")?;
                Command::AddList { name, expression }
            }
            "add_object" => {
                let ([name], expression) = leading::<1>(rest, "add_object", "expression")?;
                Command::AddObject { name, expression }
            }
            "add_nested" => {
                let ([parent, name], expression) =
                    leading::<2>(rest, "add_nested", "expression")?;
                Command::AddNested { parent, name, expression }
            }
            "fetch" => {
                let mut args = bounded(rest, "fetch", 2)?.into_iter();
                let source = args.next().ok_or(CommandError::MissingArgument {
                    command: "fetch",
                    argument: "url|file",
                })?;
                Command::Fetch {
                    source,
                    parselet: args.next().map(PathBuf::from),
                }
            }
            "remove" => {
                let name = bounded(rest, "remove", 1)?.into_iter().next().ok_or(
                    CommandError::MissingArgument {
                        command: "remove",
                        argument: "name",
                    },
                )?;
                Command::Remove { name }
            }
            "save" => Command::Save {
                path: bounded(rest, "save", 1)?.pop().map(PathBuf::from),
            },
            "new" => Command::New {
                parselet: bounded(rest, "new", 1)?.pop().map(PathBuf::from),
            },
            "load" => {
                let path = bounded(rest, "load", 1)?.pop().ok_or(
                    CommandError::MissingArgument {
                        command: "load",
                        argument: "path",
                    },
                )?;
                Command::Load {
                    path: PathBuf::from(path),
                }
            }
            "extract" => no_args(rest, "extract", Command::Extract)?,
            "show" => no_args(rest, "show", Command::Show)?,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        Ok(Some(command))
    }
}

/// Apply a command to the session.
pub fn dispatch(session: &mut Session, command: Command) -> Result<Outcome, SessionError> {
    match command {
        Command::Test { expression } => session.test(&expression).map(Outcome::Value),
        Command::Fetch { source, parselet } => {
            session.fetch(&source, parselet)?;
            Ok(Outcome::Message(format!("loaded {source}")))
        }
        Command::Add { name, expression } => {
            session.add_simple(&name, &expression)?;
            Ok(Outcome::Done)
        }
        Command::AddList { name, expression } => {
            session.add_list(&name, &expression)?;
            Ok(Outcome::Done)
        }
        Command::AddObject { name, expression } => {
            session.add_object(&name, &expression)?;
            Ok(Outcome::Done)
        }
        Command::AddNested {
            parent,
            name,
            expression,
        } => {
            session.add_nested(&parent, &name, &expression)?;
            Ok(Outcome::Done)
        }
        Command::Remove { name } => {
            session.remove(&name)?;
            Ok(Outcome::Done)
        }
        Command::Save { path } => {
            let written = match path {
                Some(path) => session.persist(&path)?,
                None => session.save()?,
            };
            Ok(Outcome::Saved(written))
        }
        Command::Extract => session.extract().map(Outcome::Value),
        Command::Show => Ok(Outcome::Parselet(session.parselet().clone())),
        Command::New { parselet } => {
            session.start_new(parselet);
            Ok(Outcome::Message(format!(
                "new parselet, saving to {}",
                session.output().display()
            )))
        }
        Command::Load { path } => {
            let count = session.resume(&path)?;
            Ok(Outcome::Message(format!(
                "loaded {count} properties from {}",
                path.display()
            )))
        }
        Command::Help => Ok(Outcome::Message(HELP.to_string())),
        Command::Quit => Ok(Outcome::Quit),
    }
}

/// Split off the next argument, honoring quotes.
fn next_token(input: &str) -> Option<(String, &str)> {
    let caps = TOKEN.captures(input)?;
    let token = caps
        .get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map_or("", |m| m.as_str());
    let consumed = caps.get(0).map_or(0, |m| m.end());
    Some((token.to_string(), &input[consumed..]))
}

/// `N` leading arguments followed by a non-empty rest-of-line argument.
fn leading<const N: usize>(
    input: &str,
    command: &'static str,
    last: &'static str,
) -> Result<([String; N], String), CommandError> {
    let mut rest = input;
    let mut args: [String; N] = std::array::from_fn(|_| String::new());
    for slot in args.iter_mut() {
        let (token, remaining) = next_token(rest).ok_or(CommandError::MissingArgument {
            command,
            argument: "name",
        })?;
        *slot = token;
        rest = remaining;
    }

    let tail = unquote(rest.trim());
    if tail.is_empty() {
        return Err(CommandError::MissingArgument {
            command,
            argument: last,
        });
    }
    Ok((args, tail.to_string()))
}

/// Up to `max` plain arguments.
fn bounded(input: &str, command: &'static str, max: usize) -> Result<Vec<String>, CommandError> {
    let mut args = Vec::new();
    let mut rest = input;
    while let Some((token, remaining)) = next_token(rest) {
        args.push(token);
        rest = remaining;
    }
    if args.len() > max {
        return Err(CommandError::TooManyArguments { command, max });
    }
    Ok(args)
}

fn no_args(input: &str, command: &'static str, parsed: Command) -> Result<Command, CommandError> {
    if input.trim().is_empty() {
        Ok(parsed)
    } else {
        Err(CommandError::TooManyArguments { command, max: 0 })
    }
}

/// Strip one pair of matching surrounding quotes.
fn unquote(s: &str) -> &str {
    for quote in ['"', '\''] {
        if s.len() >= 2 && s.starts_with(quote) && s.ends_with(quote) {
            return &s[1..s.len() - 1];
        }
    }
    s
}

use std::io::Write;

use serde_json::Value;

use crate::command::Outcome;
use crate::formatter::Formatter;

/// Human-oriented output. Lists of plain strings (what `test` returns) print
/// one match per line; anything structured prints as indented JSON.
pub struct TextFormatter {
    indent: usize,
}

impl Default for TextFormatter {
    fn default() -> Self {
        Self { indent: 4 }
    }
}

impl Formatter for TextFormatter {
    fn format_to(&self, outcome: &Outcome, out: &mut dyn Write) {
        match outcome {
            Outcome::Done | Outcome::Quit => {}
            Outcome::Value(Value::Array(items)) if items.is_empty() => {
                let _ = writeln!(out, "(no matches)");
            }
            Outcome::Value(Value::Array(items)) if items.iter().all(Value::is_string) => {
                for item in items.iter().filter_map(Value::as_str) {
                    let _ = writeln!(out, "{item}");
                }
            }
            Outcome::Value(value) => {
                // Safe to unwrap: Value always serializes successfully
                let _ = writeln!(out, "{}", serde_json::to_string_pretty(value).unwrap());
            }
            Outcome::Saved(path) => {
                let _ = writeln!(out, "Wrote parselet: {}", path.display());
            }
            Outcome::Parselet(parselet) => match parselet.to_json(self.indent) {
                Ok(text) => {
                    let _ = write!(out, "{text}");
                }
                Err(e) => {
                    let _ = writeln!(out, "error: {e}");
                }
            },
            Outcome::Message(message) => {
                let _ = writeln!(out, "{}", message.trim_end());
            }
        }
    }
}

use std::io::Write;

use serde::Serialize;

use crate::command::Outcome;
use crate::formatter::Formatter;

/// Machine-readable output: every outcome is one JSON document.
pub struct JsonFormatter;

#[derive(Serialize)]
#[serde(rename_all = "snake_case")]
enum JsonOutput<'a> {
    Saved { path: String },
    Message { message: &'a str },
}

impl Formatter for JsonFormatter {
    fn format_to(&self, outcome: &Outcome, out: &mut dyn Write) {
        // Safe to unwrap: our types always serialize successfully
        let text = match outcome {
            Outcome::Done | Outcome::Quit => return,
            Outcome::Value(value) => serde_json::to_string_pretty(value).unwrap(),
            Outcome::Parselet(parselet) => serde_json::to_string_pretty(parselet).unwrap(),
            Outcome::Saved(path) => serde_json::to_string_pretty(&JsonOutput::Saved {
                path: path.display().to_string(),
            })
            .unwrap(),
            Outcome::Message(message) => {
                serde_json::to_string_pretty(&JsonOutput::Message { message }).unwrap()
            }
        };
        let _ = writeln!(out, "{text}");
    }
}

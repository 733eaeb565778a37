pub mod json;
pub mod text;

use std::io::Write;

use crate::command::Outcome;

pub trait Formatter {
    fn format_to(&self, outcome: &Outcome, out: &mut dyn Write);
}

pub fn create_formatter(format: &str) -> Box<dyn Formatter> {
    match format {
        "json" => Box::new(json::JsonFormatter),
        // "text" and any unknown value
        _ => Box::new(text::TextFormatter::default()),
    }
}

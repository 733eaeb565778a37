use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(
    name = "parselab",
    version,
    about = "Interactive shell for building parselets against an HTML document"
)]
pub struct Args {
    /// Path the parselet is saved to (.json, or .yml/.yaml for YAML)
    pub parselet: PathBuf,

    /// URL or file to load
    pub input: String,

    /// Path to configuration file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format for command results [default: from config, else text]
    #[arg(short, long, value_parser = ["text", "json"])]
    pub format: Option<String>,

    /// Run commands from FILE instead of prompting, stopping at the first error
    #[arg(short, long, value_name = "FILE")]
    pub script: Option<PathBuf>,

    /// Start from the existing parselet file instead of an empty one
    #[arg(long)]
    pub resume: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// The result format: `--format` wins over the config file.
    pub fn format_or<'a>(&'a self, configured: &'a str) -> &'a str {
        self.format.as_deref().unwrap_or(configured)
    }
}

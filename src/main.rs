use std::process;

use clap::Parser;

use parselab::cli::Args;

fn main() {
    let args = Args::parse();
    match parselab::run(args) {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            process::exit(3);
        }
    }
}

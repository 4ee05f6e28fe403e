//! `rollcall` command-line entry point.
//!
//! # Responsibility
//! - Act as scan trigger and administrative surface over `rollcall_core`.
//! - Print every response as JSON on stdout.

use clap::Parser;

mod cli;
mod commands;

fn main() {
    if let Err(error) = run() {
        eprintln!("rollcall error: {error:#}");
        std::process::exit(1);
    }
}

fn run() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    let output = commands::dispatch(cli)?;
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

mod commands;
mod config;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{diff, render, DiffArgs, RenderArgs};
use tracing_subscriber::EnvFilter;

/// Quire CLI - render document snapshots and analyze edits
#[derive(Parser, Debug)]
#[command(name = "quire")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a model snapshot and print the HTML of every surface
    Render(RenderArgs),

    /// Compute the edit operations between two texts
    Diff(DiffArgs),
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?.display().to_string();

    match cli.command {
        Command::Render(args) => render(args, &cwd),
        Command::Diff(args) => diff(args),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run(Cli::parse()) {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{apply, inspect, ApplyArgs, InspectArgs};
use pagekit_editor::EditorConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Pagekit CLI - inspect and script block-based pages
#[derive(Parser, Debug)]
#[command(name = "pagekit")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Editor config file (defaults to ./pagekit.config.json if present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log editor activity
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the blocks of a stored page
    Inspect(InspectArgs),

    /// Run an edit script against a stored page
    Apply(ApplyArgs),
}

fn init_logging(verbose: bool) {
    let default = if verbose { "pagekit_editor=debug,pagekit=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(path: Option<&PathBuf>) -> Result<EditorConfig> {
    let config = match path {
        Some(path) => EditorConfig::load(path)?,
        None => EditorConfig::load_or_default(&std::env::current_dir()?)?,
    };
    Ok(config)
}

fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_ref())?;

    match cli.command {
        Command::Inspect(args) => inspect(args, &config),
        Command::Apply(args) => apply(args, &config),
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

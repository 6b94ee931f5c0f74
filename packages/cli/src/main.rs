mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{fmt, from_json, to_json, Context, FmtArgs, FromJsonArgs, ToJsonArgs};
use std::path::PathBuf;

/// Scribe CLI - markdown and document-tree conversions
#[derive(Parser, Debug)]
#[command(name = "scribe")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Editor config file (defaults to ./scribe.config.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print normalized markdown
    Fmt(FmtArgs),

    /// Print the document tree of a markdown file as JSON
    ToJson(ToJsonArgs),

    /// Print the markdown for a JSON document tree
    FromJson(FromJsonArgs),
}

fn main() {
    // logs go to stderr so command output can be piped
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();

    let result = Context::load(cli.config.as_deref()).and_then(|ctx| match cli.command {
        Command::Fmt(args) => fmt(args, &ctx),
        Command::ToJson(args) => to_json(args, &ctx),
        Command::FromJson(args) => from_json(args, &ctx),
    });

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {:#}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}

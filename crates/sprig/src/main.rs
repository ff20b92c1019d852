//! sprig - inline-script capture transformer
//!
//! CLI driver for rewriting `useInlineTask` calls in component sources.

mod commands;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};

/// Inline-script capture transformer
#[derive(Parser, Debug)]
#[command(name = "sprig")]
#[command(author, version, about = "Rewrite inline-script hooks for server rendering")]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, global = true, default_value = "text")]
    format: OutputFormat,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Transform one file, writing the rewritten source and its source map
    Transform(commands::transform::TransformArgs),

    /// Walk a directory and report every inline-task call site
    Scan(commands::scan::ScanArgs),
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color;

    match cli.command {
        Commands::Transform(args) => {
            commands::transform::run(args, cli.format, use_color, cli.quiet)
        }
        Commands::Scan(args) => commands::scan::run(args, cli.format, use_color, cli.quiet),
    }
}

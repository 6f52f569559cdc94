//! CLI application for exporting invoice batches as a BI star schema.

mod commands;
mod writers;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{classify, config, export};

/// Invostar - Turn invoice batches into star-schema tables for BI tools
#[derive(Parser)]
#[command(name = "invostar")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build and write the star schema for a batch of invoices
    Export(export::ExportArgs),

    /// Run the field classifiers on free text
    Classify(classify::ClassifyArgs),

    /// Manage configuration
    Config(config::ConfigArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Export(args) => export::run(args, cli.config.as_deref()),
        Commands::Classify(args) => classify::run(args),
        Commands::Config(args) => config::run(args, cli.config.as_deref()),
    }
}

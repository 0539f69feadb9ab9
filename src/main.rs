//! Strata CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Budgeted call-graph context for per-function code analysis", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a context bundle per unit and write them as JSON lines
    Bundle {
        /// JSON array of code units
        #[arg(short, long)]
        units: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Only build bundles for these unit names (repeatable)
        #[arg(short, long)]
        target: Vec<String>,

        /// Write to this file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Abort a single bundle that takes longer than this many milliseconds
        #[arg(long)]
        time_limit_ms: Option<u64>,
    },
    /// Show the relations and API surface verdict of one unit
    Inspect {
        /// JSON array of code units
        #[arg(short, long)]
        units: PathBuf,

        /// TOML configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Unit name
        name: String,
    },
    /// Print the default configuration as TOML
    Config,
    /// Show version
    Version,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries the JSON output.
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "strata={log_level},strata_core={log_level},strata_context={log_level}"
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Commands::Bundle {
            units,
            config,
            target,
            output,
            time_limit_ms,
        } => commands::bundle(commands::BundleArgs {
            units,
            config,
            targets: target,
            output,
            time_limit_ms,
        }),
        Commands::Inspect {
            units,
            config,
            name,
        } => commands::inspect(&units, config.as_deref(), &name),
        Commands::Config => commands::print_config(),
        Commands::Version => {
            println!("Strata v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

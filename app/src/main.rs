#![deny(
    clippy::all,
    clippy::nursery,
    clippy::pedantic,
    clippy::style,
    clippy::complexity,
    clippy::perf,
    clippy::correctness,
    clippy::suspicious,
    clippy::unwrap_used,
    clippy::expect_used
)]
#![allow(
    clippy::similar_names,
    clippy::missing_safety_doc,
    clippy::missing_panics_doc,
    clippy::missing_errors_doc
)]

mod command;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use command::{
    CheckConfigStrategy, CommandStrategy, InitStrategy, RunInput, RunStrategy, VersionStrategy,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "alvin")]
#[command(about = "Enrich metadata records with Alvin lineage", long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the extract -> enrich -> load task
    Run {
        /// JSON-lines file of source records
        #[arg(short, long)]
        input: PathBuf,

        /// JSON-lines file to write records to
        #[arg(short, long)]
        output: PathBuf,

        /// Config file (defaults to ~/alvin/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Pass records through without calling the lineage service
        #[arg(long)]
        no_enrich: bool,
    },
    /// Validate and print the effective configuration
    CheckConfig {
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Initialize configuration
    Init,
    /// Show version
    Version,
}

fn init_tracing(verbose: u8) -> anyhow::Result<()> {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    match cli.command {
        Commands::Run {
            input,
            output,
            config,
            no_enrich,
        } => {
            RunStrategy
                .execute(RunInput {
                    input,
                    output,
                    config,
                    no_enrich,
                })
                .await
        }
        Commands::CheckConfig { config } => CheckConfigStrategy.execute(config).await,
        Commands::Init => InitStrategy.execute(()).await,
        Commands::Version => VersionStrategy.execute(()).await,
    }
}

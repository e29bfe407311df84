// gridfeed entry point.
//
// Startup sequence:
// 1. Parse arguments
// 2. Initialize tracing (stderr; stdout carries the run summary)
// 3. Load config, apply and validate CLI overrides
// 4. Build the row source
// 5. Run the chosen pipeline for each season

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use gridfeed_core::config::{self, Config, Overrides, SourceKind};
use gridfeed_core::pipeline::{self, RunOptions, RunSummary};
use gridfeed_core::source;

#[derive(Parser)]
#[command(name = "gridfeed")]
#[command(about = "Export normalized NFL roster and fantasy data for the front end")]
#[command(version)]
struct Cli {
    /// Project directory: holds config/ and defaults/, and relative paths in
    /// the configuration resolve against it
    #[arg(long, default_value = ".")]
    base_dir: PathBuf,

    /// Season to export (repeatable); overrides `seasons` in the config
    #[arg(long = "season")]
    seasons: Vec<u16>,

    /// Row source: http, csv or cache
    #[arg(long, value_parser = parse_source_kind)]
    source: Option<SourceKind>,

    /// Accept invalid TLS certificates for this run's downloads
    #[arg(long)]
    insecure: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Season document with PPR points and per-game averages
    Season {
        /// Skip writing the row cache
        #[arg(long)]
        no_cache: bool,
    },
    /// Identity-focused roster with external ids
    Roster {
        /// Skip writing the row cache
        #[arg(long)]
        no_cache: bool,
    },
}

fn parse_source_kind(s: &str) -> Result<SourceKind, String> {
    s.parse()
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing()?;

    let config = config::load_config(&cli.base_dir)
        .context("failed to load configuration")?
        .with_overrides(&cli.overrides())
        .context("invalid command-line option")?;
    info!(
        "Config loaded: seasons {:?}, source {:?}",
        config.seasons, config.source.kind
    );

    match cli.command {
        Command::Season { no_cache } => {
            let source = source::build_source(&config.source, config.season.cache.as_deref())?;
            let options = run_options(&config, no_cache);
            for &season in &config.seasons {
                let summary = pipeline::run_season(&config, source.as_ref(), season, options).await?;
                print_summary(&summary);
            }
        }
        Command::Roster { no_cache } => {
            let source = source::build_source(&config.source, config.roster.cache.as_deref())?;
            let options = run_options(&config, no_cache);
            for &season in &config.seasons {
                let summary = pipeline::run_roster(&config, source.as_ref(), season, options).await?;
                print_summary(&summary);
            }
        }
    }

    Ok(())
}

/// Replaying the cache must not rewrite the file being read.
fn run_options(config: &Config, no_cache: bool) -> RunOptions {
    RunOptions {
        write_cache: !no_cache && config.source.kind != SourceKind::Cache,
    }
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            seasons: self.seasons.clone(),
            source: self.source,
            insecure: self.insecure,
        }
    }
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Saved {} players to {}",
        summary.count,
        summary.output.display()
    );
    if let Some(cache) = &summary.cache {
        println!("Cached source rows to {}", cache.display());
    }
}

/// Initialize tracing to stderr so stdout stays clean for the summary line.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("gridfeed_core=info,gridfeed_cli=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}

//! # Authority Enrich CLI (`enrich`)
//!
//! Enriches the persons, places and organizations of a TEI authority list
//! with facts from Wikidata, the GND and GeoNames.
//!
//! ## Usage
//!
//! ```bash
//! enrich --config ./config/enrich.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `enrich persons` | Merge Wikidata and GND facts into every `person` |
//! | `enrich places` | Add GeoNames details and pointers to every `place` |
//! | `enrich organizations` | Copy every `org` into the organizations list |
//! | `enrich all` | Run the three passes in order |
//! | `enrich check` | List inputs and knowledge bases and their status |
//!
//! Diagnostics go through `tracing`; set `RUST_LOG=authority_enrich=debug`
//! to see every request.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use authority_enrich::config;
use authority_enrich::organizations::run_organizations;
use authority_enrich::persons::run_persons;
use authority_enrich::places::run_places;
use authority_enrich::progress::ProgressMode;
use authority_enrich::sources;

/// Authority Enrich CLI: enrich a TEI authority list from external
/// knowledge bases.
///
/// All commands accept a `--config` flag pointing to a TOML configuration
/// file. See `config/enrich.example.toml` for a full example.
#[derive(Parser)]
#[command(
    name = "enrich",
    about = "Enrich a TEI authority list with Wikidata, GND and GeoNames facts",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/enrich.toml")]
    config: PathBuf,

    /// Per-record progress on stderr. Defaults to `human` when stderr is a
    /// terminal and `off` otherwise.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Enrich persons from Wikidata (first) and the GND (second).
    ///
    /// Writes `<output.dir>/persons.xml`. Any failed lookup aborts the run
    /// before the output is written.
    Persons,

    /// Enrich places from GeoNames and add Wikidata pointers.
    Places,

    /// Copy organizations into the organizations list.
    Organizations,

    /// Run persons, places and organizations in that order.
    All,

    /// Show configured inputs and knowledge bases.
    Check,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;
    let reporter = cli
        .progress
        .unwrap_or_else(ProgressMode::default_for_tty)
        .reporter();

    match cli.command {
        Commands::Persons => {
            run_persons(&cfg, reporter.as_ref())?.print("persons");
        }
        Commands::Places => {
            run_places(&cfg, reporter.as_ref())?.print("places");
        }
        Commands::Organizations => {
            run_organizations(&cfg, reporter.as_ref())?.print("organizations");
        }
        Commands::All => {
            run_persons(&cfg, reporter.as_ref())?.print("persons");
            run_places(&cfg, reporter.as_ref())?.print("places");
            run_organizations(&cfg, reporter.as_ref())?.print("organizations");
        }
        Commands::Check => {
            sources::list_sources(&cfg)?;
        }
    }

    Ok(())
}

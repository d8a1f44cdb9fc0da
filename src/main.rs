//! # JJBA Wiki CLI (`wiki`)
//!
//! The `wiki` binary runs the one-shot migration jobs that rebuild the
//! document store from the relational source, and serves the read-only API.
//!
//! ## Usage
//!
//! ```bash
//! wiki --config ./config/wiki.toml <command>
//! ```
//!
//! ## Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `wiki migrate personagens` | Rebuild `personagens` with stands and participations |
//! | `wiki migrate partes` | Rebuild `partes` with embedded episodes |
//! | `wiki migrate extras` | Rebuild `grupos` and `batalhas`, then enrich characters |
//! | `wiki migrate all` | All of the above, in order |
//! | `wiki enrich` | Enrich existing character documents |
//! | `wiki stats` | Document counts and fingerprints per collection |
//! | `wiki serve` | Start the HTTP API |
//!
//! Connection strings come from `pgConnectionString` and
//! `mongoConnectionString`, read from the environment or a `.env` file.
//!
//! ## Examples
//!
//! ```bash
//! # Full rebuild, eight characters in flight
//! wiki migrate all --concurrency 8
//!
//! # Collect per-character failures instead of stopping at the first one
//! wiki migrate extras --keep-going
//!
//! # Serve the API and the front end in ./public
//! wiki serve
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use jjba_wiki::config::{self, Config};
use jjba_wiki::ingest::{self, ErrorPolicy, JobOptions, MigrateTarget};
use jjba_wiki::{enrich, server, stats};

/// JJBA Wiki: relational → document migration jobs and a read-only API.
#[derive(Parser)]
#[command(name = "wiki", version, about)]
struct Cli {
    /// Path to configuration file (TOML).
    ///
    /// Defaults to `./config/wiki.toml`. A missing file means defaults;
    /// connection strings from the environment override file values.
    #[arg(long, global = true, default_value = "./config/wiki.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a migration job.
    ///
    /// Each job clears its target collection before writing, so running it
    /// again over the same source produces the same documents.
    Migrate {
        /// Which job to run.
        #[arg(value_enum)]
        target: MigrateTarget,

        #[command(flatten)]
        run: RunArgs,
    },

    /// Add abilities, affiliations and relationships to existing characters.
    Enrich {
        #[command(flatten)]
        run: RunArgs,
    },

    /// Show document counts and content fingerprints per collection.
    Stats,

    /// Start the HTTP API.
    Serve,
}

#[derive(Args)]
struct RunArgs {
    /// Record per-entity failures and continue instead of stopping.
    #[arg(long)]
    keep_going: bool,

    /// Entities processed concurrently (overrides `[etl].concurrency`).
    #[arg(long)]
    concurrency: Option<usize>,

    /// Read and shape everything, write nothing.
    #[arg(long)]
    dry_run: bool,
}

impl RunArgs {
    fn options(&self, cfg: &Config) -> JobOptions {
        let policy = if self.keep_going || cfg.etl.keep_going {
            ErrorPolicy::KeepGoing
        } else {
            ErrorPolicy::Abort
        };
        JobOptions {
            concurrency: self.concurrency.unwrap_or(cfg.etl.concurrency).max(1),
            policy,
            dry_run: self.dry_run,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(&cli.config)?;

    match cli.command {
        Commands::Migrate { target, run } => {
            ingest::run_migrate(&cfg, target, run.options(&cfg)).await?;
        }
        Commands::Enrich { run } => {
            enrich::run_enrich(&cfg, run.options(&cfg)).await?;
        }
        Commands::Stats => {
            stats::run_stats(&cfg).await?;
        }
        Commands::Serve => {
            server::run_server(&cfg).await?;
        }
    }

    Ok(())
}

//! vqi-builder - Venue Quality Index builder
//!
//! Each subcommand builds one index file under the output folder:
//! - `ranks`     `Venue,Rank` list under a named scale (CORE, ABDC, CCF, VHB, ABS, ...)
//! - `scimago`   SCImago export → best SJR quartile per journal
//! - `h5`        Google-Scholar-Orderer rankings → max h5-index per venue
//! - `lists`     one-venue-per-line membership list (FT50, UTD24, ERA, predatory)
//! - `clarivate` Web of Science journal listing, optionally with per-journal reports

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vqi_builder::clients::ClarivateClient;
use vqi_builder::config::resolve_clarivate_api_key;
use vqi_builder::output::{write_errors, write_index, write_json_atomic, yearly_file_name};
use vqi_builder::lists::{MembershipList, LISTS};
use vqi_builder::pipeline::{
    build_membership_index, build_rank_index, sync_clarivate, validate_edition, ClarivateOptions,
};
use vqi_builder::rank::{RankScale, CATALOGUE, H5, SJR};
use vqi_builder::{sources, BuildError};
use vqi_common::config::{load_toml_config, resolve_config_path, resolve_output_dir, TomlConfig};

const MODULE_NAME: &str = "vqi-builder";

/// Command-line arguments for vqi-builder
#[derive(Parser, Debug)]
#[command(name = "vqi-builder")]
#[command(about = "Build venue quality indexes from ranking lists and metric APIs")]
#[command(version)]
struct Args {
    /// Output folder (default: VQI_OUTPUT_DIR, then TOML output_dir, then ./output)
    #[arg(long, global = true)]
    out: Option<PathBuf>,

    /// Config file (default: VQI_CONFIG, then <config dir>/vqi/vqi-builder.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Merge a `Venue,Rank` CSV under one ranking scale
    Ranks {
        /// Scale id: sjr, jcr, core, abdc, ccf, vhb, abs, h5, norwegian
        #[arg(long)]
        scale: String,
        /// Input CSV
        input: PathBuf,
        /// Source label written to the index metadata
        #[arg(long)]
        name: Option<String>,
    },
    /// Best SJR quartile per journal from a SCImago CSV export
    Scimago {
        input: PathBuf,
        #[arg(long)]
        year: u32,
    },
    /// Max h5-index per venue from Google-Scholar-Orderer rankings JSON
    H5 { input: PathBuf },
    /// Index a one-venue-per-line membership list
    Lists {
        /// List id: ft50, utd24, era2023, predatory
        #[arg(long)]
        list: String,
        /// Input text file
        input: PathBuf,
        /// Source label written to the index metadata
        #[arg(long)]
        name: Option<String>,
    },
    /// Sync the Clarivate Web of Science journal listing
    Clarivate {
        /// JCR year (e.g. 2024)
        #[arg(long)]
        year: u32,
        /// SCIE, SSCI, AHCI or ESCI
        #[arg(long)]
        edition: Option<String>,
        /// Page size for the journal listing
        #[arg(long)]
        limit: Option<u32>,
        /// Fetch per-journal reports for full metrics (many API calls)
        #[arg(long)]
        with_reports: bool,
        /// Concurrent report fetches
        #[arg(long)]
        workers: Option<usize>,
        /// Seconds to pause after each report call per worker
        #[arg(long)]
        sleep: Option<f64>,
        /// Retries per report call
        #[arg(long)]
        retries: Option<u32>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = resolve_config_path(args.config.as_deref(), MODULE_NAME);
    let toml_config = match &config_path {
        Some(path) => load_toml_config(path).context("Failed to load configuration")?,
        None => TomlConfig::default(),
    };

    // RUST_LOG wins over the configured level
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| toml_config.logging.level.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("vqi-builder {}", env!("CARGO_PKG_VERSION"));

    let out_dir = resolve_output_dir(args.out.as_deref(), &toml_config);
    info!("Output folder: {}", out_dir.display());

    match args.command {
        Command::Ranks { scale, input, name } => {
            let scale = RankScale::by_id(&scale).ok_or_else(|| unknown_scale(&scale))?;
            let rows = sources::read_rank_list(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let label = name.unwrap_or_else(|| scale.label.to_string());

            let build = build_rank_index(scale, &rows);
            let meta = build.meta(&label, scale, file_name(&input).as_deref());
            let path = out_dir.join(format!("{}_ranks.json", scale.id));
            write_index(&path, &meta, &build.snapshot)?;
        }

        Command::Scimago { input, year } => {
            let rows = sources::read_scimago(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;

            let build = build_rank_index(&SJR, &rows);
            let mut meta = build.meta("SCImago Journal Rank (CSV export)", &SJR, file_name(&input).as_deref());
            meta.year = Some(year);
            let path = out_dir.join(format!("scimago_{}_quartiles.json", year));
            write_index(&path, &meta, &build.snapshot)?;
        }

        Command::H5 { input } => {
            let rows = sources::read_orderer(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;

            let build = build_rank_index(&H5, &rows);
            let meta = build.meta("Google-Scholar-Orderer core rankings", &H5, file_name(&input).as_deref());
            let path = out_dir.join("venue_h5_index.json");
            write_index(&path, &meta, &build.snapshot)?;
        }

        Command::Lists { list, input, name } => {
            let list = MembershipList::by_id(&list).ok_or_else(|| unknown_list(&list))?;
            let names = sources::read_membership_list(&input)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            let label = name.unwrap_or_else(|| list.label.to_string());

            let build = build_membership_index(list, &names);
            let meta = build.list_meta(&label, list, file_name(&input).as_deref());
            let path = out_dir.join(format!("{}_list.json", list.id));
            write_index(&path, &meta, &build.snapshot)?;
        }

        Command::Clarivate {
            year,
            edition,
            limit,
            with_reports,
            workers,
            sleep,
            retries,
        } => {
            // Fail fast on bad arguments and credentials before any request
            let edition = validate_edition(edition.as_deref())?;
            let api_key = resolve_clarivate_api_key(&toml_config)?;

            let mut settings = toml_config.clarivate.clone();
            if let Some(limit) = limit {
                settings.page_size = limit;
            }
            if let Some(workers) = workers {
                settings.workers = workers;
            }
            if let Some(retries) = retries {
                settings.retries = retries;
            }
            if let Some(sleep) = sleep {
                if !sleep.is_finite() || sleep < 0.0 {
                    return Err(BuildError::Configuration(format!("Invalid --sleep {}", sleep)).into());
                }
                settings.request_delay_ms = (sleep * 1000.0).round() as u64;
            }

            let client = ClarivateClient::new(api_key, &settings)?;
            let mut options = ClarivateOptions::from_settings(year, &settings);
            options.edition = edition.clone();
            options.with_reports = with_reports;

            let sync = sync_clarivate(&client, &options).await?;

            let dir = out_dir.join("clarivate");
            write_json_atomic(
                &dir.join(yearly_file_name("journals", year, edition.as_deref())),
                &sync.journals,
            )?;
            write_index(
                &dir.join(yearly_file_name("compact_index", year, edition.as_deref())),
                &sync.meta,
                &sync.snapshot,
            )?;
            if let Some(path) = write_errors(&dir, year, &sync.errors)? {
                warn!(
                    failed = sync.errors.len(),
                    "Some journal reports could not be fetched; see {}",
                    path.display()
                );
            }
        }
    }

    Ok(())
}

fn unknown_scale(id: &str) -> BuildError {
    let known: Vec<&str> = CATALOGUE.iter().map(|s| s.id).collect();
    BuildError::Configuration(format!("Unknown scale '{}' (expected one of: {})", id, known.join(", ")))
}

fn unknown_list(id: &str) -> BuildError {
    let known: Vec<&str> = LISTS.iter().map(|l| l.id).collect();
    BuildError::Configuration(format!("Unknown list '{}' (expected one of: {})", id, known.join(", ")))
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

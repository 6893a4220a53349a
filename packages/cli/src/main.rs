#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for the zone radar toolchain.
//!
//! Every subcommand resolves its input with Nominatim, samples cadastral
//! parcels around it, and prints a text report while writing JSON and CSV
//! exports to `--output-dir`.
//!
//! Exit codes: 0 on success (including zones with no buildings), 2 when
//! the input could not be resolved, 1 on errors or Ctrl-C.
//!
//! Uses `indicatif-log-bridge` (via [`zone_radar_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod commands;
mod settings;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use commands::{BatchOptions, Outcome, RankBy};
use settings::Settings;
use zone_radar_cadastre::CatastroClient;
use zone_radar_cli_utils::MultiProgress;
use zone_radar_geocoder::NominatimGeocoder;
use zone_radar_zones::analyzer::{DEFAULT_RADIUS_METERS, ZONE_GRID_SIZE};
use zone_radar_zones::sampler::DEFAULT_GRID_SIZE;
use zone_radar_zones::{BuildingClassifier, ScanOptions, ZoneAnalyzer};

/// Default radius around a street, in meters.
const STREET_RADIUS_METERS: u32 = 300;
/// Default radius around each street of a `rank --by street` batch.
const RANKED_STREET_RADIUS_METERS: u32 = 250;
/// Largest accepted `--grid`; every point is one paced cadastre query.
const MAX_GRID_SIZE: i64 = 50;

fn grid_size_parser() -> clap::builder::RangedI64ValueParser<u32> {
    clap::value_parser!(u32).range(1..=MAX_GRID_SIZE)
}

#[derive(Parser)]
#[command(
    name = "zone_radar",
    about = "Scores urban zones by elevator modernization opportunity"
)]
struct Cli {
    /// TOML file overriding the `[geocoder]`, `[cadastre]`, and `[scoring]` settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// City that qualifies every query (defaults to the configured city)
    #[arg(long, global = true)]
    city: Option<String>,
    /// Directory for JSON and CSV exports
    #[arg(long, global = true, default_value = "results")]
    output_dir: PathBuf,
    /// Keep non-residential parcels
    #[arg(long, global = true)]
    all_usages: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze the area around one or more seed addresses
    Addresses {
        /// Seed addresses inside the zone (e.g., "Calle Mayor de Triana 50")
        #[arg(required = true)]
        seeds: Vec<String>,
        /// Sampling radius around each seed, in meters
        #[arg(long, default_value_t = DEFAULT_RADIUS_METERS)]
        radius: u32,
        /// Sampling grid size (N×N points per seed)
        #[arg(long, default_value_t = DEFAULT_GRID_SIZE, value_parser = grid_size_parser())]
        grid: u32,
        /// Zone name for the report and exports (defaults to "Zone {city}")
        #[arg(long)]
        name: Option<String>,
    },
    /// Analyze a named neighborhood or district using its bounding box
    Zone {
        /// Zone name (e.g., "Vegueta")
        name: String,
        /// Sampling grid size (N×N points)
        #[arg(long, default_value_t = ZONE_GRID_SIZE, value_parser = grid_size_parser())]
        grid: u32,
    },
    /// Analyze a postal code area
    PostalCode {
        /// Postal code (e.g., "35001")
        code: String,
        /// Sampling grid size (N×N points)
        #[arg(long, default_value_t = DEFAULT_GRID_SIZE, value_parser = grid_size_parser())]
        grid: u32,
    },
    /// Analyze the area around a street
    Street {
        /// Street name, optionally with a number
        street: String,
        /// Sampling radius in meters
        #[arg(long, default_value_t = STREET_RADIUS_METERS)]
        radius: u32,
        /// Sampling grid size (N×N points)
        #[arg(long, default_value_t = DEFAULT_GRID_SIZE, value_parser = grid_size_parser())]
        grid: u32,
    },
    /// Analyze several zones, streets, or postal codes and rank them by total score
    Rank {
        /// What the inputs are
        #[arg(long, value_enum, default_value_t = RankBy::PostalCode)]
        by: RankBy,
        /// Zone names, streets, or postal codes to compare
        #[arg(required = true)]
        inputs: Vec<String>,
        /// Sampling radius around each street, in meters
        #[arg(long, default_value_t = RANKED_STREET_RADIUS_METERS)]
        radius: u32,
        /// Sampling grid size (defaults to 7 for zones, 5 otherwise)
        #[arg(long, value_parser = grid_size_parser())]
        grid: Option<u32>,
        /// Use a 3x3 grid (faster, less precise)
        #[arg(long, conflicts_with = "grid")]
        fast: bool,
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
}

async fn run(
    analyzer: &ZoneAnalyzer<'_>,
    multi: &MultiProgress,
    cli: &Cli,
    city: &str,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    let residential_only = !cli.all_usages;
    let scan = |grid_size| ScanOptions {
        grid_size,
        residential_only,
    };

    let outcome = match &cli.command {
        Commands::Addresses {
            seeds,
            radius,
            grid,
            name,
        } => {
            let mut report = analyzer
                .analyze_by_addresses(seeds, city, *radius, scan(*grid))
                .await;
            if let Some(name) = name
                && !report.is_unresolved()
            {
                report.zone.name.clone_from(name);
            }
            commands::finish_single(&report, "any seed address", &cli.output_dir)?
        }
        Commands::Zone { name, grid } => {
            let report = analyzer.analyze_by_zone_name(name, city, scan(*grid)).await;
            commands::finish_single(&report, &format!("zone {name}"), &cli.output_dir)?
        }
        Commands::PostalCode { code, grid } => {
            let report = analyzer
                .analyze_by_postal_code(code, city, scan(*grid))
                .await;
            commands::finish_single(&report, &format!("postal code {code}"), &cli.output_dir)?
        }
        Commands::Street {
            street,
            radius,
            grid,
        } => {
            let report = analyzer
                .analyze_by_street(street, city, *radius, scan(*grid))
                .await;
            commands::finish_single(&report, &format!("street {street}"), &cli.output_dir)?
        }
        Commands::Rank {
            by,
            inputs,
            radius,
            grid,
            fast,
            yes,
        } => {
            let options = BatchOptions {
                by: *by,
                city,
                grid_size: *grid,
                fast: *fast,
                radius_meters: *radius,
                assume_yes: *yes,
                residential_only,
                output_dir: &cli.output_dir,
            };
            commands::rank(analyzer, multi, inputs, &options).await?
        }
    };

    Ok(outcome)
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let multi = zone_radar_cli_utils::init_logger();
    let cli = Cli::parse();

    let settings = Settings::load(cli.config.as_deref())?;
    let city = cli
        .city
        .clone()
        .unwrap_or_else(|| settings.geocoder.default_city.clone());

    let geocoder = NominatimGeocoder::new(settings.geocoder.clone())?;
    let cadastre = CatastroClient::new(settings.cadastre.clone())?;

    let (events, receiver) = zone_radar_zones::progress::channel();
    let renderer = zone_radar_cli_utils::spawn_scan_progress(&multi, receiver);

    let analyzer = ZoneAnalyzer::new(
        &geocoder,
        &cadastre,
        BuildingClassifier::for_current_year(settings.scoring.clone()),
    )
    .with_pacing(settings.cadastre.pacing())
    .with_events(events);

    let outcome = tokio::select! {
        outcome = run(&analyzer, &multi, &cli, &city) => outcome?,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("\nAnalysis interrupted by the user; no files were written.");
            return Ok(ExitCode::FAILURE);
        }
    };

    drop(analyzer);
    renderer.await?;

    Ok(match outcome {
        Outcome::Completed | Outcome::Cancelled => ExitCode::SUCCESS,
        Outcome::Unresolved => ExitCode::from(2),
    })
}

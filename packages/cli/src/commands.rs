//! Subcommand bodies: run an analysis, print its report, and write the
//! export files.
//!
//! Files are only written once every analysis of a command has finished,
//! so an interrupted run leaves nothing behind.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use dialoguer::Confirm;
use zone_radar_cli_utils::{MultiProgress, steps_bar};
use zone_radar_zones::export::{self, ExportError};
use zone_radar_zones::analyzer::ZONE_GRID_SIZE;
use zone_radar_zones::sampler::DEFAULT_GRID_SIZE;
use zone_radar_zones::{AnalysisReport, ScanOptions, ZoneAnalyzer, compare};
use zone_radar_zones_models::Zone;

/// Grid size of `rank --fast`.
pub const FAST_GRID_SIZE: u32 = 3;

/// How a command ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The analysis ran; the zone may still be empty.
    Completed,
    /// No input could be resolved, so nothing was analyzed.
    Unresolved,
    /// The user declined to start.
    Cancelled,
}

/// Writes `{stem}.json` and `{stem}_buildings.csv` into `dir`.
///
/// # Errors
///
/// * If `dir` cannot be created
/// * If either file cannot be written
pub fn write_zone_files(
    zone: &Zone,
    dir: &Path,
    generated_at: DateTime<Local>,
) -> Result<(PathBuf, PathBuf), ExportError> {
    std::fs::create_dir_all(dir)?;
    let stem = export::file_stem(&zone.name);

    let json_path = dir.join(format!("{stem}.json"));
    export::write_json(&json_path, &export::to_structured_record(zone, generated_at))?;

    let csv_path = dir.join(format!("{stem}_buildings.csv"));
    export::write_csv(&csv_path, zone)?;

    Ok((json_path, csv_path))
}

/// Reports a single-zone analysis: prints the text report and writes the
/// exports, or explains why nothing could be analyzed.
///
/// # Errors
///
/// * If the export files cannot be written
pub fn finish_single(
    report: &AnalysisReport,
    input: &str,
    output_dir: &Path,
) -> Result<Outcome, ExportError> {
    if report.is_unresolved() {
        eprintln!("Could not resolve {input}; nothing was analyzed.");
        return Ok(Outcome::Unresolved);
    }

    let zone = &report.zone;
    if zone.is_empty() {
        println!("No buildings found for {input}.");
    }

    let now = Local::now();
    let (json_path, csv_path) = write_zone_files(zone, output_dir, now)?;
    print!("{}", export::to_report(zone, now));
    println!("JSON: {}", json_path.display());
    println!("CSV:  {}", csv_path.display());

    Ok(Outcome::Completed)
}

/// Ranking summary printed after a batch run.
#[must_use]
pub fn ranking_table(ranked: &[Zone]) -> String {
    let mut out = String::new();
    writeln!(
        out,
        "{:>3}  {:<24} {:>10} {:>8} {:>10} {:>9}",
        "#", "ZONE", "SCORE", "DENSITY", "BUILDINGS", "VERY OLD"
    )
    .ok();
    writeln!(out, "{}", "-".repeat(70)).ok();
    for (position, zone) in ranked.iter().enumerate() {
        let s = &zone.summary;
        writeln!(
            out,
            "{:>3}  {:<24} {:>10.2} {:>8.2} {:>10} {:>9}",
            position + 1,
            zone.name,
            s.score_total,
            s.density,
            s.total_buildings,
            s.very_old
        )
        .ok();
    }
    out
}

/// What the inputs of a `rank` batch are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum RankBy {
    /// Neighborhood or district names
    Zone,
    /// Street names
    Street,
    /// Postal codes
    PostalCode,
}

impl RankBy {
    /// Criterion recorded in the ranking document.
    #[must_use]
    pub const fn criterion(self) -> &'static str {
        match self {
            Self::Zone => "zone",
            Self::Street => "street",
            Self::PostalCode => "postal_code",
        }
    }

    #[must_use]
    pub const fn plural(self) -> &'static str {
        match self {
            Self::Zone => "Zones",
            Self::Street => "Streets",
            Self::PostalCode => "Postal codes",
        }
    }

    #[must_use]
    pub const fn ranking_file(self) -> &'static str {
        match self {
            Self::Zone => "ranking_zones.json",
            Self::Street => "ranking_streets.json",
            Self::PostalCode => "ranking_postal_codes.json",
        }
    }

    #[must_use]
    pub const fn default_grid_size(self) -> u32 {
        match self {
            Self::Zone => ZONE_GRID_SIZE,
            Self::Street | Self::PostalCode => DEFAULT_GRID_SIZE,
        }
    }
}

/// Options of the `rank` batch.
pub struct BatchOptions<'a> {
    pub by: RankBy,
    pub city: &'a str,
    /// Explicit grid size; otherwise the default for `by`, or
    /// [`FAST_GRID_SIZE`] when `fast` is set.
    pub grid_size: Option<u32>,
    pub fast: bool,
    /// Sampling radius around each street.
    pub radius_meters: u32,
    /// Skip the confirmation prompt.
    pub assume_yes: bool,
    pub residential_only: bool,
    pub output_dir: &'a Path,
}

impl BatchOptions<'_> {
    fn grid_size(&self) -> u32 {
        match self.grid_size {
            Some(grid_size) => grid_size,
            None if self.fast => FAST_GRID_SIZE,
            None => self.by.default_grid_size(),
        }
    }
}

/// Inputs in order, dropping any whose exports would land on the same
/// files as an earlier one.
fn distinct_inputs(inputs: &[String]) -> Vec<&str> {
    let mut stems = BTreeSet::new();
    inputs
        .iter()
        .map(|input| input.trim())
        .filter(|input| {
            let unique = stems.insert(export::file_stem(input));
            if !unique {
                log::warn!("Skipping repeated input: {input}");
            }
            unique
        })
        .collect()
}

/// Analyzes every input in turn, ranks the resolved zones, and writes the
/// ranking plus one export per zone.
///
/// Unresolved inputs are collected and reported without stopping the
/// batch.
///
/// # Errors
///
/// * If the confirmation prompt fails
/// * If the export files cannot be written
pub async fn rank(
    analyzer: &ZoneAnalyzer<'_>,
    multi: &MultiProgress,
    inputs: &[String],
    options: &BatchOptions<'_>,
) -> Result<Outcome, Box<dyn std::error::Error>> {
    let by = options.by;
    let inputs = distinct_inputs(inputs);
    let scan = ScanOptions {
        grid_size: options.grid_size(),
        residential_only: options.residential_only,
    };

    println!(
        "{} to analyze: {} ({}x{} grid each)",
        by.plural(),
        inputs.len(),
        scan.grid_size,
        scan.grid_size
    );
    println!("This issues many requests to public services; please respect their terms of use.");

    if !options.assume_yes
        && !Confirm::new()
            .with_prompt("Continue?")
            .default(false)
            .interact()?
    {
        println!("Cancelled.");
        return Ok(Outcome::Cancelled);
    }

    let steps = steps_bar(multi, by.plural(), inputs.len() as u64);
    let mut zones = Vec::new();
    let mut unresolved = Vec::new();

    for input in &inputs {
        steps.set_message(format!("{} ({input})", by.plural()));
        let report = match by {
            RankBy::Zone => {
                analyzer
                    .analyze_by_zone_name(input, options.city, scan)
                    .await
            }
            RankBy::Street => {
                analyzer
                    .analyze_by_street(input, options.city, options.radius_meters, scan)
                    .await
            }
            RankBy::PostalCode => {
                analyzer
                    .analyze_by_postal_code(input, options.city, scan)
                    .await
            }
        };
        if report.is_unresolved() {
            log::warn!("{input} could not be resolved");
            unresolved.push(*input);
        } else {
            zones.push(report.zone);
        }
        steps.inc(1);
    }
    steps.finish_and_clear();

    println!("Zones analyzed: {}/{}", zones.len(), inputs.len());
    if !unresolved.is_empty() {
        println!("Unresolved: {}", unresolved.join(", "));
    }
    if zones.is_empty() {
        eprintln!("None of the inputs could be resolved; nothing was analyzed.");
        return Ok(Outcome::Unresolved);
    }

    let ranked = compare::rank(zones);
    print!("{}", ranking_table(&ranked));

    let now = Local::now();
    std::fs::create_dir_all(options.output_dir)?;
    let ranking_path = options.output_dir.join(by.ranking_file());
    export::write_json(
        &ranking_path,
        &export::ranking_document(&ranked, by.criterion(), options.city, now),
    )?;
    for zone in &ranked {
        write_zone_files(zone, options.output_dir, now)?;
    }
    println!("Ranking: {}", ranking_path.display());

    Ok(Outcome::Completed)
}

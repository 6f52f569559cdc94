//! Export command - build the star schema for a batch and write its tables.

use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use serde::Serialize;
use tracing::{debug, info};

use invostar_core::models::config::{StarConfig, TableFormat};
use invostar_core::schema::ExportStatistics;
use invostar_core::{
    load_invoices, LicenseTier, ProcessingStats, RawInvoice, StarSchemaBuilder, ValidationResult,
    WriteReport,
};

use super::config::resolve_config;
use crate::writers::writer_for;

/// Arguments for the export command.
#[derive(Args)]
pub struct ExportArgs {
    /// Input JSON files or glob patterns
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Table file format
    #[arg(short, long, value_enum)]
    format: Option<FormatArg>,

    /// License tier (free, pro, enterprise)
    #[arg(long, env = "INVOSTAR_LICENSE")]
    license: Option<LicenseTier>,

    /// Lower the license's per-export invoice limit
    #[arg(long)]
    max_records: Option<usize>,

    /// Skip referential-integrity validation
    #[arg(long)]
    no_validate: bool,

    /// Write run statistics as JSON to this file
    #[arg(long)]
    stats_json: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum FormatArg {
    /// One CSV file per table
    Csv,
    /// One JSON array per table
    Json,
}

impl From<FormatArg> for TableFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Csv => TableFormat::Csv,
            FormatArg::Json => TableFormat::Json,
        }
    }
}

/// Everything a run produced, for `--stats-json`.
#[derive(Serialize)]
struct RunSummary<'a> {
    files: Vec<String>,
    processing: &'a ProcessingStats,
    export: ExportStatistics,
    writes: &'a WriteReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    validation: Option<&'a ValidationResult>,
    elapsed_ms: u64,
}

pub fn run(args: ExportArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = resolve_config(config_path)?;
    apply_overrides(&mut config, &args);

    let files = expand_inputs(&args.inputs)?;
    println!(
        "{} Found {} input files",
        style("ℹ").blue(),
        files.len()
    );

    let invoices = read_batch(&files)?;
    info!("Loaded {} invoices from {} files", invoices.len(), files.len());

    let mut builder = StarSchemaBuilder::new()
        .with_license(config.license.gate())
        .with_options(config.builder_options());

    let stats = builder.process(&invoices)?;
    let tables = builder.export()?;

    let output_dir = config.export.output_dir.clone();
    fs::create_dir_all(&output_dir)?;
    let mut writer = writer_for(config.export.format, &output_dir);
    let report = writer.write_all(&tables);

    let validation = if config.export.validate {
        Some(builder.validate()?)
    } else {
        None
    };

    print_summary(&stats, &report, validation.as_ref());

    if let Some(path) = &args.stats_json {
        let summary = RunSummary {
            files: files.iter().map(|p| p.display().to_string()).collect(),
            processing: &stats,
            export: builder.statistics(),
            writes: &report,
            validation: validation.as_ref(),
            elapsed_ms: start.elapsed().as_millis() as u64,
        };
        fs::write(path, serde_json::to_string_pretty(&summary)?)?;
        debug!("Wrote run statistics to {}", path.display());
    }

    println!();
    println!(
        "{} Exported {} invoices to {} in {:?}",
        style("✓").green(),
        stats.processed,
        output_dir.display(),
        start.elapsed()
    );

    if !report.all_succeeded() {
        anyhow::bail!("{} tables could not be written", report.failed().count());
    }
    if let Some(validation) = &validation {
        if !validation.is_valid() {
            anyhow::bail!("Star schema validation failed: {}", validation.errors.join("; "));
        }
    }

    Ok(())
}

/// Command-line flags take precedence over the config file.
fn apply_overrides(config: &mut StarConfig, args: &ExportArgs) {
    if let Some(dir) = &args.output_dir {
        config.export.output_dir = dir.clone();
    }
    if let Some(format) = args.format {
        config.export.format = format.into();
    }
    if let Some(tier) = args.license {
        config.license.tier = tier;
    }
    if args.max_records.is_some() {
        config.license.max_records = args.max_records;
    }
    if args.no_validate {
        config.export.validate = false;
    }
}

fn expand_inputs(inputs: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in inputs {
        let path = Path::new(input);
        if path.is_file() {
            files.push(path.to_path_buf());
            continue;
        }

        let matched: Vec<PathBuf> = glob(input)?
            .filter_map(|r| r.ok())
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("json"))
            })
            .collect();

        if matched.is_empty() {
            anyhow::bail!("No matching files found for pattern: {}", input);
        }
        files.extend(matched);
    }

    Ok(files)
}

fn read_batch(files: &[PathBuf]) -> anyhow::Result<Vec<RawInvoice>> {
    let mut invoices = Vec::new();

    for path in files {
        let file = File::open(path)
            .map_err(|e| anyhow::anyhow!("Cannot open {}: {}", path.display(), e))?;
        let batch = load_invoices(BufReader::new(file))
            .map_err(|e| anyhow::anyhow!("Cannot read invoices from {}: {}", path.display(), e))?;
        debug!("{}: {} invoices", path.display(), batch.len());
        invoices.extend(batch);
    }

    Ok(invoices)
}

fn print_summary(stats: &ProcessingStats, report: &WriteReport, validation: Option<&ValidationResult>) {
    println!();
    println!("{}", style("Star schema").bold());
    println!(
        "   {} invoices processed, {} skipped",
        style(stats.processed).green(),
        style(stats.errored).red()
    );
    println!("   {} fact rows", stats.total_facts);
    println!("   {} clients", stats.dimensions.clients);
    println!("   {} sellers", stats.dimensions.sellers);
    println!("   {} products", stats.dimensions.products);
    println!("   {} payment methods", stats.dimensions.payments);
    println!("   {} dates", stats.dimensions.dates);

    if let Some(license) = &stats.license {
        let limit = license
            .max_records
            .map(|m| m.to_string())
            .unwrap_or_else(|| "unlimited".to_string());
        println!("   License: {} (limit {})", license.license, limit);
    }

    if !stats.failures.is_empty() {
        println!();
        println!("{}", style("Skipped invoices:").yellow());
        for failure in &stats.failures {
            println!("  - #{}: {}", failure.index, failure.reason);
        }
    }

    println!();
    for outcome in &report.outcomes {
        match (&outcome.path, &outcome.error) {
            (Some(path), None) => println!("{} {}", style("✓").green(), path.display()),
            (_, error) => println!(
                "{} {}: {}",
                style("✗").red(),
                outcome.table,
                error.as_deref().unwrap_or("unknown error")
            ),
        }
    }

    if let Some(validation) = validation {
        println!();
        let verdict = if validation.is_valid() {
            style(validation.summary()).green()
        } else {
            style(validation.summary()).red()
        };
        println!("Validation: {}", verdict);
        for warning in &validation.warnings {
            println!("  {} {}", style("!").yellow(), warning);
        }
        for error in &validation.errors {
            println!("  {} {}", style("✗").red(), error);
        }
    }
}

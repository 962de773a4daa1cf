//! revseries CLI: normalize review histories onto a shared monthly calendar.
//!
//! Commands:
//! - `normalize`: normalize every product in a fetcher document and save artifacts
//! - `calendar`: print the calendar months for a run
//! - `inspect`: normalize one product and print its series

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use revseries_runner::{
    load_products, normalize_batch, normalize_product, save_artifacts, FailurePolicy,
    NormalizeConfig,
};

#[derive(Parser)]
#[command(
    name = "revseries",
    about = "revseries: normalize review histories into gap-free monthly series"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize every product in a fetcher JSON document.
    Normalize {
        /// Product document (JSON array of product rows).
        #[arg(long)]
        input: PathBuf,

        /// Output directory for normalized.csv, normalized.json and manifest.json.
        #[arg(long, default_value = "normalized")]
        output_dir: PathBuf,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Worker threads (overrides config).
        #[arg(long)]
        threads: Option<usize>,

        /// Fail the whole run on the first broken product.
        #[arg(long, default_value_t = false)]
        abort_on_error: bool,

        /// Drop months before each product's review start.
        #[arg(long, default_value_t = false)]
        trim_to_start: bool,
    },
    /// Print the calendar months as Unix timestamps and dates.
    Calendar {
        /// First month (YYYY-MM-DD). Defaults to 2010-10-01.
        #[arg(long)]
        origin: Option<String>,
    },
    /// Normalize one product and print its series.
    Inspect {
        /// Product document (JSON array of product rows).
        #[arg(long)]
        input: PathBuf,

        /// Product to inspect.
        #[arg(long)]
        appid: String,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Print the normalized product as JSON instead of a table.
        #[arg(long, default_value_t = false)]
        json: bool,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Normalize {
            input,
            output_dir,
            config,
            threads,
            abort_on_error,
            trim_to_start,
        } => run_normalize(
            &input,
            &output_dir,
            config.as_deref(),
            threads,
            abort_on_error,
            trim_to_start,
        ),
        Commands::Calendar { origin } => run_calendar(origin.as_deref()),
        Commands::Inspect {
            input,
            appid,
            config,
            json,
        } => run_inspect(&input, &appid, config.as_deref(), json),
    }
}

fn load_config(path: Option<&Path>) -> Result<NormalizeConfig> {
    match path {
        Some(path) => NormalizeConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display())),
        None => Ok(NormalizeConfig::default()),
    }
}

fn run_normalize(
    input: &Path,
    output_dir: &Path,
    config_path: Option<&Path>,
    threads: Option<usize>,
    abort_on_error: bool,
    trim_to_start: bool,
) -> Result<()> {
    let mut config = load_config(config_path)?;
    if let Some(threads) = threads {
        config.threads = threads;
    }
    if abort_on_error {
        config.failure_policy = FailurePolicy::Abort;
    }
    if trim_to_start {
        config.trim_to_review_start = true;
    }
    config.validate()?;

    // One snapshot for the whole run, even if it crosses a month boundary.
    let calendar = config.calendar(Utc::now())?;
    info!(
        months = calendar.len(),
        threads = config.threads,
        policy = ?config.failure_policy,
        "calendar ready"
    );
    let loaded = load_products(input)?;
    let report = normalize_batch(&loaded.products, &calendar, &config.batch_options())?;

    let run_dir = save_artifacts(&report, &loaded.input_hash, &calendar, output_dir)?;

    println!(
        "Normalized {} products ({} failed, {} pending) over {} months",
        report.products.len(),
        report.failures.len(),
        report.skipped_pending.len(),
        calendar.len()
    );
    for failure in &report.failures {
        eprintln!("  FAIL: {}: {}", failure.appid, failure.error);
    }
    println!("Artifacts saved to: {}", run_dir.display());

    Ok(())
}

fn run_calendar(origin: Option<&str>) -> Result<()> {
    let mut config = NormalizeConfig::default();
    if let Some(origin) = origin {
        config.origin = NaiveDate::parse_from_str(origin, "%Y-%m-%d")
            .with_context(|| format!("invalid origin '{origin}' (expected YYYY-MM-DD)"))?;
    }
    let calendar = config.calendar(Utc::now())?;

    for month in calendar.months() {
        let date = DateTime::from_timestamp(month, 0)
            .map(|dt| dt.format("%Y-%m").to_string())
            .unwrap_or_default();
        println!("{month}\t{date}");
    }
    Ok(())
}

fn run_inspect(input: &Path, appid: &str, config_path: Option<&Path>, json: bool) -> Result<()> {
    let config = load_config(config_path)?;
    let calendar = config.calendar(Utc::now())?;
    let loaded = load_products(input)?;

    let Some(product) = loaded.products.iter().find(|p| p.appid == appid) else {
        bail!("appid '{appid}' not found in {}", input.display());
    };
    let Some(normalized) = normalize_product(product, &calendar, &config.batch_options())? else {
        bail!("appid '{appid}' has no fetched history yet");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&normalized)?);
        return Ok(());
    }

    println!(
        "{} ({})",
        normalized.name.as_deref().unwrap_or("<unnamed>"),
        normalized.appid
    );
    println!("  cadence:      {:?}", normalized.cadence);
    println!("  review start: {}", normalized.review_start);
    if normalized.dropped > 0 {
        println!("  dropped:      {} off-calendar records", normalized.dropped);
    }
    println!(
        "  reviews:      {} up / {} down",
        normalized.time_series.total_up(),
        normalized.time_series.total_down()
    );
    println!();
    println!("{:<10} {:>8} {:>8} {:>7}", "month", "up", "down", "score");
    for record in &normalized.time_series {
        let score = record
            .score()
            .map(|s| format!("{s:.1}"))
            .unwrap_or_else(|| "-".into());
        println!(
            "{:04}-{:02}    {:>8} {:>8} {:>7}",
            record.year(),
            record.month(),
            record.up(),
            record.down(),
            score
        );
    }
    Ok(())
}

//! Export of normalized products: CSV, JSON and a run manifest.
//!
//! - **CSV**: long format, one row per product-month
//! - **JSON**: the normalized products as an array
//! - **Manifest**: input hash, calendar bounds, counts and failures

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

use revseries_core::{Cadence, Calendar};

use crate::batch::{BatchReport, ProductFailure};
use crate::product::NormalizedProduct;

/// Current manifest schema version.
pub const SCHEMA_VERSION: u32 = 1;

// ─── CSV export ─────────────────────────────────────────────────────

/// Export normalized series as CSV.
///
/// Columns: appid, name, review_start, period, up, down
pub fn export_series_csv(products: &[NormalizedProduct]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    wtr.write_record(["appid", "name", "review_start", "period", "up", "down"])?;

    for product in products {
        let name = product.name.as_deref().unwrap_or("");
        let review_start = product.review_start.to_string();
        for record in &product.time_series {
            let period = record.period().to_string();
            let up = record.up().to_string();
            let down = record.down().to_string();
            wtr.write_record([
                product.appid.as_str(),
                name,
                review_start.as_str(),
                period.as_str(),
                up.as_str(),
                down.as_str(),
            ])?;
        }
    }

    let data = wtr.into_inner().context("failed to flush CSV writer")?;
    String::from_utf8(data).context("CSV output is not valid UTF-8")
}

// ─── JSON export ────────────────────────────────────────────────────

pub fn export_products_json(products: &[NormalizedProduct]) -> Result<String> {
    serde_json::to_string_pretty(products).context("failed to serialize normalized products")
}

// ─── Manifest ───────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub generated_at: DateTime<Utc>,
    pub input_hash: String,
    pub calendar_origin: i64,
    pub calendar_last: i64,
    pub calendar_months: usize,
    pub normalized: usize,
    pub weekly: usize,
    pub monthly: usize,
    pub dropped_records: usize,
    pub pending: Vec<String>,
    pub failures: Vec<ProductFailure>,
}

impl RunManifest {
    pub fn new(report: &BatchReport, input_hash: &str, calendar: &Calendar) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            input_hash: input_hash.to_string(),
            calendar_origin: calendar.origin(),
            calendar_last: calendar.last(),
            calendar_months: calendar.len(),
            normalized: report.products.len(),
            weekly: report.count_cadence(Cadence::Weekly),
            monthly: report.count_cadence(Cadence::Monthly),
            dropped_records: report.dropped_records(),
            pending: report.skipped_pending.clone(),
            failures: report.failures.clone(),
        }
    }
}

// ─── Artifact bundle ────────────────────────────────────────────────

/// Save the artifact set for one batch run.
///
/// Creates `normalized_{timestamp}/` under `output_dir` containing:
/// - `normalized.csv`: long-format series
/// - `normalized.json`: products with their series
/// - `manifest.json`: run provenance and counts
///
/// Returns the path to the created directory.
pub fn save_artifacts(
    report: &BatchReport,
    input_hash: &str,
    calendar: &Calendar,
    output_dir: &Path,
) -> Result<PathBuf> {
    let manifest = RunManifest::new(report, input_hash, calendar);
    let dirname = format!(
        "normalized_{}",
        manifest.generated_at.format("%Y%m%d_%H%M%S")
    );
    let run_dir = output_dir.join(dirname);
    std::fs::create_dir_all(&run_dir)
        .with_context(|| format!("failed to create artifact dir: {}", run_dir.display()))?;

    let csv = export_series_csv(&report.products)?;
    write_artifact(&run_dir.join("normalized.csv"), &csv)?;

    let json = export_products_json(&report.products)?;
    write_artifact(&run_dir.join("normalized.json"), &json)?;

    let manifest_json =
        serde_json::to_string_pretty(&manifest).context("failed to serialize run manifest")?;
    write_artifact(&run_dir.join("manifest.json"), &manifest_json)?;

    Ok(run_dir)
}

fn write_artifact(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, contents).with_context(|| format!("failed to write {}", path.display()))
}

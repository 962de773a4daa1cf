//! revseries runner: batch normalization of product review histories.
//!
//! This crate builds on `revseries-core` to provide:
//! - TOML run configuration and the calendar snapshot it defines
//! - Loading of the fetcher's product document (with pending rows)
//! - Per-product normalization, parallel across products
//! - Skip-or-abort failure policy
//! - CSV/JSON export and a run manifest

pub mod batch;
pub mod config;
pub mod export;
pub mod loader;
pub mod product;

pub use batch::{normalize_batch, normalize_product, BatchError, BatchReport, ProductFailure};
pub use config::{BatchOptions, ConfigError, FailurePolicy, NormalizeConfig};
pub use export::{export_products_json, export_series_csv, save_artifacts, RunManifest};
pub use loader::{load_products, parse_products, LoadError, LoadedProducts};
pub use product::{NormalizedProduct, ProductHistory, TimeSeries};

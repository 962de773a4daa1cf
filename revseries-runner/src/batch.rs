//! Batch normalization across products.
//!
//! Products are independent: each one is normalized against the shared
//! calendar with no other state, so the batch fans out over a Rayon pool
//! when more than one thread is configured. Results keep input order.
//!
//! A failing product never affects the others. The failure policy decides
//! what the batch does with it:
//! - `Skip` → log, record the failure, keep the rest
//! - `Abort` → return the first failure (in input order) as the batch error

use rayon::prelude::*;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use revseries_core::{normalize_with_cadence, resolve_start, Cadence, Calendar, SeriesError};

use crate::config::{BatchOptions, FailurePolicy};
use crate::product::{NormalizedProduct, ProductHistory};

/// Errors that stop a whole batch.
#[derive(Debug, Error)]
pub enum BatchError {
    #[error("product {appid} failed to normalize: {source}")]
    Product {
        appid: String,
        #[source]
        source: SeriesError,
    },

    #[error("failed to build thread pool: {0}")]
    ThreadPool(String),
}

/// A product left out of a batch, and why.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductFailure {
    pub appid: String,
    pub error: String,
}

/// Outcome of a batch run.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub products: Vec<NormalizedProduct>,
    pub failures: Vec<ProductFailure>,
    /// Appids whose history had not been fetched yet.
    pub skipped_pending: Vec<String>,
}

impl BatchReport {
    pub fn count_cadence(&self, cadence: Cadence) -> usize {
        self.products.iter().filter(|p| p.cadence == cadence).count()
    }

    /// Monthly-path records dropped for sitting off the calendar, summed over products.
    pub fn dropped_records(&self) -> usize {
        self.products.iter().map(|p| p.dropped).sum()
    }

    pub fn all_succeeded(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Normalize one product: resolve its start marker and its series.
///
/// Returns `Ok(None)` for a product whose history is still pending.
pub fn normalize_product(
    product: &ProductHistory,
    calendar: &Calendar,
    opts: &BatchOptions,
) -> Result<Option<NormalizedProduct>, SeriesError> {
    let Some(records) = product.records() else {
        return Ok(None);
    };

    let review_start = resolve_start(product.review_start, calendar)?;
    let outcome = normalize_with_cadence(records, calendar)?;
    let time_series = if opts.trim_to_review_start {
        outcome.series.since(review_start)
    } else {
        outcome.series
    };

    debug!(
        appid = %product.appid,
        cadence = ?outcome.cadence,
        months = time_series.len(),
        "normalized product"
    );

    Ok(Some(NormalizedProduct {
        appid: product.appid.clone(),
        name: product.name.clone(),
        review_start,
        cadence: outcome.cadence,
        dropped: outcome.dropped,
        time_series,
    }))
}

/// Normalize every product in the batch against one calendar snapshot.
pub fn normalize_batch(
    products: &[ProductHistory],
    calendar: &Calendar,
    opts: &BatchOptions,
) -> Result<BatchReport, BatchError> {
    let results: Vec<Result<Option<NormalizedProduct>, SeriesError>> = if opts.threads > 1 {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(opts.threads)
            .build()
            .map_err(|e| BatchError::ThreadPool(e.to_string()))?;
        pool.install(|| {
            products
                .par_iter()
                .map(|product| normalize_product(product, calendar, opts))
                .collect()
        })
    } else {
        products
            .iter()
            .map(|product| normalize_product(product, calendar, opts))
            .collect()
    };

    let mut report = BatchReport::default();
    for (product, result) in products.iter().zip(results) {
        match result {
            Ok(Some(normalized)) => report.products.push(normalized),
            Ok(None) => {
                debug!(appid = %product.appid, "history not fetched yet; skipping");
                report.skipped_pending.push(product.appid.clone());
            }
            Err(source) => match opts.failure_policy {
                FailurePolicy::Abort => {
                    return Err(BatchError::Product {
                        appid: product.appid.clone(),
                        source,
                    });
                }
                FailurePolicy::Skip => {
                    warn!(appid = %product.appid, error = %source, "skipping product");
                    report.failures.push(ProductFailure {
                        appid: product.appid.clone(),
                        error: source.to_string(),
                    });
                }
            },
        }
    }

    info!(
        normalized = report.products.len(),
        failed = report.failures.len(),
        pending = report.skipped_pending.len(),
        weekly = report.count_cadence(Cadence::Weekly),
        monthly = report.count_cadence(Cadence::Monthly),
        "batch complete"
    );

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::product::TimeSeries;
    use chrono::{TimeZone, Utc};
    use revseries_core::domain::{month_start_timestamp, DEFAULT_ORIGIN};
    use revseries_core::RawRecord;

    fn calendar() -> Calendar {
        Calendar::generate(DEFAULT_ORIGIN, Utc.with_ymd_and_hms(2023, 12, 1, 0, 0, 0).unwrap())
            .unwrap()
    }

    fn product(appid: &str, review_start: i64, series: TimeSeries) -> ProductHistory {
        ProductHistory {
            appid: appid.into(),
            name: None,
            review_start,
            time_series: series,
        }
    }

    fn month(y: i32, m: u32) -> i64 {
        month_start_timestamp(y, m).unwrap()
    }

    #[test]
    fn normalize_product_resolves_start() {
        let cal = calendar();
        let p = product(
            "1",
            month(2015, 6) + 10 * 86_400,
            TimeSeries::Fetched(vec![RawRecord::new(month(2015, 6), 3, 1)]),
        );
        let out = normalize_product(&p, &cal, &BatchOptions::default())
            .unwrap()
            .unwrap();
        assert_eq!(out.review_start, month(2015, 6));
        assert_eq!(out.cadence, Cadence::Monthly);
        assert_eq!(out.time_series.len(), cal.len());
    }

    #[test]
    fn trim_keeps_months_from_start() {
        let cal = calendar();
        let p = product("1", month(2023, 3), TimeSeries::Fetched(vec![]));
        let opts = BatchOptions {
            trim_to_review_start: true,
            ..BatchOptions::default()
        };
        let out = normalize_product(&p, &cal, &opts).unwrap().unwrap();
        assert_eq!(out.time_series.len(), 10); // Mar..Dec 2023
    }

    #[test]
    fn pending_product_is_none() {
        let cal = calendar();
        let p = product("9", 0, TimeSeries::Pending);
        assert!(normalize_product(&p, &cal, &BatchOptions::default())
            .unwrap()
            .is_none());
    }

    #[test]
    fn skip_policy_keeps_good_products() {
        let cal = calendar();
        let products = vec![
            product("good", month(2020, 1), TimeSeries::Fetched(vec![])),
            product("bad", 0, TimeSeries::Fetched(vec![])),
            product("later", month(2021, 1), TimeSeries::Pending),
        ];
        let report = normalize_batch(&products, &cal, &BatchOptions::default()).unwrap();
        assert_eq!(report.products.len(), 1);
        assert_eq!(report.products[0].appid, "good");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].appid, "bad");
        assert!(report.failures[0].error.contains("predates"));
        assert_eq!(report.skipped_pending, vec!["later".to_string()]);
        assert!(!report.all_succeeded());
    }

    #[test]
    fn count_overflow_is_a_product_failure() {
        let cal = calendar();
        let huge = i64::MAX as u64;
        let weeks = (0..4)
            .map(|i| RawRecord::new(month(2023, 2) + i * 7 * 86_400, huge, 0))
            .collect();
        let products = vec![
            product("huge", month(2023, 2), TimeSeries::Fetched(weeks)),
            product("fine", month(2023, 2), TimeSeries::Fetched(vec![])),
        ];
        let report = normalize_batch(
            &products,
            &cal,
            &BatchOptions {
                threads: 2,
                ..BatchOptions::default()
            },
        )
        .unwrap();
        assert_eq!(report.products.len(), 1);
        assert_eq!(report.products[0].appid, "fine");
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].appid, "huge");
        assert!(report.failures[0].error.contains("exceed"));
    }

    #[test]
    fn abort_policy_returns_first_failure() {
        let cal = calendar();
        let products = vec![
            product("a", month(2020, 1), TimeSeries::Fetched(vec![])),
            product("b", 0, TimeSeries::Fetched(vec![])),
            product("c", 1, TimeSeries::Fetched(vec![])),
        ];
        let opts = BatchOptions {
            failure_policy: FailurePolicy::Abort,
            ..BatchOptions::default()
        };
        let err = normalize_batch(&products, &cal, &opts).unwrap_err();
        match err {
            BatchError::Product { appid, source } => {
                assert_eq!(appid, "b");
                assert!(matches!(source, SeriesError::OutOfRange { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn parallel_matches_sequential() {
        let cal = calendar();
        let products: Vec<ProductHistory> = (0..24)
            .map(|i| {
                let start = month(2016, 1) + i * 86_400;
                let records = (0..30)
                    .map(|w| RawRecord::new(start + w * 7 * 86_400, (i + w) as u64, 1))
                    .collect();
                product(&i.to_string(), start, TimeSeries::Fetched(records))
            })
            .collect();

        let sequential = normalize_batch(&products, &cal, &BatchOptions::default()).unwrap();
        let parallel = normalize_batch(
            &products,
            &cal,
            &BatchOptions {
                threads: 4,
                ..BatchOptions::default()
            },
        )
        .unwrap();
        assert_eq!(sequential.products, parallel.products);
        assert_eq!(parallel.count_cadence(Cadence::Weekly), 24);
    }
}

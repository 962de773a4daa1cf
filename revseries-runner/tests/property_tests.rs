//! Property tests for the runner's input parsing and batch behaviour.
//!
//! 1. Numeric fields parse the same from integers and numeric strings
//! 2. Batch output keeps input order and is independent of thread count
//! 3. Every product lands in exactly one report bucket

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use revseries_core::domain::{month_start_timestamp, DEFAULT_ORIGIN};
use revseries_core::{Calendar, RawRecord};
use revseries_runner::{
    normalize_batch, parse_products, BatchOptions, ProductHistory, TimeSeries,
};

fn calendar() -> Calendar {
    Calendar::generate(DEFAULT_ORIGIN, Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()).unwrap()
}

// ── Strategies (proptest) ────────────────────────────────────────────

/// Weekly or monthly raw history starting somewhere in 2012-2022.
fn arb_history() -> impl Strategy<Value = TimeSeries> {
    let base = month_start_timestamp(2012, 1).unwrap();
    (0..3_650i64, 0..40usize, any::<bool>(), 0..5_000u64).prop_map(
        move |(day, len, weekly, count)| {
            let start = base + day * 86_400;
            let records = (0..len as i64)
                .map(|i| {
                    let date = if weekly {
                        start + i * 7 * 86_400
                    } else {
                        month_start_timestamp(2012 + (i / 12) as i32, (i % 12) as u32 + 1)
                            .unwrap()
                    };
                    RawRecord::new(date, count + i as u64, i as u64)
                })
                .collect();
            TimeSeries::Fetched(records)
        },
    )
}

/// A product that is healthy, pending, or carries a start before the origin.
fn arb_product() -> impl Strategy<Value = (u8, TimeSeries)> {
    (0..3u8, arb_history())
}

fn build(products: &[(u8, TimeSeries)]) -> Vec<ProductHistory> {
    products
        .iter()
        .enumerate()
        .map(|(i, (kind, series))| ProductHistory {
            appid: i.to_string(),
            name: None,
            review_start: if *kind == 2 { 0 } else { month_start_timestamp(2013, 1).unwrap() },
            time_series: if *kind == 1 { TimeSeries::Pending } else { series.clone() },
        })
        .collect()
}

// ── 1. Integer and string fields agree ───────────────────────────────

proptest! {
    #[test]
    fn string_and_integer_fields_agree(
        appid in 1..5_000_000u64,
        start in DEFAULT_ORIGIN..1_700_000_000i64,
        up in 0..1_000_000u64,
        down in 0..1_000_000u64,
    ) {
        let as_ints = format!(
            r#"[{{"appid":{appid},"review_start":{start},"time_series":[{{"date":{start},"recommendations_up":{up},"recommendations_down":{down}}}]}}]"#
        );
        let as_strings = format!(
            r#"[{{"appid":"{appid}","review_start":"{start}","time_series":[{{"date":"{start}","recommendations_up":"{up}","recommendations_down":"{down}"}}]}}]"#
        );
        let a = parse_products(as_ints.as_bytes()).unwrap();
        let b = parse_products(as_strings.as_bytes()).unwrap();
        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a[0].records().unwrap()[0], RawRecord::new(start, up, down));
    }
}

// ── 2. Order and thread independence ─────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn batch_is_ordered_and_thread_independent(
        specs in prop::collection::vec(arb_product(), 0..12),
        threads in 2..6usize,
    ) {
        let cal = calendar();
        let products = build(&specs);

        let sequential = normalize_batch(&products, &cal, &BatchOptions::default()).unwrap();
        let parallel = normalize_batch(
            &products,
            &cal,
            &BatchOptions { threads, ..BatchOptions::default() },
        )
        .unwrap();

        prop_assert_eq!(&sequential.products, &parallel.products);
        prop_assert_eq!(&sequential.failures, &parallel.failures);
        prop_assert_eq!(&sequential.skipped_pending, &parallel.skipped_pending);

        let ids: Vec<usize> = sequential
            .products
            .iter()
            .map(|p| p.appid.parse().unwrap())
            .collect();
        prop_assert!(ids.windows(2).all(|w| w[0] < w[1]));
    }
}

// ── 3. Report buckets partition the input ────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn every_product_is_accounted_for(specs in prop::collection::vec(arb_product(), 0..12)) {
        let cal = calendar();
        let products = build(&specs);
        let report = normalize_batch(&products, &cal, &BatchOptions::default()).unwrap();

        let pending = specs.iter().filter(|(k, _)| *k == 1).count();
        let broken = specs.iter().filter(|(k, _)| *k == 2).count();
        prop_assert_eq!(report.skipped_pending.len(), pending);
        prop_assert_eq!(report.failures.len(), broken);
        prop_assert_eq!(report.products.len(), specs.len() - pending - broken);
        for product in &report.products {
            prop_assert_eq!(product.time_series.len(), cal.len());
        }
    }
}

#![allow(dead_code)]

use std::path::PathBuf;

use etf_flows::prelude::*;

pub fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures/flows")
        .join(name)
}

pub fn load_fixture(name: &str) -> Vec<FlowRecord> {
    load_csv(fixture(name)).expect("fixture loads")
}

/// The five-ETF sample without EEM, whose 2025-01-03 flow is missing.
pub fn complete_sample() -> Vec<FlowRecord> {
    let filter = FlowFilter::default().with_tickers(["SPY", "QQQ", "IWM", "EFA"]);
    filter.apply(&load_fixture("year_sample.csv"))
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

use chrono::NaiveDate;

use crate::domain::FlowRecord;

pub(crate) fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("test dates are ISO formatted")
}

pub(crate) fn rec(day: &str, ticker: &str, flow: f64) -> FlowRecord {
    FlowRecord::new(date(day), ticker, flow)
}

/// Two trading days: a tie at the top on the first, a single outflow on the second.
pub(crate) fn scenario() -> Vec<FlowRecord> {
    vec![
        rec("2025-01-01", "SPY", 100.0),
        rec("2025-01-01", "QQQ", 100.0),
        rec("2025-01-01", "IWM", 50.0),
        rec("2025-01-02", "SPY", -20.0),
    ]
}

/// A small multi-region panel used by the summary, report and analysis tests.
pub(crate) fn regional_panel() -> Vec<FlowRecord> {
    vec![
        rec("2025-01-01", "SPY", 120.0).with_region("US"),
        rec("2025-01-01", "EWJ", -15.0).with_region("Asia"),
        rec("2025-01-01", "VGK", 40.0).with_region("Europe"),
        rec("2025-01-02", "SPY", -30.0).with_region("US"),
        rec("2025-01-02", "EWJ", 25.0).with_region("Asia"),
        rec("2025-01-02", "VGK", 25.0).with_region("Europe"),
        rec("2025-01-03", "SPY", 60.0).with_region("US"),
        rec("2025-01-03", "EWJ", 5.0).with_region("Asia"),
        rec("2025-01-03", "VGK", -10.0).with_region("Europe"),
    ]
}

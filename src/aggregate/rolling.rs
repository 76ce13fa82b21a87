use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::{
    aggregate::validate,
    domain::{FlowRecord, RollingStat},
    error::FlowResult,
    math::RollingMoments,
};

/// Trailing-window mean and sample standard deviation of net flow, per ticker.
///
/// Records are partitioned by ticker and stably sorted by date. Every position with at least
/// `window - 1` predecessors yields one [`RollingStat`]; earlier positions yield nothing, so a
/// ticker with exactly `window` observations produces exactly one entry. With `window == 1` the
/// mean is the value itself and the standard deviation is reported as `0.0`.
///
/// The output is ordered by ticker, then date.
///
/// # Errors
/// - Invalid argument when `window` is zero.
/// - Schema violation for a blank ticker or a non-finite flow.
pub fn rolling_stats(records: &[FlowRecord], window: usize) -> FlowResult<Vec<RollingStat>> {
    validate::require_positive("window", window)?;

    let mut partitions: BTreeMap<&str, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for (row, rec) in records.iter().enumerate() {
        validate::require_ticker(row, rec)?;
        let Some(flow) = validate::finite_flow(row, rec)? else {
            continue;
        };
        partitions
            .entry(rec.etf_ticker.as_str())
            .or_default()
            .push((rec.date, flow));
    }

    let mut stats = Vec::new();
    let mut moments = RollingMoments::new(window);
    for (ticker, mut observations) in partitions {
        observations.sort_by_key(|(date, _)| *date);
        moments.reset();

        for (date, flow) in observations {
            if let Some(m) = moments.update(flow) {
                stats.push(RollingStat {
                    etf_ticker: ticker.to_string(),
                    date,
                    rolling_mean: m.mean,
                    rolling_std: m.std,
                });
            }
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{date, rec};

    fn series(ticker: &str, flows: &[f64]) -> Vec<FlowRecord> {
        flows
            .iter()
            .enumerate()
            .map(|(i, f)| {
                let day = date("2025-02-01") + chrono::Days::new(i as u64);
                FlowRecord::new(day, ticker, *f)
            })
            .collect()
    }

    #[test]
    fn test_window_boundary() {
        let stats = rolling_stats(&series("SPY", &[1.0, 2.0, 3.0]), 3).expect("valid input");
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].date, date("2025-02-03"));
        assert_eq!(stats[0].rolling_mean, 2.0);
        assert_eq!(stats[0].rolling_std, 1.0);

        let stats = rolling_stats(&series("SPY", &[1.0, 2.0]), 3).expect("valid input");
        assert!(stats.is_empty());
    }

    #[test]
    fn test_unsorted_input_is_ordered_by_date_per_ticker() {
        let records = vec![
            rec("2025-01-03", "QQQ", 30.0),
            rec("2025-01-02", "SPY", 4.0),
            rec("2025-01-01", "QQQ", 10.0),
            rec("2025-01-03", "SPY", 8.0),
            rec("2025-01-02", "QQQ", 20.0),
            rec("2025-01-01", "SPY", 0.0),
        ];

        let stats = rolling_stats(&records, 2).expect("valid input");
        let got: Vec<_> = stats
            .iter()
            .map(|s| (s.etf_ticker.as_str(), s.date, s.rolling_mean))
            .collect();
        assert_eq!(
            got,
            vec![
                ("QQQ", date("2025-01-02"), 15.0),
                ("QQQ", date("2025-01-03"), 25.0),
                ("SPY", date("2025-01-02"), 2.0),
                ("SPY", date("2025-01-03"), 6.0),
            ]
        );
    }

    #[test]
    fn test_window_of_one_reports_value_and_zero_std() {
        let stats = rolling_stats(&series("IWM", &[5.0, -3.0, 7.5]), 1).expect("valid input");
        assert_eq!(stats.len(), 3);
        for (stat, want) in stats.iter().zip([5.0, -3.0, 7.5]) {
            assert_eq!(stat.rolling_mean, want);
            assert_eq!(stat.rolling_std, 0.0);
        }
    }

    #[test]
    fn test_sample_standard_deviation() {
        // Window [2, 4, 4, 4, 5, 5, 7, 9]: mean 5, sample variance 32 / 7
        let flows = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let stats = rolling_stats(&series("GLD", &flows), 8).expect("valid input");
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].rolling_mean, 5.0);
        assert!((stats[0].rolling_std - (32.0_f64 / 7.0).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_windows_do_not_leak_across_tickers() {
        let mut records = series("AAA", &[1.0, 1.0]);
        records.extend(series("BBB", &[100.0]));

        let stats = rolling_stats(&records, 2).expect("valid input");
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].etf_ticker, "AAA");
    }

    #[test]
    fn test_rejects_zero_window() {
        let err = rolling_stats(&series("SPY", &[1.0]), 0).expect_err("window 0");
        assert!(err.is_invalid_argument());

        let err = rolling_stats(&[], 0).expect_err("checked before the empty shortcut");
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_null_flows_are_not_observations() {
        let mut records = series("SPY", &[1.0, 2.0, 3.0]);
        records.insert(1, FlowRecord::with_null_flow(date("2025-02-02"), "SPY"));
        records.push(FlowRecord::with_null_flow(date("2025-02-01"), "EEM"));

        let stats = rolling_stats(&records, 3).expect("null flows are skipped");
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].etf_ticker, "SPY");
        assert_eq!(stats[0].rolling_mean, 2.0);

        let err = rolling_stats(&series("SPY", &[f64::INFINITY]), 1).expect_err("infinite flow");
        assert!(err.is_schema_violation());
    }

    #[test]
    fn test_empty_input() {
        assert!(rolling_stats(&[], 5).expect("empty").is_empty());
    }
}

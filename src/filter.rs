use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    domain::FlowRecord,
    error::{ArgumentError, FlowResult},
};

/// Narrows a record set before it is handed to the aggregations.
///
/// # Usage
/// Every field is an `Option`. A `None` field disables that filter, meaning all records pass it.
///
/// # Example
/// ```
/// # use chrono::NaiveDate;
/// # use etf_flows::prelude::*;
/// let from = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
/// let to = NaiveDate::from_ymd_opt(2025, 3, 31).unwrap();
///
/// let filter = FlowFilter::default()
///     .with_date_range(from, to)
///     .unwrap()
///     .with_tickers(["SPY", "QQQ"]);
/// assert!(!filter.is_unrestricted());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct FlowFilter {
    /// Inclusive lower date bound.
    #[serde(default)]
    pub date_from: Option<NaiveDate>,

    /// Inclusive upper date bound.
    #[serde(default)]
    pub date_to: Option<NaiveDate>,

    /// Allowlist of tickers.
    ///
    /// - `None`: All tickers are kept.
    /// - `Some(set)`: Only records whose ticker is in the set are kept.
    #[serde(default)]
    pub tickers: Option<BTreeSet<String>>,

    /// Allowlist of regions.
    ///
    /// - `None`: All records are kept, with or without a region.
    /// - `Some(set)`: Only records whose region is in the set are kept. Records **without** a
    ///   region are dropped.
    #[serde(default)]
    pub regions: Option<BTreeSet<String>>,
}

impl FlowFilter {
    /// Restricts records to `[from, to]`.
    ///
    /// # Errors
    /// Returns an invalid-argument error if `from` is after `to`.
    pub fn with_date_range(mut self, from: NaiveDate, to: NaiveDate) -> FlowResult<Self> {
        if from > to {
            return Err(ArgumentError::InvalidDateRange {
                from: from.to_string(),
                to: to.to_string(),
            }
            .into());
        }
        self.date_from = Some(from);
        self.date_to = Some(to);
        Ok(self)
    }

    pub fn with_tickers<I, S>(mut self, tickers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tickers = Some(tickers.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_regions<I, S>(mut self, regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.regions = Some(regions.into_iter().map(Into::into).collect());
        self
    }

    /// Returns true if no filters are active (all records pass).
    pub fn is_unrestricted(&self) -> bool {
        self.date_from.is_none()
            && self.date_to.is_none()
            && self.tickers.is_none()
            && self.regions.is_none()
    }

    /// Checks bounds set directly on the fields (e.g. from a config file).
    pub fn validate(&self) -> FlowResult<()> {
        if let (Some(from), Some(to)) = (self.date_from, self.date_to) {
            if from > to {
                return Err(ArgumentError::InvalidDateRange {
                    from: from.to_string(),
                    to: to.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }

    pub fn matches(&self, rec: &FlowRecord) -> bool {
        if self.date_from.is_some_and(|from| rec.date < from) {
            return false;
        }
        if self.date_to.is_some_and(|to| rec.date > to) {
            return false;
        }
        if let Some(tickers) = &self.tickers {
            if !tickers.contains(rec.etf_ticker.as_str()) {
                return false;
            }
        }
        if let Some(regions) = &self.regions {
            match rec.region() {
                Some(region) if regions.contains(region) => {}
                _ => return false,
            }
        }
        true
    }

    /// Copies the matching records, preserving their order.
    pub fn apply(&self, records: &[FlowRecord]) -> Vec<FlowRecord> {
        if self.is_unrestricted() {
            return records.to_vec();
        }
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{date, rec, regional_panel};

    fn tickers_of(records: &[FlowRecord]) -> Vec<(String, &str)> {
        records
            .iter()
            .map(|r| (r.date.to_string(), r.etf_ticker.as_str()))
            .collect()
    }

    #[test]
    fn test_unrestricted_filter_keeps_everything() {
        let records = regional_panel();
        let filter = FlowFilter::default();
        assert!(filter.is_unrestricted());
        assert_eq!(filter.apply(&records), records);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let filter = FlowFilter::default()
            .with_date_range(date("2025-01-02"), date("2025-01-03"))
            .expect("valid range");
        let kept = filter.apply(&regional_panel());
        assert_eq!(kept.len(), 6);
        assert!(kept.iter().all(|r| r.date >= date("2025-01-02")));
    }

    #[test]
    fn test_inverted_date_range_is_rejected() {
        let err = FlowFilter::default()
            .with_date_range(date("2025-02-01"), date("2025-01-01"))
            .expect_err("from > to");
        assert!(err.is_invalid_argument());

        let filter = FlowFilter {
            date_from: Some(date("2025-02-01")),
            date_to: Some(date("2025-01-01")),
            ..Default::default()
        };
        assert!(filter.validate().is_err());
    }

    #[test]
    fn test_ticker_allowlist() {
        let filter = FlowFilter::default().with_tickers(["SPY"]);
        let kept = filter.apply(&regional_panel());
        assert_eq!(
            tickers_of(&kept),
            vec![
                ("2025-01-01".to_string(), "SPY"),
                ("2025-01-02".to_string(), "SPY"),
                ("2025-01-03".to_string(), "SPY"),
            ]
        );
    }

    #[test]
    fn test_region_allowlist_drops_records_without_region() {
        let records = vec![
            rec("2025-01-01", "SPY", 1.0).with_region("US"),
            rec("2025-01-01", "VGK", 1.0).with_region("Europe"),
            rec("2025-01-01", "XYZ", 1.0),
        ];
        let filter = FlowFilter::default().with_regions(["US"]);
        let kept = filter.apply(&records);
        assert_eq!(tickers_of(&kept), vec![("2025-01-01".to_string(), "SPY")]);
    }

    #[test]
    fn test_filter_roundtrips_through_json() {
        let filter = FlowFilter::default()
            .with_tickers(["QQQ", "SPY"])
            .with_date_range(date("2025-01-01"), date("2025-01-31"))
            .expect("valid range");
        let json = serde_json::to_string(&filter).expect("serializable");
        let back: FlowFilter = serde_json::from_str(&json).expect("deserializable");
        assert_eq!(back, filter);
    }
}

use std::str::FromStr;

use chrono::NaiveDate;
use polars::prelude::PlSmallStr;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::error::{ArgumentError, FlowResult};

// ================================================================================================
// Input Records
// ================================================================================================

/// One row of ETF flow input.
///
/// A `(date, etf_ticker)` pair is expected to be unique. Nothing in this crate deduplicates:
/// duplicated pairs are ranked as separate rows, summed twice in totals and counted as separate
/// observations in rolling windows. Keeping the input clean is the caller's responsibility.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowRecord {
    /// Calendar day of the observation.
    pub date: NaiveDate,
    /// Fund identifier (e.g. `SPY`). Must not be blank.
    pub etf_ticker: String,
    /// Signed net flow in currency millions. `None` encodes a null cell from the loader.
    pub net_flow: Option<f64>,
    /// Optional categorical region. `None` or a blank string means the field is absent.
    pub region: Option<String>,
}

impl FlowRecord {
    pub fn new(date: NaiveDate, etf_ticker: impl Into<String>, net_flow: f64) -> Self {
        Self {
            date,
            etf_ticker: etf_ticker.into(),
            net_flow: Some(net_flow),
            region: None,
        }
    }

    /// A record whose flow cell was empty.
    pub fn with_null_flow(date: NaiveDate, etf_ticker: impl Into<String>) -> Self {
        Self {
            date,
            etf_ticker: etf_ticker.into(),
            net_flow: None,
            region: None,
        }
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// The region, if present and not blank.
    pub fn region(&self) -> Option<&str> {
        self.region
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }

    /// Value of the given grouping key for this record, `None` when the field is absent.
    pub fn key(&self, key: GroupKey) -> Option<&str> {
        match key {
            GroupKey::EtfTicker => Some(self.etf_ticker.as_str()),
            GroupKey::Region => self.region(),
        }
    }
}

// ================================================================================================
// Derived Records
// ================================================================================================

/// A [`FlowRecord`] with its dense rank among all records sharing its date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedRecord {
    pub record: FlowRecord,
    /// 1 = highest net flow of the day. Ties share a rank, ranks have no gaps.
    pub daily_rank: u32,
}

impl RankedRecord {
    pub fn date(&self) -> NaiveDate {
        self.record.date
    }

    pub fn etf_ticker(&self) -> &str {
        &self.record.etf_ticker
    }

    pub fn net_flow(&self) -> Option<f64> {
        self.record.net_flow
    }
}

/// Summed net flow for one distinct key value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyTotal {
    pub key: String,
    pub total_net_flow: f64,
}

pub type TickerTotal = KeyTotal;
pub type RegionTotal = KeyTotal;

/// Trailing-window statistics for one ticker, anchored at `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollingStat {
    pub etf_ticker: String,
    pub date: NaiveDate,
    pub rolling_mean: f64,
    /// Sample standard deviation (n - 1). Zero for a window of one observation.
    pub rolling_std: f64,
}

// ================================================================================================
// Columns & Grouping Keys
// ================================================================================================

/// Columns of the tabular flow input.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum FlowCol {
    /// Observation day.
    Date,
    /// Fund identifier.
    EtfTicker,
    /// Signed net flow in currency millions.
    NetFlow,
    /// Optional categorical region.
    Region,
}

impl From<FlowCol> for PlSmallStr {
    fn from(value: FlowCol) -> Self {
        value.as_str().into()
    }
}

impl FlowCol {
    pub fn name(&self) -> PlSmallStr {
        (*self).into()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    /// Whether the column must exist in every input frame.
    pub fn is_required(&self) -> bool {
        !matches!(self, Self::Region)
    }
}

/// Fields that totals can be grouped by.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum GroupKey {
    /// Group by fund.
    EtfTicker,
    /// Group by region. Records without a region are left out.
    Region,
}

impl GroupKey {
    /// Parses a field name, failing with an invalid-argument error for anything unknown.
    pub fn parse(field: &str) -> FlowResult<Self> {
        Self::from_str(field.trim())
            .map_err(|_| ArgumentError::UnknownKeyField(field.to_string()).into())
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl From<GroupKey> for FlowCol {
    fn from(value: GroupKey) -> Self {
        match value {
            GroupKey::EtfTicker => FlowCol::EtfTicker,
            GroupKey::Region => FlowCol::Region,
        }
    }
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 2).expect("valid date")
    }

    #[test]
    fn test_group_key_parse() {
        assert_eq!(GroupKey::parse("etf_ticker").unwrap(), GroupKey::EtfTicker);
        assert_eq!(GroupKey::parse(" region ").unwrap(), GroupKey::Region);

        let err = GroupKey::parse("sector").expect_err("unknown field must fail");
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_blank_region_is_absent() {
        let rec = FlowRecord::new(day(), "SPY", 1.0).with_region("   ");
        assert_eq!(rec.region(), None);
        assert_eq!(rec.key(GroupKey::Region), None);
        assert_eq!(rec.key(GroupKey::EtfTicker), Some("SPY"));

        let rec = FlowRecord::new(day(), "SPY", 1.0).with_region("US");
        assert_eq!(rec.key(GroupKey::Region), Some("US"));
    }

    #[test]
    fn test_flow_col_names() {
        assert_eq!(FlowCol::Date.as_str(), "date");
        assert_eq!(FlowCol::EtfTicker.as_str(), "etf_ticker");
        assert_eq!(FlowCol::NetFlow.as_str(), "net_flow");
        assert!(!FlowCol::Region.is_required());
        assert_eq!(FlowCol::from(GroupKey::Region), FlowCol::Region);
    }

    #[test]
    fn test_serde_names_match_column_names() {
        for col in FlowCol::iter() {
            let json = serde_json::to_value(col).expect("serializable");
            assert_eq!(json, serde_json::Value::from(col.as_str()));
        }
        let parsed: FlowCol = serde_json::from_str("\"etf_ticker\"").expect("snake_case name");
        assert_eq!(parsed, FlowCol::EtfTicker);

        let key = serde_json::to_value(GroupKey::EtfTicker).expect("serializable");
        assert_eq!(key, serde_json::Value::from("etf_ticker"));
    }
}

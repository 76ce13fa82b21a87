use std::{fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::{
    error::{ArgumentError, FlowResult, IoError},
    filter::FlowFilter,
};

pub const DEFAULT_TOP_N: usize = 3;
pub const DEFAULT_ROLLING_WINDOW: usize = 7;

/// Parameters of a full analysis run.
///
/// Every field has a default, so a config file only needs the values it changes:
///
/// ```json
/// { "top_n": 5, "filter": { "tickers": ["SPY", "QQQ"] } }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Ranks kept per day in the top-N table.
    pub top_n: usize,
    /// Observations per trailing window for the rolling statistics.
    pub rolling_window: usize,
    /// Whether to compute per-region totals. Data without regions yields an empty table.
    pub region_totals: bool,
    /// Pre-filter applied to the input before any aggregation.
    pub filter: FlowFilter,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            top_n: DEFAULT_TOP_N,
            rolling_window: DEFAULT_ROLLING_WINDOW,
            region_totals: true,
            filter: FlowFilter::default(),
        }
    }
}

impl AnalysisConfig {
    pub fn from_json_str(json: &str) -> FlowResult<Self> {
        let config: Self = serde_json::from_str(json).map_err(IoError::Json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> FlowResult<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            IoError::ReadFailed(format!("Failed to read config '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&raw)
    }

    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    pub fn with_rolling_window(mut self, window: usize) -> Self {
        self.rolling_window = window;
        self
    }

    pub fn with_region_totals(mut self, enabled: bool) -> Self {
        self.region_totals = enabled;
        self
    }

    pub fn with_filter(mut self, filter: FlowFilter) -> Self {
        self.filter = filter;
        self
    }

    /// # Errors
    /// Invalid argument for a zero `top_n` / `rolling_window` or an inverted date range.
    pub fn validate(&self) -> FlowResult<()> {
        if self.top_n == 0 {
            return Err(ArgumentError::InvalidConfig("top_n must be at least 1".to_string()).into());
        }
        if self.rolling_window == 0 {
            return Err(ArgumentError::InvalidConfig(
                "rolling_window must be at least 1".to_string(),
            )
            .into());
        }
        self.filter.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::date;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = AnalysisConfig::from_json_str(
            r#"{ "top_n": 5, "filter": { "tickers": ["SPY", "QQQ"], "date_from": "2025-01-02" } }"#,
        )
        .expect("valid config");

        assert_eq!(config.top_n, 5);
        assert_eq!(config.rolling_window, DEFAULT_ROLLING_WINDOW);
        assert!(config.region_totals);
        assert_eq!(config.filter.date_from, Some(date("2025-01-02")));
        assert_eq!(config.filter.tickers.as_ref().map(|t| t.len()), Some(2));
    }

    #[test]
    fn test_empty_json_is_default() {
        let config = AnalysisConfig::from_json_str("{}").expect("valid config");
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = AnalysisConfig::from_json_str(r#"{ "rolling_window": 0 }"#)
            .expect_err("zero window");
        assert!(err.is_invalid_argument());

        let err = AnalysisConfig::from_json_str(
            r#"{ "filter": { "date_from": "2025-02-01", "date_to": "2025-01-01" } }"#,
        )
        .expect_err("inverted range");
        assert!(err.is_invalid_argument());

        let err = AnalysisConfig::from_json_str(r#"{ "top_n": "three" }"#).expect_err("bad type");
        assert!(matches!(err, crate::error::FlowError::Io(IoError::Json(_))));
    }

    #[test]
    fn test_builder_overrides() {
        let config = AnalysisConfig::default()
            .with_top_n(1)
            .with_rolling_window(2)
            .with_region_totals(false);
        assert_eq!(config.top_n, 1);
        assert_eq!(config.rolling_window, 2);
        assert!(!config.region_totals);
        assert!(config.validate().is_ok());
        assert!(config.with_top_n(0).validate().is_err());
    }
}

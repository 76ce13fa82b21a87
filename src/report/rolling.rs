use std::sync::Arc;

use chrono::NaiveDate;
use polars::{
    df,
    frame::DataFrame,
    prelude::{DataType, Field, PlSmallStr, Schema, SchemaRef},
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

use crate::{
    domain::RollingStat,
    error::FlowResult,
    report::{
        io::{Report, ReportName, ToSchema},
        polars_ext::polars_to_flow_error,
    },
};

/// Columns of the rolling statistics table.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    PartialOrd,
    Ord,
    EnumIter,
    IntoStaticStr,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RollingCol {
    EtfTicker,
    /// Last day of the trailing window.
    Date,
    RollingMean,
    /// Sample standard deviation over the window.
    RollingStd,
}

impl From<RollingCol> for PlSmallStr {
    fn from(value: RollingCol) -> Self {
        value.as_str().into()
    }
}

impl RollingCol {
    pub fn name(&self) -> PlSmallStr {
        (*self).into()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone)]
pub struct RollingFlows {
    df: DataFrame,
    window: usize,
}

impl RollingFlows {
    pub fn new(stats: &[RollingStat], window: usize) -> FlowResult<Self> {
        let tickers: Vec<&str> = stats.iter().map(|s| s.etf_ticker.as_str()).collect();
        let dates: Vec<NaiveDate> = stats.iter().map(|s| s.date).collect();
        let means: Vec<f64> = stats.iter().map(|s| s.rolling_mean).collect();
        let stds: Vec<f64> = stats.iter().map(|s| s.rolling_std).collect();

        let df = df!(
            RollingCol::EtfTicker.as_str() => tickers,
            RollingCol::Date.as_str() => dates,
            RollingCol::RollingMean.as_str() => means,
            RollingCol::RollingStd.as_str() => stds,
        )
        .map_err(|e| polars_to_flow_error("rolling flows", e))?;

        Ok(Self { df, window })
    }

    pub fn window(&self) -> usize {
        self.window
    }
}

impl Report for RollingFlows {
    fn as_df(&self) -> &DataFrame {
        &self.df
    }
}

impl ReportName for RollingFlows {
    fn base_name(&self) -> String {
        format!("rolling_{}_flows", self.window)
    }
}

impl ToSchema for RollingFlows {
    fn to_schema() -> SchemaRef {
        let fields: Vec<Field> = RollingCol::iter()
            .map(|col| {
                let dtype = match col {
                    RollingCol::EtfTicker => DataType::String,
                    RollingCol::Date => DataType::Date,
                    RollingCol::RollingMean | RollingCol::RollingStd => DataType::Float64,
                };
                Field::new(col.into(), dtype)
            })
            .collect();

        Arc::new(Schema::from_iter(fields))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{aggregate::rolling_stats, test_support::regional_panel};

    #[test]
    fn test_rolling_table() {
        let stats = rolling_stats(&regional_panel(), 2).expect("valid input");
        let table = RollingFlows::new(&stats, 2).expect("table builds");

        assert_eq!(table.base_name(), "rolling_2_flows");
        assert_eq!(table.window(), 2);
        // 3 tickers x (3 days - 1)
        assert_eq!(table.as_df().height(), 6);

        for (name, expected_dtype) in RollingFlows::to_schema().iter() {
            let column = table
                .as_df()
                .column(name.as_str())
                .expect("column from schema is present");
            assert_eq!(column.dtype(), expected_dtype, "Type mismatch for '{name}'");
        }

        let means: Vec<f64> = table
            .as_df()
            .column(RollingCol::RollingMean.as_str())
            .expect("mean column")
            .f64()
            .expect("float column")
            .into_no_null_iter()
            .collect();
        // EWJ: (-15 + 25) / 2, (25 + 5) / 2
        assert_eq!(&means[..2], &[5.0, 15.0]);
    }
}

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
    domain::{FlowRecord, RankedRecord},
    error::{FlowError, FlowResult},
    report::{
        io::{Report, ReportName, ToSchema},
        polars_ext::polars_to_flow_error,
    },
};

/// Columns of the daily ranking table.
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
pub enum RankingCol {
    /// Observation day.
    Date,
    /// Fund identifier.
    EtfTicker,
    /// Signed net flow in currency millions.
    NetFlow,
    /// Region, null when absent.
    Region,
    /// Dense rank of the net flow within the day (1 = highest).
    DailyRank,
}

impl From<RankingCol> for PlSmallStr {
    fn from(value: RankingCol) -> Self {
        value.as_str().into()
    }
}

impl RankingCol {
    pub fn name(&self) -> PlSmallStr {
        (*self).into()
    }

    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

/// Dense daily ranking as a table, either complete or cut to the top `n` ranks.
#[derive(Debug, Clone)]
pub struct DailyRanking {
    df: DataFrame,
    top_n: Option<usize>,
}

impl DailyRanking {
    /// The complete ranking.
    pub fn new(ranked: &[RankedRecord]) -> FlowResult<Self> {
        Ok(Self {
            df: RankingSoA::from(ranked).try_into()?,
            top_n: None,
        })
    }

    /// A ranking that was already filtered with `top_n_per_day(.., n)`.
    pub fn top_n(ranked: &[RankedRecord], n: usize) -> FlowResult<Self> {
        Ok(Self {
            df: RankingSoA::from(ranked).try_into()?,
            top_n: Some(n),
        })
    }

    pub fn cutoff(&self) -> Option<usize> {
        self.top_n
    }
}

impl Report for DailyRanking {
    fn as_df(&self) -> &DataFrame {
        &self.df
    }
}

impl ReportName for DailyRanking {
    fn base_name(&self) -> String {
        match self.top_n {
            Some(n) => format!("top_{n}_daily"),
            None => "daily_ranking".to_string(),
        }
    }
}

impl ToSchema for DailyRanking {
    fn to_schema() -> SchemaRef {
        let fields: Vec<Field> = RankingCol::iter()
            .map(|col| {
                let dtype = match col {
                    RankingCol::Date => DataType::Date,
                    RankingCol::EtfTicker | RankingCol::Region => DataType::String,
                    RankingCol::NetFlow => DataType::Float64,
                    RankingCol::DailyRank => DataType::UInt32,
                };
                Field::new(col.into(), dtype)
            })
            .collect();

        Arc::new(Schema::from_iter(fields))
    }
}

struct RankingSoA<'a> {
    date: Vec<NaiveDate>,
    etf_ticker: Vec<&'a str>,
    net_flow: Vec<Option<f64>>,
    region: Vec<Option<&'a str>>,
    daily_rank: Vec<u32>,
}

impl<'a> From<&'a [RankedRecord]> for RankingSoA<'a> {
    fn from(ranked: &'a [RankedRecord]) -> Self {
        let n = ranked.len();
        let mut soa = Self {
            date: Vec::with_capacity(n),
            etf_ticker: Vec::with_capacity(n),
            net_flow: Vec::with_capacity(n),
            region: Vec::with_capacity(n),
            daily_rank: Vec::with_capacity(n),
        };
        for r in ranked {
            soa.date.push(r.record.date);
            soa.etf_ticker.push(r.record.etf_ticker.as_str());
            soa.net_flow.push(r.record.net_flow);
            soa.region.push(FlowRecord::region(&r.record));
            soa.daily_rank.push(r.daily_rank);
        }
        soa
    }
}

impl TryFrom<RankingSoA<'_>> for DataFrame {
    type Error = FlowError;

    fn try_from(value: RankingSoA<'_>) -> Result<Self, Self::Error> {
        df!(
            RankingCol::Date.as_str() => value.date,
            RankingCol::EtfTicker.as_str() => value.etf_ticker,
            RankingCol::NetFlow.as_str() => value.net_flow,
            RankingCol::Region.as_str() => value.region,
            RankingCol::DailyRank.as_str() => value.daily_rank,
        )
        .map_err(|e| polars_to_flow_error("daily ranking", e))
    }
}

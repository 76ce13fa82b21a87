use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::totals_by,
    domain::{FlowRecord, GroupKey, KeyTotal},
    error::FlowResult,
};

/// Headline figures for a set of flow records.
///
/// Null flows are counted in `null_flow_count` and otherwise ignored, the same
/// sum-with-null-skip policy the totals use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct FlowSummary {
    pub record_count: usize,
    pub null_flow_count: usize,
    pub ticker_count: usize,
    pub region_count: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// Sum of all positive flows.
    pub total_inflow: f64,
    /// Sum of all negative flows (zero or below).
    pub total_outflow: f64,
    pub net_flow: f64,
    /// Ticker with the highest total net flow.
    pub leader: Option<KeyTotal>,
    /// Ticker with the lowest total net flow.
    pub laggard: Option<KeyTotal>,
}

impl FlowSummary {
    pub fn from_records(records: &[FlowRecord]) -> FlowResult<Self> {
        // Also validates tickers and flows
        let ticker_totals = totals_by(records, GroupKey::EtfTicker)?;

        let regions: BTreeSet<&str> = records.iter().filter_map(FlowRecord::region).collect();
        let first_date = records.iter().map(|r| r.date).min();
        let last_date = records.iter().map(|r| r.date).max();

        let mut total_inflow = 0.0;
        let mut total_outflow = 0.0;
        let mut null_flow_count = 0;
        for rec in records {
            match rec.net_flow {
                Some(v) if v > 0.0 => total_inflow += v,
                Some(v) => total_outflow += v,
                None => null_flow_count += 1,
            }
        }

        Ok(Self {
            record_count: records.len(),
            null_flow_count,
            ticker_count: ticker_totals.len(),
            region_count: regions.len(),
            first_date,
            last_date,
            total_inflow,
            total_outflow,
            net_flow: total_inflow + total_outflow,
            leader: ticker_totals.first().cloned(),
            laggard: ticker_totals.last().cloned(),
        })
    }

    /// Number of calendar days covered, inclusive. Zero for an empty summary.
    pub fn span_days(&self) -> i64 {
        match (self.first_date, self.last_date) {
            (Some(first), Some(last)) => (last - first).num_days() + 1,
            _ => 0,
        }
    }
}

use std::sync::Arc;

use polars::{
    df,
    frame::DataFrame,
    prelude::{DataType, Field, Schema, SchemaRef},
};

use crate::{
    domain::{GroupKey, KeyTotal},
    error::FlowResult,
    report::{
        io::{Report, ReportName},
        polars_ext::polars_to_flow_error,
    },
};

/// Name of the summed flow column. The key column is named after the [`GroupKey`].
pub const TOTAL_NET_FLOW_COL: &str = "total_net_flow";

/// Per-key totals as a two-column table: `<group key>`, `total_net_flow`.
#[derive(Debug, Clone)]
pub struct FlowTotals {
    df: DataFrame,
    group_key: GroupKey,
}

impl FlowTotals {
    pub fn new(totals: &[KeyTotal], group_key: GroupKey) -> FlowResult<Self> {
        let keys: Vec<&str> = totals.iter().map(|t| t.key.as_str()).collect();
        let flows: Vec<f64> = totals.iter().map(|t| t.total_net_flow).collect();

        let df = df!(
            group_key.as_str() => keys,
            TOTAL_NET_FLOW_COL => flows,
        )
        .map_err(|e| polars_to_flow_error("flow totals", e))?;

        Ok(Self { df, group_key })
    }

    pub fn group_key(&self) -> GroupKey {
        self.group_key
    }

    /// Schema of a totals table grouped by `group_key`.
    pub fn schema_for(group_key: GroupKey) -> SchemaRef {
        Arc::new(Schema::from_iter([
            Field::new(group_key.as_str().into(), DataType::String),
            Field::new(TOTAL_NET_FLOW_COL.into(), DataType::Float64),
        ]))
    }
}

impl Report for FlowTotals {
    fn as_df(&self) -> &DataFrame {
        &self.df
    }
}

impl ReportName for FlowTotals {
    fn base_name(&self) -> String {
        format!("{}_totals", self.group_key)
    }
}

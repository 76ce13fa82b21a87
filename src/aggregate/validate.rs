use crate::{
    domain::FlowRecord,
    error::{ArgumentError, FlowResult, SchemaError},
};

pub(super) fn require_positive(name: &'static str, value: usize) -> FlowResult<()> {
    if value == 0 {
        return Err(ArgumentError::NonPositive { name, value }.into());
    }
    Ok(())
}

pub(super) fn require_ticker(row: usize, rec: &FlowRecord) -> FlowResult<()> {
    if rec.etf_ticker.trim().is_empty() {
        return Err(SchemaError::MissingValue {
            row,
            field: "etf_ticker",
        }
        .into());
    }
    Ok(())
}

/// The flow of `rec`, allowing nulls but never NaN or infinities.
pub(super) fn finite_flow(row: usize, rec: &FlowRecord) -> FlowResult<Option<f64>> {
    match rec.net_flow {
        Some(v) if !v.is_finite() => Err(SchemaError::InvalidValue {
            row,
            field: "net_flow",
            value: v.to_string(),
            msg: "net flow must be a finite number".to_string(),
        }
        .into()),
        other => Ok(other),
    }
}

use std::collections::BTreeMap;

use ordered_float::OrderedFloat;

use crate::{
    aggregate::validate,
    domain::{FlowRecord, GroupKey, KeyTotal},
    error::FlowResult,
};

/// Sums net flow per distinct value of `key`.
///
/// - Null flows contribute nothing, but their key is still reported (a key whose flows are all
///   null totals 0).
/// - Records without a value for `key` (e.g. no region) are excluded from the grouping entirely;
///   there is no catch-all "unknown" bucket.
///
/// The result is ordered by total descending, ties broken by key ascending.
///
/// # Errors
/// Schema violation for a blank ticker or a non-finite flow.
pub fn totals_by(records: &[FlowRecord], key: GroupKey) -> FlowResult<Vec<KeyTotal>> {
    let mut sums: BTreeMap<&str, f64> = BTreeMap::new();
    for (row, rec) in records.iter().enumerate() {
        validate::require_ticker(row, rec)?;
        let flow = validate::finite_flow(row, rec)?;

        let Some(value) = rec.key(key) else {
            continue;
        };
        *sums.entry(value).or_insert(0.0) += flow.unwrap_or(0.0);
    }

    let mut totals: Vec<KeyTotal> = sums
        .into_iter()
        .map(|(key, total)| KeyTotal {
            key: key.to_string(),
            total_net_flow: total,
        })
        .collect();

    totals.sort_by(|a, b| {
        OrderedFloat(b.total_net_flow)
            .cmp(&OrderedFloat(a.total_net_flow))
            .then_with(|| a.key.cmp(&b.key))
    });

    Ok(totals)
}

/// [`totals_by`] with the grouping field given by name (`"etf_ticker"` or `"region"`).
///
/// # Errors
/// Invalid argument for any other field name.
pub fn totals_by_field(records: &[FlowRecord], field: &str) -> FlowResult<Vec<KeyTotal>> {
    let key = GroupKey::parse(field)?;
    totals_by(records, key)
}

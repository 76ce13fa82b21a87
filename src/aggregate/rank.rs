use itertools::Itertools;
use ordered_float::OrderedFloat;

use crate::{
    aggregate::validate,
    domain::{FlowRecord, RankedRecord},
    error::FlowResult,
};

/// Dense-ranks every record by net flow within its date, highest flow first.
///
/// Equal flows share a rank and the next distinct flow gets the previous rank plus one, so
/// `[10, 10, 5]` ranks as `[1, 1, 2]`. Equality is exact IEEE equality (`-0.0 == 0.0`); flows
/// that differ only in the last bit do not tie.
///
/// Records with a null flow are left out of the ranking; they are never ranked as zero.
///
/// The output is ordered by date, then rank, then ticker, then input position.
///
/// # Errors
/// Schema violation for a blank ticker or a non-finite flow.
pub fn rank_daily(records: &[FlowRecord]) -> FlowResult<Vec<RankedRecord>> {
    let mut rows = Vec::with_capacity(records.len());
    for (row, rec) in records.iter().enumerate() {
        validate::require_ticker(row, rec)?;
        let Some(flow) = validate::finite_flow(row, rec)? else {
            continue;
        };
        rows.push((row, OrderedFloat(flow)));
    }

    rows.sort_by(|(ra, fa), (rb, fb)| {
        let (a, b) = (&records[*ra], &records[*rb]);
        a.date
            .cmp(&b.date)
            .then_with(|| fb.cmp(fa))
            .then_with(|| a.etf_ticker.cmp(&b.etf_ticker))
            .then_with(|| ra.cmp(rb))
    });

    let mut ranked = Vec::with_capacity(rows.len());
    for (_, day) in &rows.into_iter().chunk_by(|(row, _)| records[*row].date) {
        let mut rank = 0u32;
        let mut prev = None;
        for (row, flow) in day {
            if prev != Some(flow) {
                rank += 1;
                prev = Some(flow);
            }
            ranked.push(RankedRecord {
                record: records[row].clone(),
                daily_rank: rank,
            });
        }
    }

    Ok(ranked)
}

/// Keeps the ranked records with `daily_rank <= n`, in their original order.
///
/// Ties at the cut-off are all kept, so a day can contribute more than `n` records.
///
/// # Errors
/// Invalid argument when `n` is zero.
pub fn top_n_per_day(ranked: &[RankedRecord], n: usize) -> FlowResult<Vec<RankedRecord>> {
    validate::require_positive("n", n)?;

    Ok(ranked
        .iter()
        .filter(|r| (r.daily_rank as usize) <= n)
        .cloned()
        .collect())
}

//! Ranking and aggregation over ETF flow records.
//!
//! Every function here is a pure transformation of its input slice: no global state, no caching
//! and no I/O. Callers that want memoization wrap these functions explicitly (see
//! [`crate::memo::MemoizedAggregator`]); callers that want to narrow the input use
//! [`crate::filter::FlowFilter`] before calling in.
//!
//! # Null and schema policy
//! - A blank `etf_ticker` or a NaN / infinite `net_flow` fails the whole call.
//! - [`rank_daily`] and [`rolling_stats`] leave records with a null flow out; they are never
//!   coerced to zero.
//! - [`totals_by`] skips null flows (sum-with-null-skip): the key still appears, contributing 0.
//!
//! Parameters are validated before the input is looked at, so a zero `n` or `window` fails even
//! for an empty slice. An empty slice with valid parameters always yields an empty result.

mod rank;
mod rolling;
mod totals;
mod validate;

pub use rank::{rank_daily, top_n_per_day};
pub use rolling::rolling_stats;
pub use totals::{totals_by, totals_by_field};

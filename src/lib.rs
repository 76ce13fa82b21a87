//! Daily ETF fund-flow analytics.
//!
//! Load flow observations with [`io::load_csv`], then either call the pure functions in
//! [`aggregate`] directly or run the whole pipeline with [`analysis::FlowAnalysis`].

pub mod aggregate;
pub mod analysis;
pub mod config;
pub mod domain;
pub mod error;
pub mod filter;
pub mod io;
pub mod math;
pub mod memo;
pub mod prelude;
pub mod report;
pub mod summary;

#[cfg(test)]
mod test_support;

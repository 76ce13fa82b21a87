pub mod io;
pub mod polars_ext;
pub mod ranking;
pub mod rolling;
pub mod totals;

// 1. Traits
pub use crate::report::io::{Report, ReportName, ToCsv, ToJson, ToSchema};

// 2. Pipeline
pub use crate::aggregate::{rank_daily, rolling_stats, top_n_per_day, totals_by, totals_by_field};
pub use crate::analysis::FlowAnalysis;
pub use crate::memo::MemoizedAggregator;

// 3. Domain Types
pub use crate::domain::{
    FlowCol, FlowRecord, GroupKey, KeyTotal, RankedRecord, RegionTotal, RollingStat, TickerTotal,
};
pub use crate::summary::FlowSummary;

// 4. Configuration
pub use crate::config::AnalysisConfig;
pub use crate::filter::FlowFilter;

// 5. Reports
pub use crate::report::{
    io::FileExtension, ranking::DailyRanking, rolling::RollingFlows, totals::FlowTotals,
};

// 6. Errors
pub use crate::error::{ArgumentError, DataError, FlowError, FlowResult, IoError, SchemaError};

// 7. I/O
pub use crate::io::{load_csv, records_from_df, records_to_df};

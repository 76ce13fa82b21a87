use std::{fs::File, io::BufWriter, path::Path};

use tracing::{debug, info};

use crate::{
    aggregate::{rank_daily, rolling_stats, top_n_per_day, totals_by},
    config::AnalysisConfig,
    domain::{FlowRecord, GroupKey, RankedRecord, RegionTotal, RollingStat, TickerTotal},
    error::{FlowResult, IoError},
    report::{
        io::{FileExtension, ToCsv, ensure_dir},
        ranking::DailyRanking,
        rolling::RollingFlows,
        totals::FlowTotals,
    },
    summary::FlowSummary,
};

pub const SUMMARY_BASE_NAME: &str = "summary";

/// Every output of one analysis run over a (filtered) record set.
#[derive(Debug, Clone)]
pub struct FlowAnalysis {
    config: AnalysisConfig,
    records: Vec<FlowRecord>,
    summary: FlowSummary,
    ranking: Vec<RankedRecord>,
    top_n: Vec<RankedRecord>,
    ticker_totals: Vec<TickerTotal>,
    region_totals: Option<Vec<RegionTotal>>,
    rolling: Vec<RollingStat>,
}

impl FlowAnalysis {
    /// Filters `records` with `config.filter` and runs every aggregation on what remains.
    ///
    /// # Errors
    /// - Invalid argument if the config does not validate.
    /// - Schema violation from the aggregations, e.g. a blank ticker or a non-finite flow.
    #[tracing::instrument(skip_all, fields(input = records.len()))]
    pub fn run(records: &[FlowRecord], config: &AnalysisConfig) -> FlowResult<Self> {
        config.validate()?;

        let records = config.filter.apply(records);
        info!(
            kept = records.len(),
            top_n = config.top_n,
            window = config.rolling_window,
            "Running flow analysis"
        );

        let summary = FlowSummary::from_records(&records)?;
        debug!(
            tickers = summary.ticker_count,
            regions = summary.region_count,
            nulls = summary.null_flow_count,
            "Summary computed"
        );

        let ranking = rank_daily(&records)?;
        let top_n = top_n_per_day(&ranking, config.top_n)?;
        debug!(ranked = ranking.len(), top = top_n.len(), "Daily ranking computed");

        let ticker_totals = totals_by(&records, GroupKey::EtfTicker)?;
        let region_totals = if config.region_totals {
            Some(totals_by(&records, GroupKey::Region)?)
        } else {
            None
        };
        debug!(
            tickers = ticker_totals.len(),
            regions = region_totals.as_ref().map(Vec::len),
            "Totals computed"
        );

        let rolling = rolling_stats(&records, config.rolling_window)?;
        debug!(rows = rolling.len(), "Rolling statistics computed");

        info!(
            records = records.len(),
            net_flow = summary.net_flow,
            "Flow analysis finished"
        );

        Ok(Self {
            config: config.clone(),
            records,
            summary,
            ranking,
            top_n,
            ticker_totals,
            region_totals,
            rolling,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// The records that passed the filter, in input order.
    pub fn records(&self) -> &[FlowRecord] {
        &self.records
    }

    pub fn summary(&self) -> &FlowSummary {
        &self.summary
    }

    pub fn ranking(&self) -> &[RankedRecord] {
        &self.ranking
    }

    pub fn top_n(&self) -> &[RankedRecord] {
        &self.top_n
    }

    pub fn ticker_totals(&self) -> &[TickerTotal] {
        &self.ticker_totals
    }

    /// `None` when region totals were disabled in the config.
    pub fn region_totals(&self) -> Option<&[RegionTotal]> {
        self.region_totals.as_deref()
    }

    pub fn rolling(&self) -> &[RollingStat] {
        &self.rolling
    }

    pub fn ranking_report(&self) -> FlowResult<DailyRanking> {
        DailyRanking::new(&self.ranking)
    }

    pub fn top_n_report(&self) -> FlowResult<DailyRanking> {
        DailyRanking::top_n(&self.top_n, self.config.top_n)
    }

    pub fn ticker_totals_report(&self) -> FlowResult<FlowTotals> {
        FlowTotals::new(&self.ticker_totals, GroupKey::EtfTicker)
    }

    pub fn region_totals_report(&self) -> FlowResult<Option<FlowTotals>> {
        self.region_totals
            .as_deref()
            .map(|totals| FlowTotals::new(totals, GroupKey::Region))
            .transpose()
    }

    pub fn rolling_report(&self) -> FlowResult<RollingFlows> {
        RollingFlows::new(&self.rolling, self.config.rolling_window)
    }

    /// Writes every report as CSV plus `summary.json` into `dir`, creating it if needed.
    /// Existing files are overwritten.
    pub fn write_reports(&self, dir: impl AsRef<Path>) -> FlowResult<()> {
        let dir = dir.as_ref();
        ensure_dir(dir)?;

        self.ranking_report()?.to_csv(dir, None, None)?;
        self.top_n_report()?.to_csv(dir, None, None)?;
        self.ticker_totals_report()?.to_csv(dir, None, None)?;
        if let Some(region_totals) = self.region_totals_report()? {
            region_totals.to_csv(dir, None, None)?;
        }
        self.rolling_report()?.to_csv(dir, None, None)?;
        self.write_summary(dir)?;

        info!(dir = %dir.display(), "Reports written");
        Ok(())
    }

    fn write_summary(&self, dir: &Path) -> FlowResult<()> {
        let path = dir.join(format!("{SUMMARY_BASE_NAME}.{}", FileExtension::Json));
        let file = File::create(&path).map_err(|e| {
            IoError::WriteFailed(format!("Failed to create '{}': {e}", path.display()))
        })?;
        serde_json::to_writer_pretty(BufWriter::new(file), &self.summary).map_err(IoError::Json)?;
        debug!(path = %path.display(), "Summary written");
        Ok(())
    }
}

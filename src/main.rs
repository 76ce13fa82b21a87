use std::{path::PathBuf, time::Instant};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::Parser;
use etf_flows::prelude::*;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = cli.config()?;

    let start = Instant::now();
    let records = load_csv(&cli.input)
        .with_context(|| format!("Failed to load flows from '{}'", cli.input.display()))?;
    let analysis = FlowAnalysis::run(&records, &config).context("Flow analysis failed")?;

    print_summary(analysis.summary());
    print_table(
        &format!("Top {} per day", config.top_n),
        &analysis.top_n_report()?,
    );
    print_table("Totals by ETF", &analysis.ticker_totals_report()?);
    if let Some(region_totals) = analysis.region_totals_report()? {
        print_table("Totals by region", &region_totals);
    }
    print_table(
        &format!("Rolling {}-observation flows", config.rolling_window),
        &analysis.rolling_report()?,
    );

    if let Some(out) = &cli.out {
        analysis
            .write_reports(out)
            .with_context(|| format!("Failed to write reports to '{}'", out.display()))?;
        println!("\nReports written to {}", out.display());
    }

    info!(elapsed = ?start.elapsed(), "Done");
    Ok(())
}

// ================================================================================================
// CLI Structure
// ================================================================================================

/// Daily ETF fund-flow analytics: rankings, totals and rolling statistics.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// CSV with the columns date, etf_ticker, net_flow and an optional region.
    #[arg(long)]
    input: PathBuf,

    /// JSON analysis config. Flags below override its values.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Ranks kept per day in the top-N table.
    #[arg(long)]
    top_n: Option<usize>,

    /// Observations per trailing window for the rolling statistics.
    #[arg(long)]
    window: Option<usize>,

    /// Keep only these tickers (repeatable).
    #[arg(long = "ticker")]
    tickers: Vec<String>,

    /// Keep only these regions (repeatable).
    #[arg(long = "region")]
    regions: Vec<String>,

    /// First day to keep (format: YYYY-MM-DD).
    #[arg(long)]
    from: Option<NaiveDate>,

    /// Last day to keep (format: YYYY-MM-DD).
    #[arg(long)]
    to: Option<NaiveDate>,

    /// Skip the per-region totals.
    #[arg(long)]
    no_region_totals: bool,

    /// Directory for the CSV and JSON reports.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl Cli {
    /// Loads the config file (or defaults) and applies the flag overrides.
    fn config(&self) -> Result<AnalysisConfig> {
        let mut config = match &self.config {
            Some(path) => AnalysisConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config '{}'", path.display()))?,
            None => AnalysisConfig::default(),
        };

        if let Some(n) = self.top_n {
            config.top_n = n;
        }
        if let Some(window) = self.window {
            config.rolling_window = window;
        }
        if self.no_region_totals {
            config.region_totals = false;
        }
        if !self.tickers.is_empty() {
            config.filter = config.filter.with_tickers(self.tickers.iter().cloned());
        }
        if !self.regions.is_empty() {
            config.filter = config.filter.with_regions(self.regions.iter().cloned());
        }
        if let Some(from) = self.from {
            config.filter.date_from = Some(from);
        }
        if let Some(to) = self.to {
            config.filter.date_to = Some(to);
        }

        config.validate().context("Invalid analysis config")?;
        Ok(config)
    }
}

// ================================================================================================
// Output
// ================================================================================================

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_summary(summary: &FlowSummary) {
    println!("\n--- Flow Summary ---");
    println!("Records:        {}", summary.record_count);
    println!("Null flows:     {}", summary.null_flow_count);
    println!("ETFs:           {}", summary.ticker_count);
    println!("Regions:        {}", summary.region_count);
    if let (Some(first), Some(last)) = (summary.first_date, summary.last_date) {
        println!("Period:         {first} to {last} ({} days)", summary.span_days());
    }
    println!("Total inflow:   {:.2}", summary.total_inflow);
    println!("Total outflow:  {:.2}", summary.total_outflow);
    println!("Net flow:       {:.2}", summary.net_flow);
    if let Some(leader) = &summary.leader {
        println!("Leader:         {} ({:.2})", leader.key, leader.total_net_flow);
    }
    if let Some(laggard) = &summary.laggard {
        println!("Laggard:        {} ({:.2})", laggard.key, laggard.total_net_flow);
    }
}

fn print_table(title: &str, report: &impl Report) {
    println!("\n--- {title} ---");
    println!("{}", report.as_df());
}

#[cfg(test)]
mod tests {
    use std::{env, fs};

    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(
            ["etf-flows", "--input", "flows.csv"]
                .into_iter()
                .chain(args.iter().copied()),
        )
            .expect("valid arguments")
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("valid date")
    }

    #[test]
    fn test_defaults_without_flags() {
        let config = parse(&[]).config().expect("default config");
        assert_eq!(config, AnalysisConfig::default());
    }

    #[test]
    fn test_flags_override_config_file() {
        let dir = env::temp_dir().join(format!("etf_flows_cli_{}", std::process::id()));
        fs::create_dir_all(&dir).expect("scratch dir");
        let path = dir.join("analysis.json");
        fs::write(
            &path,
            r#"{ "top_n": 5, "rolling_window": 4, "filter": { "tickers": ["EFA"], "regions": ["Europe"], "date_from": "2024-12-01" } }"#,
        )
        .expect("config written");
        let path_arg = path.to_str().expect("temp path is valid UTF-8");

        let from_file = parse(&["--config", path_arg]).config().expect("file config");
        assert_eq!(from_file.top_n, 5);
        assert_eq!(from_file.rolling_window, 4);
        assert!(from_file.region_totals);

        let config = parse(&[
            "--config",
            path_arg,
            "--top-n",
            "2",
            "--ticker",
            "SPY",
            "--ticker",
            "QQQ",
            "--region",
            "US",
            "--from",
            "2025-01-02",
            "--to",
            "2025-01-08",
            "--no-region-totals",
        ])
        .config()
        .expect("overridden config");

        assert_eq!(config.top_n, 2);
        // not given on the command line, so the file value stays
        assert_eq!(config.rolling_window, 4);
        assert!(!config.region_totals);
        let tickers: Vec<&str> = config
            .filter
            .tickers
            .iter()
            .flatten()
            .map(String::as_str)
            .collect();
        assert_eq!(tickers, vec!["QQQ", "SPY"]);
        assert_eq!(config.filter.regions.as_ref().map(|r| r.len()), Some(1));
        assert!(config.filter.regions.as_ref().is_some_and(|r| r.contains("US")));
        assert_eq!(config.filter.date_from, Some(date("2025-01-02")));
        assert_eq!(config.filter.date_to, Some(date("2025-01-08")));

        fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_invalid_overrides_are_rejected() {
        assert!(parse(&["--window", "0"]).config().is_err());
        assert!(
            parse(&["--from", "2025-02-01", "--to", "2025-01-01"])
                .config()
                .is_err()
        );
        assert!(
            Cli::try_parse_from(["etf-flows", "--input", "f.csv", "--from", "01/02/2025"]).is_err()
        );
        assert!(Cli::try_parse_from(["etf-flows"]).is_err());
    }
}

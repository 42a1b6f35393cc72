use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::Parser;
use std::{error::Error, path::PathBuf};
use tracing::{error, info};
use xyz_volume::{
    FailurePolicy, HistoryTracker, TierTable, TrackerConfig, WindowOrder,
    aggregate::DEFAULT_MARKET_PREFIX,
    config::DEFAULT_DEX,
    fetch::{
        PAGE_LIMIT,
        hyperliquid::{DEFAULT_INFO_URL, DEFAULT_REQUEST_TIMEOUT},
        pacer::DEFAULT_MIN_INTERVAL,
    },
    window::DEFAULT_WINDOW_DAYS,
};

mod render;

/// Command-line arguments for the xyz volume tracker
#[derive(Debug, Parser)]
#[command(
    name = "xyz-volume-tracker",
    about = "Trading volume and eligibility tracker for trade.xyz markets on Hyperliquid",
    long_about = "
Fetches an account's fills on the xyz: markets of Hyperliquid and reports volume,
activity and an estimated eligibility tier.

By default the last 24 hours are compared against the current 24h market volume.
With --historical the whole history since launch is fetched in 7 day windows.

Examples:
  xyz-volume-tracker 0x742d35cc6634c0532925a3b844bc9e7595f0beb0
  xyz-volume-tracker 0x742d35cc6634c0532925a3b844bc9e7595f0beb0 --hours 72
  xyz-volume-tracker 0x742d35cc6634c0532925a3b844bc9e7595f0beb0 --historical --json
  xyz-volume-tracker 0x742d35cc6634c0532925a3b844bc9e7595f0beb0 --since 2025-01-01
",
    version
)]
struct Args {
    /// Account address: 0x followed by 40 hexadecimal digits
    address: String,

    /// Fetch the full history since launch instead of the last hours
    #[arg(long, conflicts_with = "hours")]
    historical: bool,

    /// Lookback of the short-term market comparison, in hours
    #[arg(long, default_value_t = 24)]
    hours: i64,

    /// Start of the historical range (YYYY-MM-DD, UTC); implies --historical
    #[arg(long, value_parser = parse_date, conflicts_with = "hours")]
    since: Option<DateTime<Utc>>,

    /// Print the report as JSON instead of text tables
    #[arg(long)]
    json: bool,

    /// Retry a window once after a transient failure
    #[arg(long, conflicts_with = "abort_on_failure")]
    retry_once: bool,

    /// Stop at the first failed window instead of reporting a partial result
    #[arg(long)]
    abort_on_failure: bool,

    /// JSON file overriding the eligibility tier thresholds
    #[arg(long, value_name = "FILE")]
    tiers: Option<PathBuf>,

    /// Fetch windows oldest first
    #[arg(long)]
    oldest_first: bool,

    #[arg(long, env = "XYZ_API_URL", default_value = DEFAULT_INFO_URL)]
    api_url: String,

    #[arg(long, env = "XYZ_MARKET_PREFIX", default_value = DEFAULT_MARKET_PREFIX)]
    market_prefix: String,

    #[arg(long, env = "XYZ_DEX", default_value = DEFAULT_DEX)]
    dex: String,

    /// Length of one query window, in days
    #[arg(long, env = "XYZ_WINDOW_DAYS", default_value_t = DEFAULT_WINDOW_DAYS)]
    window_days: i64,

    /// Minimum delay between upstream calls, in milliseconds
    #[arg(long, env = "XYZ_RATE_LIMIT_MS", default_value_t = DEFAULT_MIN_INTERVAL.as_millis() as u64)]
    rate_limit_ms: u64,

    #[arg(long, env = "XYZ_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    request_timeout_secs: u64,

    #[arg(long, env = "XYZ_PAGE_LIMIT", default_value_t = PAGE_LIMIT)]
    page_limit: usize,
}

impl Args {
    fn is_historical(&self) -> bool {
        self.historical || self.since.is_some()
    }

    fn failure_policy(&self) -> FailurePolicy {
        if self.abort_on_failure {
            FailurePolicy::Abort
        } else if self.retry_once {
            FailurePolicy::RetryOnce
        } else {
            FailurePolicy::Skip
        }
    }

    fn config(&self) -> Result<TrackerConfig, Box<dyn Error>> {
        let tiers = match &self.tiers {
            Some(path) => serde_json::from_str::<TierTable>(&std::fs::read_to_string(path)?)?,
            None => TierTable::default(),
        };

        Ok(TrackerConfig {
            api_url: self.api_url.clone(),
            market_prefix: self.market_prefix.clone(),
            dex: self.dex.clone(),
            window_days: self.window_days,
            window_order: if self.oldest_first {
                WindowOrder::OldestFirst
            } else {
                WindowOrder::NewestFirst
            },
            rate_limit_ms: self.rate_limit_ms,
            request_timeout_secs: self.request_timeout_secs,
            page_limit: self.page_limit,
            failure_policy: self.failure_policy(),
            tiers,
            ..Default::default()
        })
    }
}

fn parse_date(input: &str) -> Result<DateTime<Utc>, String> {
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .map(|date| date.and_time(NaiveTime::MIN).and_utc())
        .map_err(|error| format!("expected YYYY-MM-DD: {error}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    init_logging();

    let args = Args::parse();
    let config = args.config()?;
    info!(
        api_url = %config.api_url,
        market_prefix = %config.market_prefix,
        policy = ?config.failure_policy,
        "starting xyz volume tracker"
    );

    let mut tracker = HistoryTracker::hyperliquid(config)?;
    let now = Utc::now();
    let mut output = String::new();

    if args.is_historical() {
        let report = tracker
            .historical(&args.address, args.since)
            .await
            .inspect_err(|error| error!(%error, "historical tracking failed"))?;

        if args.json {
            output = serde_json::to_string_pretty(&report)?;
        } else {
            render::history(&mut output, &report, now)?;
        }
    } else {
        let report = tracker
            .recent(&args.address, args.hours)
            .await
            .inspect_err(|error| error!(%error, "short-term tracking failed"))?;

        if args.json {
            output = serde_json::to_string_pretty(&report)?;
        } else {
            render::comparison(&mut output, &report, args.hours, now)?;
        }
    }

    println!("{output}");
    info!(calls = tracker.calls(), "done");
    Ok(())
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    const ADDRESS: &str = "0x742d35cc6634c0532925a3b844bc9e7595f0beb0";

    #[test]
    fn test_args_defaults() {
        let args = Args::try_parse_from(["xyz-volume-tracker", ADDRESS]).unwrap();

        assert!(!args.is_historical());
        assert_eq!(args.hours, 24);
        assert_eq!(args.failure_policy(), FailurePolicy::Skip);

        let config = args.config().unwrap();
        assert_eq!(config.window_order, WindowOrder::NewestFirst);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_args_modes() {
        struct TestCase {
            input: Vec<&'static str>,
            expected_historical: bool,
            expected_policy: FailurePolicy,
        }

        let tests = vec![
            TestCase {
                // TC0
                input: vec![ADDRESS, "--historical"],
                expected_historical: true,
                expected_policy: FailurePolicy::Skip,
            },
            TestCase {
                // TC1: --since implies historical
                input: vec![ADDRESS, "--since", "2025-01-01", "--retry-once"],
                expected_historical: true,
                expected_policy: FailurePolicy::RetryOnce,
            },
            TestCase {
                // TC2
                input: vec![ADDRESS, "--hours", "72", "--abort-on-failure"],
                expected_historical: false,
                expected_policy: FailurePolicy::Abort,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let args = Args::try_parse_from(std::iter::once("xyz-volume-tracker").chain(test.input))
                .unwrap();
            assert_eq!(args.is_historical(), test.expected_historical, "TC{} failed", index);
            assert_eq!(args.failure_policy(), test.expected_policy, "TC{} failed", index);
        }
    }

    #[test]
    fn test_args_conflicts() {
        let actual = Args::try_parse_from([
            "xyz-volume-tracker",
            ADDRESS,
            "--historical",
            "--hours",
            "12",
        ]);
        assert!(actual.is_err());

        let actual = Args::try_parse_from([
            "xyz-volume-tracker",
            ADDRESS,
            "--retry-once",
            "--abort-on-failure",
        ]);
        assert!(actual.is_err());
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2025-01-01").unwrap().to_rfc3339(),
            "2025-01-01T00:00:00+00:00"
        );
        assert!(parse_date("01/01/2025").is_err());
    }
}

//! End-to-end pipeline: plan windows, fetch each one under a [`FailurePolicy`],
//! aggregate the fills and derive the [`MetricsReport`].

use crate::{
    account::Account,
    aggregate::FillAggregator,
    clock::{Clock, SystemClock},
    config::TrackerConfig,
    error::{FetchError, TrackerError},
    fetch::{DelayStrategy, FillSource, HyperliquidClient, MinInterval, WindowFetcher, WindowFills},
    market::MarketComparison,
    metrics::{MetricsEngine, MetricsReport},
    window::{Window, WindowPlanner},
};
use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

/// What to do when a window query fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Record the failed window and continue with the next one.
    #[default]
    Skip,
    /// Retry a retryable failure once, then behave like [`FailurePolicy::Skip`].
    RetryOnce,
    /// Stop the run at the first failed window.
    Abort,
}

impl FailurePolicy {
    fn max_attempts(&self) -> usize {
        match self {
            Self::RetryOnce => 2,
            Self::Skip | Self::Abort => 1,
        }
    }
}

/// Window that yielded no data, with the last error observed for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WindowFailure {
    pub window: Window,
    pub error: FetchError,
    pub attempts: usize,
}

/// Non-fatal anomaly observed while fetching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum WindowWarning {
    /// Window returned a full page and may be missing fills.
    PageLimitReached { window: Window, records: usize },
}

/// Outcome of one tracking run over `[period.start, period.end)`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryReport {
    pub account: Account,
    pub period: Window,
    pub windows_planned: usize,
    pub windows_fetched: usize,
    pub failed_windows: Vec<WindowFailure>,
    pub warnings: Vec<WindowWarning>,
    pub metrics: MetricsReport,
}

impl HistoryReport {
    /// At least one window yielded no data, so the metrics undercount.
    pub fn is_partial(&self) -> bool {
        !self.failed_windows.is_empty()
    }
}

/// Short-term activity of an account next to the market's 24h volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub history: HistoryReport,
    pub comparison: MarketComparison,
}

/// Drives window planning, paced fetching, aggregation and metrics for one account.
#[derive(Debug)]
pub struct HistoryTracker<Source, Strategy, C> {
    config: TrackerConfig,
    fetcher: WindowFetcher<Source, Strategy>,
    clock: C,
    engine: MetricsEngine,
}

impl HistoryTracker<HyperliquidClient, MinInterval, SystemClock> {
    /// Tracker over the Hyperliquid info API described by `config`.
    pub fn hyperliquid(config: TrackerConfig) -> Result<Self, TrackerError> {
        let client = HyperliquidClient::new(config.info_url()?, config.request_timeout());
        let strategy = MinInterval(config.rate_limit());
        Self::new(config, client, strategy, SystemClock)
    }
}

impl<Source, Strategy, C> HistoryTracker<Source, Strategy, C>
where
    Source: FillSource + Sync,
    Strategy: DelayStrategy,
    C: Clock,
{
    pub fn new(
        config: TrackerConfig,
        source: Source,
        strategy: Strategy,
        clock: C,
    ) -> Result<Self, TrackerError> {
        config.validate()?;

        Ok(Self {
            fetcher: WindowFetcher::new(source, strategy, config.page_limit),
            engine: MetricsEngine::new(config.tiers),
            config,
            clock,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    pub fn source(&self) -> &Source {
        self.fetcher.source()
    }

    /// Number of upstream calls issued so far, retries included.
    pub fn calls(&self) -> usize {
        self.fetcher.calls()
    }

    /// Track `address` from `since` (or the launch date) until now.
    ///
    /// The address is validated before any upstream call is made.
    pub async fn historical(
        &mut self,
        address: &str,
        since: Option<DateTime<Utc>>,
    ) -> Result<HistoryReport, TrackerError> {
        let account = Account::parse(address)?;
        let planner = WindowPlanner::bounded(
            since,
            self.config.launch_date,
            &self.clock,
            self.config.window_length(),
            self.config.window_order,
        )?;

        self.run(&account, &planner).await
    }

    /// Track `address` over the last `hours` and compare it with current market volume.
    pub async fn recent(
        &mut self,
        address: &str,
        hours: i64,
    ) -> Result<ComparisonReport, TrackerError> {
        let account = Account::parse(address)?;
        let lookback = TimeDelta::try_hours(hours)
            .filter(|lookback| *lookback > TimeDelta::zero())
            .ok_or_else(|| TrackerError::Config(format!("hours must be positive, got {hours}")))?;

        let now = self.clock.now();
        let start = now
            .checked_sub_signed(lookback)
            .map_or(self.config.launch_date, |start| start.max(self.config.launch_date));
        let planner = WindowPlanner::new(
            start,
            now,
            self.config.window_length(),
            self.config.window_order,
        )?;

        let history = self.run(&account, &planner).await?;

        let volumes = self
            .fetcher
            .market_volumes(&self.config.dex)
            .await
            .map_err(TrackerError::MarketVolumes)?;

        info!(
            dex = %self.config.dex,
            markets = volumes.len(),
            "fetched market volumes"
        );

        let comparison = MarketComparison::new(&history.metrics, &volumes);
        Ok(ComparisonReport {
            history,
            comparison,
        })
    }

    async fn run(
        &mut self,
        account: &Account,
        planner: &WindowPlanner,
    ) -> Result<HistoryReport, TrackerError> {
        let period = Window::new(planner.start(), planner.end());
        let windows_planned = planner.len();

        info!(
            %account,
            %period,
            windows = windows_planned,
            policy = ?self.config.failure_policy,
            "fetching fill history"
        );

        let mut aggregator = FillAggregator::new(self.config.market_prefix.as_str());
        let mut failed_windows = Vec::new();
        let mut warnings = Vec::new();
        let mut windows_fetched = 0;

        for (index, window) in planner.windows().enumerate() {
            match self.fetch_window(account, &window).await {
                Ok(WindowFills {
                    fills,
                    received,
                    page_limit_reached,
                    ..
                }) => {
                    windows_fetched += 1;
                    if page_limit_reached {
                        warnings.push(WindowWarning::PageLimitReached {
                            window,
                            records: received,
                        });
                    }

                    let before = aggregator.len();
                    aggregator.push(fills);
                    info!(
                        window = index + 1,
                        of = windows_planned,
                        range = %window,
                        received,
                        new = aggregator.len() - before,
                        "window fetched"
                    );
                }
                Err(failure) if self.config.failure_policy == FailurePolicy::Abort => {
                    return Err(TrackerError::WindowFailed {
                        window: failure.window,
                        source: failure.error,
                    });
                }
                Err(failure) => {
                    warn!(
                        range = %failure.window,
                        error = %failure.error,
                        attempts = failure.attempts,
                        "window failed, continuing without it"
                    );
                    failed_windows.push(failure);
                }
            }
        }

        let history = aggregator.finish();
        let metrics = self.engine.compute(&history);

        info!(
            %account,
            fills = metrics.trade_count,
            volume = %metrics.total_volume,
            failed = failed_windows.len(),
            "fill history complete"
        );

        Ok(HistoryReport {
            account: account.clone(),
            period,
            windows_planned,
            windows_fetched,
            failed_windows,
            warnings,
            metrics,
        })
    }

    async fn fetch_window(
        &mut self,
        account: &Account,
        window: &Window,
    ) -> Result<WindowFills, WindowFailure> {
        let max_attempts = self.config.failure_policy.max_attempts();
        let mut attempts = 0;

        loop {
            attempts += 1;
            match self.fetcher.fetch(account, window).await {
                Ok(fills) => return Ok(fills),
                Err(error) if attempts < max_attempts && error.is_retryable() => {
                    warn!(range = %window, %error, attempts, "window failed, retrying");
                }
                Err(error) => {
                    return Err(WindowFailure {
                        window: *window,
                        error,
                        attempts,
                    });
                }
            }
        }
    }
}

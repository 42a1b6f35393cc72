//! # XYZ Volume
//! Trading volume tracker for the `xyz:` markets listed on Hyperliquid.
//!
//! The upstream fill query returns at most one page of records, so a long
//! history is fetched as a sequence of bounded [`Window`]s, each queried
//! exactly once and paced by a [`DelayStrategy`](fetch::DelayStrategy).
//! Window results are merged by the [`FillAggregator`], which drops
//! duplicates and fills outside the tracked market namespace, and the
//! resulting history is reduced to a [`MetricsReport`] with an
//! [`EligibilityTier`].
//!
//! [`HistoryTracker`] drives the whole pipeline:
//! ```rust,ignore
//! let mut tracker = HistoryTracker::hyperliquid(TrackerConfig::default())?;
//! let report = tracker.historical("0x742d35cc6634c0532925a3b844bc9e7595f0beb0", None).await?;
//! println!("{} over {} fills", report.metrics.total_volume, report.metrics.trade_count);
//! ```

/// Validated account identifiers.
pub mod account;

/// Deduplicating, namespace filtering merge of per-window fills.
pub mod aggregate;

pub mod clock;

/// [`TrackerConfig`] and its defaults.
pub mod config;

/// All errors generated in `xyz-volume`.
pub mod error;

pub mod fetch;

/// Normalised trade fill.
pub mod fill;

pub mod market;

pub mod metrics;

pub mod tracker;

pub mod window;

#[cfg(test)]
mod test_utils;

pub use account::Account;
pub use aggregate::{AggregatedHistory, FillAggregator};
pub use config::TrackerConfig;
pub use error::{AccountError, FetchError, TrackerError};
pub use fill::Fill;
pub use market::{MarketComparison, MarketVolumes, ShareRank};
pub use metrics::{ConsistencyRating, EligibilityTier, MetricsEngine, MetricsReport, TierTable};
pub use tracker::{ComparisonReport, FailurePolicy, HistoryReport, HistoryTracker};
pub use window::{Window, WindowOrder, WindowPlanner};

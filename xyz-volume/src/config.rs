use crate::{
    aggregate::DEFAULT_MARKET_PREFIX,
    error::TrackerError,
    fetch::{
        PAGE_LIMIT,
        hyperliquid::{DEFAULT_INFO_URL, DEFAULT_REQUEST_TIMEOUT},
        pacer::DEFAULT_MIN_INTERVAL,
    },
    metrics::TierTable,
    tracker::FailurePolicy,
    window::{DEFAULT_WINDOW_DAYS, WindowOrder},
};
use chrono::{DateTime, TimeDelta, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// Default dex whose market volumes are compared against.
pub const DEFAULT_DEX: &str = "xyz";

/// Approximate launch of the trade.xyz markets; no fills exist before it.
pub fn default_launch_date() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 10, 1, 0, 0, 0)
        .single()
        .unwrap_or(DateTime::UNIX_EPOCH)
}

/// Tracker configuration.
///
/// Every field has a default matching the public Hyperliquid deployment, so
/// an empty document deserialises into a usable configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Hyperliquid info endpoint.
    pub api_url: String,
    /// Markets whose symbol starts with this prefix are tracked.
    pub market_prefix: String,
    /// Dex name used for the market volume lookup.
    pub dex: String,
    /// Length of one paginated query window, in days.
    pub window_days: i64,
    pub window_order: WindowOrder,
    /// Minimum delay between two upstream calls, in milliseconds.
    pub rate_limit_ms: u64,
    pub request_timeout_secs: u64,
    /// Records per response at which a window is reported as possibly truncated.
    pub page_limit: usize,
    /// Historical queries never start before this instant.
    pub launch_date: DateTime<Utc>,
    pub failure_policy: FailurePolicy,
    pub tiers: TierTable,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_INFO_URL.to_string(),
            market_prefix: DEFAULT_MARKET_PREFIX.to_string(),
            dex: DEFAULT_DEX.to_string(),
            window_days: DEFAULT_WINDOW_DAYS,
            window_order: WindowOrder::default(),
            rate_limit_ms: DEFAULT_MIN_INTERVAL.as_millis() as u64,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT.as_secs(),
            page_limit: PAGE_LIMIT,
            launch_date: default_launch_date(),
            failure_policy: FailurePolicy::default(),
            tiers: TierTable::default(),
        }
    }
}

impl TrackerConfig {
    /// Parsed [`TrackerConfig::api_url`].
    pub fn info_url(&self) -> Result<Url, TrackerError> {
        let url = Url::parse(&self.api_url)
            .map_err(|error| TrackerError::Config(format!("invalid api_url {}: {error}", self.api_url)))?;

        if matches!(url.scheme(), "http" | "https") {
            Ok(url)
        } else {
            Err(TrackerError::Config(format!(
                "api_url must be http(s), got {}",
                self.api_url
            )))
        }
    }

    pub fn window_length(&self) -> TimeDelta {
        TimeDelta::try_days(self.window_days).unwrap_or(TimeDelta::MAX)
    }

    pub fn rate_limit(&self) -> Duration {
        Duration::from_millis(self.rate_limit_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Check the values cannot produce a degenerate run.
    pub fn validate(&self) -> Result<(), TrackerError> {
        if self.window_days <= 0 {
            return Err(TrackerError::Config(format!(
                "window_days must be positive, got {}",
                self.window_days
            )));
        }

        if self.page_limit == 0 {
            return Err(TrackerError::Config("page_limit must be positive".to_string()));
        }

        if self.market_prefix.is_empty() {
            return Err(TrackerError::Config(
                "market_prefix must not be empty".to_string(),
            ));
        }

        self.info_url().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TrackerConfig::default();

        assert_eq!(config.info_url().unwrap().as_str(), "https://api.hyperliquid.xyz/info");
        assert_eq!(config.market_prefix, "xyz:");
        assert_eq!(config.window_length(), TimeDelta::days(7));
        assert_eq!(config.rate_limit(), Duration::from_millis(500));
        assert_eq!(config.page_limit, 10_000);
        assert_eq!(config.launch_date.to_rfc3339(), "2024-10-01T00:00:00+00:00");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_partial_document_uses_defaults() {
        let config = serde_json::from_str::<TrackerConfig>(
            r#"{"market_prefix": "abc:", "window_days": 3, "failure_policy": "retry_once"}"#,
        )
        .unwrap();

        assert_eq!(config.market_prefix, "abc:");
        assert_eq!(config.window_length(), TimeDelta::days(3));
        assert_eq!(config.failure_policy, FailurePolicy::RetryOnce);
        assert_eq!(config.dex, "xyz");
    }

    #[test]
    fn test_config_validate() {
        struct TestCase {
            input: TrackerConfig,
            expected_ok: bool,
        }

        let tests = vec![
            TestCase {
                // TC0: zero length windows
                input: TrackerConfig {
                    window_days: 0,
                    ..Default::default()
                },
                expected_ok: false,
            },
            TestCase {
                // TC1: zero page limit
                input: TrackerConfig {
                    page_limit: 0,
                    ..Default::default()
                },
                expected_ok: false,
            },
            TestCase {
                // TC2: empty namespace would track every market
                input: TrackerConfig {
                    market_prefix: String::new(),
                    ..Default::default()
                },
                expected_ok: false,
            },
            TestCase {
                // TC3: non http endpoint
                input: TrackerConfig {
                    api_url: "ws://api.hyperliquid.xyz/ws".to_string(),
                    ..Default::default()
                },
                expected_ok: false,
            },
            TestCase {
                // TC4: unparseable endpoint
                input: TrackerConfig {
                    api_url: "api.hyperliquid.xyz".to_string(),
                    ..Default::default()
                },
                expected_ok: false,
            },
            TestCase {
                // TC5: one day windows
                input: TrackerConfig {
                    window_days: 1,
                    ..Default::default()
                },
                expected_ok: true,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = test.input.validate();
            assert_eq!(actual.is_ok(), test.expected_ok, "TC{} failed", index);
        }
    }
}

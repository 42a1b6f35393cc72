//! Upstream access: the [`FillSource`] seam, the Hyperliquid implementation and
//! the [`WindowFetcher`] that issues exactly one paced query per [`Window`].

use crate::{
    account::Account, error::FetchError, fill::Fill, market::MarketVolumes, window::Window,
};
use async_trait::async_trait;
use tracing::{debug, warn};

/// Hyperliquid info API client.
pub mod hyperliquid;

/// Inter-call delay strategies.
pub mod pacer;

pub use hyperliquid::HyperliquidClient;
pub use pacer::{DelayStrategy, MinInterval, NoDelay, Pacer};

/// Hard cap on records returned by one `userFillsByTime` query.
pub const PAGE_LIMIT: usize = 10_000;

/// Upstream data source for account fills and point-in-time market volumes.
#[async_trait]
pub trait FillSource {
    /// Fetch at most one page of fills for `account` inside `window`.
    async fn fills_in_window(
        &self,
        account: &Account,
        window: &Window,
    ) -> Result<Vec<Fill>, FetchError>;

    /// Fetch the current 24h notional volume of every listed market of `dex`.
    async fn market_volumes(&self, dex: &str) -> Result<MarketVolumes, FetchError>;
}

#[async_trait]
impl<S> FillSource for &S
where
    S: FillSource + Sync + ?Sized,
{
    async fn fills_in_window(
        &self,
        account: &Account,
        window: &Window,
    ) -> Result<Vec<Fill>, FetchError> {
        (**self).fills_in_window(account, window).await
    }

    async fn market_volumes(&self, dex: &str) -> Result<MarketVolumes, FetchError> {
        (**self).market_volumes(dex).await
    }
}

/// Fills returned for one [`Window`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowFills {
    pub window: Window,
    pub fills: Vec<Fill>,
    /// Raw records in the response, before dropping those outside the window.
    pub received: usize,
    /// The upstream returned a full page, so the window may be missing fills.
    pub page_limit_reached: bool,
}

/// Issues one paced, bounded query per [`Window`].
#[derive(Debug)]
pub struct WindowFetcher<Source, Strategy> {
    source: Source,
    pacer: Pacer<Strategy>,
    page_limit: usize,
    calls: usize,
}

impl<Source, Strategy> WindowFetcher<Source, Strategy>
where
    Source: FillSource + Sync,
    Strategy: DelayStrategy,
{
    pub fn new(source: Source, strategy: Strategy, page_limit: usize) -> Self {
        Self {
            source,
            pacer: Pacer::new(strategy),
            page_limit,
            calls: 0,
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    /// Number of upstream calls issued so far, retries included.
    pub fn calls(&self) -> usize {
        self.calls
    }

    /// Query `window` once, waiting on the pacer first.
    ///
    /// Records falling outside the half-open window are dropped; a response
    /// holding `page_limit` or more raw records is flagged as possibly truncated.
    pub async fn fetch(
        &mut self,
        account: &Account,
        window: &Window,
    ) -> Result<WindowFills, FetchError> {
        self.pacer.wait().await;
        self.calls += 1;

        let raw = self.source.fills_in_window(account, window).await?;
        let received = raw.len();
        let page_limit_reached = received >= self.page_limit;

        if page_limit_reached {
            warn!(
                %window,
                received,
                page_limit = self.page_limit,
                "window returned a full page, fills may be missing; use a shorter window"
            );
        }

        let fills = raw
            .into_iter()
            .filter(|fill| window.contains(&fill.time))
            .collect::<Vec<_>>();

        if fills.len() != received {
            debug!(
                %window,
                dropped = received - fills.len(),
                "dropped fills outside of window bounds"
            );
        }

        Ok(WindowFills {
            window: *window,
            fills,
            received,
            page_limit_reached,
        })
    }

    /// Fetch the current market volumes of `dex`, paced like any other call.
    pub async fn market_volumes(&mut self, dex: &str) -> Result<MarketVolumes, FetchError> {
        self.pacer.wait().await;
        self.calls += 1;
        self.source.market_volumes(dex).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{MockSource, account, fill, utc};
    use chrono::TimeDelta;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_fetch_flags_full_page() {
        let window = Window::new(utc(2025, 1, 1), utc(2025, 1, 8));
        let fills = (0..PAGE_LIMIT as i64)
            .map(|i| fill(window.start + TimeDelta::seconds(i), "xyz:TSLA", dec!(100), dec!(1)))
            .collect();
        let mut fetcher = WindowFetcher::new(MockSource::new(fills), NoDelay, PAGE_LIMIT);

        let actual = fetcher.fetch(&account(), &window).await.unwrap();
        assert!(actual.page_limit_reached);
        assert_eq!(actual.received, PAGE_LIMIT);
        assert_eq!(actual.fills.len(), PAGE_LIMIT);
    }

    #[tokio::test]
    async fn test_fetch_below_page_limit_is_complete() {
        let window = Window::new(utc(2025, 1, 1), utc(2025, 1, 8));
        let fills = vec![fill(utc(2025, 1, 2), "xyz:NVDA", dec!(50), dec!(-3))];
        let mut fetcher = WindowFetcher::new(MockSource::new(fills), NoDelay, PAGE_LIMIT);

        let actual = fetcher.fetch(&account(), &window).await.unwrap();
        assert!(!actual.page_limit_reached);
        assert_eq!(actual.window, window);
        assert_eq!(actual.fills.len(), 1);
        assert_eq!(fetcher.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_propagates_window_failure() {
        let window = Window::new(utc(2025, 1, 1), utc(2025, 1, 8));
        let source = MockSource::new(vec![]).fail_once(window, FetchError::Status(500));
        let mut fetcher = WindowFetcher::new(source, NoDelay, PAGE_LIMIT);

        let actual = fetcher.fetch(&account(), &window).await;
        assert_eq!(actual, Err(FetchError::Status(500)));

        // Failure was scripted once only
        let actual = fetcher.fetch(&account(), &window).await;
        assert!(actual.is_ok());
        assert_eq!(fetcher.calls(), 2);
    }
}

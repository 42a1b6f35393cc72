use crate::{
    account::Account,
    error::FetchError,
    fetch::FillSource,
    fill::Fill,
    market::MarketVolumes,
    window::Window,
};
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use rust_decimal::Decimal;
use smol_str::SmolStr;
use std::{
    collections::{HashMap, VecDeque},
    sync::Mutex,
};

pub fn utc(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

pub fn fill(time: DateTime<Utc>, market: &str, price: Decimal, size: Decimal) -> Fill {
    Fill {
        time,
        market: SmolStr::new(market),
        price,
        size,
        fee: Decimal::ZERO,
        closed_pnl: None,
    }
}

pub fn account() -> Account {
    Account::parse("0x742d35cc6634c0532925a3b844bc9e7595f0beb0").unwrap()
}

/// In-memory [`FillSource`] serving a fixed fill history, with scripted failures.
#[derive(Debug, Default)]
pub struct MockSource {
    pub fills: Vec<Fill>,
    pub volumes: MarketVolumes,
    failures: Mutex<HashMap<Window, VecDeque<FetchError>>>,
    queried: Mutex<Vec<Window>>,
}

impl MockSource {
    pub fn new(fills: Vec<Fill>) -> Self {
        Self {
            fills,
            ..Default::default()
        }
    }

    /// Fail the next query of `window` with `error`.
    pub fn fail_once(self, window: Window, error: FetchError) -> Self {
        self.failures
            .lock()
            .unwrap()
            .entry(window)
            .or_default()
            .push_back(error);
        self
    }

    pub fn queried(&self) -> Vec<Window> {
        self.queried.lock().unwrap().clone()
    }
}

#[async_trait]
impl FillSource for MockSource {
    async fn fills_in_window(
        &self,
        _: &Account,
        window: &Window,
    ) -> Result<Vec<Fill>, FetchError> {
        self.queried.lock().unwrap().push(*window);

        if let Some(error) = self
            .failures
            .lock()
            .unwrap()
            .get_mut(window)
            .and_then(VecDeque::pop_front)
        {
            return Err(error);
        }

        Ok(self
            .fills
            .iter()
            .filter(|fill| window.contains(&fill.time))
            .cloned()
            .collect())
    }

    async fn market_volumes(&self, _: &str) -> Result<MarketVolumes, FetchError> {
        Ok(self.volumes.clone())
    }
}

//! Derived statistics over an [`AggregatedHistory`].
//!
//! The [`MetricsEngine`] is a pure function of its input: no formatting,
//! no I/O. Rendering a [`MetricsReport`] is left to the caller.

use crate::aggregate::AggregatedHistory;
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use itertools::Itertools;
use rust_decimal::{Decimal, prelude::ToPrimitive};
use serde::{Serialize, Serializer};
use smol_str::SmolStr;
use std::collections::BTreeMap;

/// Tier and consistency classifications.
pub mod tier;

pub use tier::{ConsistencyRating, EligibilityTier, TierTable, TierThreshold};

/// Calendar month in UTC, ordered chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    pub fn of(time: &DateTime<Utc>) -> Self {
        Self::new(time.year(), time.month())
    }
}

impl std::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

/// Volume subtotal of one market.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AssetBreakdown {
    pub volume: Decimal,
    pub trades: usize,
    /// Share of the account's total volume, in percent.
    pub share_pct: f64,
}

/// Statistics derived from one account's [`AggregatedHistory`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsReport {
    pub total_volume: Decimal,
    pub trade_count: usize,
    pub avg_trade_size: Decimal,
    pub assets: BTreeMap<SmolStr, AssetBreakdown>,
    pub monthly: BTreeMap<YearMonth, Decimal>,
    pub daily: BTreeMap<NaiveDate, Decimal>,
    pub days_active: usize,
    pub months_active: usize,
    /// Inclusive UTC calendar-day span between the first and last fill.
    pub total_period_days: usize,
    pub consistency_pct: f64,
    pub consistency: ConsistencyRating,
    pub avg_daily_volume: Decimal,
    pub first_trade: Option<DateTime<Utc>>,
    pub last_trade: Option<DateTime<Utc>>,
    pub total_fees: Decimal,
    pub realized_pnl: Decimal,
    pub tier: EligibilityTier,
}

impl MetricsReport {
    /// No fill matched the tracked namespace.
    pub fn is_empty(&self) -> bool {
        self.trade_count == 0
    }

    /// Monthly volumes, oldest month first.
    pub fn monthly_ascending(&self) -> impl DoubleEndedIterator<Item = (YearMonth, Decimal)> + '_ {
        self.monthly.iter().map(|(month, volume)| (*month, *volume))
    }

    /// Monthly volumes, most recent month first.
    pub fn monthly_descending(&self) -> impl Iterator<Item = (YearMonth, Decimal)> + '_ {
        self.monthly_ascending().rev()
    }

    /// Per-asset subtotals, largest volume first.
    pub fn assets_by_volume(&self) -> Vec<(&SmolStr, &AssetBreakdown)> {
        self.assets
            .iter()
            .sorted_by(|(a_market, a), (b_market, b)| {
                b.volume.cmp(&a.volume).then_with(|| a_market.cmp(b_market))
            })
            .collect()
    }
}

/// Percentage `part / whole * 100`, zero when `whole` is zero.
pub fn percentage(part: Decimal, whole: Decimal) -> f64 {
    part.checked_div(whole)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .and_then(|pct| pct.to_f64())
        .unwrap_or(0.0)
}

/// Computes a [`MetricsReport`] from an [`AggregatedHistory`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MetricsEngine {
    tiers: TierTable,
}

impl MetricsEngine {
    pub fn new(tiers: TierTable) -> Self {
        Self { tiers }
    }

    pub fn tiers(&self) -> &TierTable {
        &self.tiers
    }

    pub fn compute(&self, history: &AggregatedHistory) -> MetricsReport {
        let mut total_volume = Decimal::ZERO;
        let mut total_fees = Decimal::ZERO;
        let mut realized_pnl = Decimal::ZERO;
        let mut assets = BTreeMap::<SmolStr, AssetBreakdown>::new();
        let mut monthly = BTreeMap::<YearMonth, Decimal>::new();
        let mut daily = BTreeMap::<NaiveDate, Decimal>::new();

        for fill in history.fills() {
            let notional = fill.notional();
            total_volume += notional;
            total_fees += fill.fee;
            realized_pnl += fill.closed_pnl.unwrap_or_default();

            let asset = assets
                .entry(fill.market.clone())
                .or_insert(AssetBreakdown {
                    volume: Decimal::ZERO,
                    trades: 0,
                    share_pct: 0.0,
                });
            asset.volume += notional;
            asset.trades += 1;

            *monthly.entry(YearMonth::of(&fill.time)).or_default() += notional;
            *daily.entry(fill.date()).or_default() += notional;
        }

        for asset in assets.values_mut() {
            asset.share_pct = percentage(asset.volume, total_volume);
        }

        let trade_count = history.len();
        let days_active = daily.len();
        let first_trade = history.first().map(|fill| fill.time);
        let last_trade = history.last().map(|fill| fill.time);

        let total_period_days = match (first_trade, last_trade) {
            (Some(first), Some(last)) => {
                let span = last.date_naive() - first.date_naive();
                usize::try_from(span.num_days()).unwrap_or(0) + 1
            }
            _ => 0,
        };

        let consistency_pct = if total_period_days == 0 {
            0.0
        } else {
            days_active as f64 / total_period_days as f64 * 100.0
        };

        MetricsReport {
            avg_trade_size: average(total_volume, trade_count),
            avg_daily_volume: average(total_volume, days_active),
            tier: self.tiers.classify(total_volume, days_active),
            consistency: ConsistencyRating::classify(consistency_pct),
            total_volume,
            trade_count,
            months_active: monthly.len(),
            assets,
            monthly,
            daily,
            days_active,
            total_period_days,
            consistency_pct,
            first_trade,
            last_trade,
            total_fees,
            realized_pnl,
        }
    }
}

fn average(total: Decimal, count: usize) -> Decimal {
    if count == 0 {
        Decimal::ZERO
    } else {
        total / Decimal::from(count)
    }
}

//! Short-term comparison of an account's volume with whole-market 24h volume.

use crate::metrics::{MetricsReport, percentage};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;
use std::collections::BTreeMap;

/// Point-in-time 24h notional volume per listed market.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MarketVolumes(BTreeMap<SmolStr, Decimal>);

impl MarketVolumes {
    pub fn get(&self, market: &str) -> Option<Decimal> {
        self.0.get(market).copied()
    }

    pub fn total(&self) -> Decimal {
        self.0.values().copied().sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, &Decimal)> {
        self.0.iter()
    }
}

impl FromIterator<(SmolStr, Decimal)> for MarketVolumes {
    fn from_iter<Iter: IntoIterator<Item = (SmolStr, Decimal)>>(iter: Iter) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Coarse standing derived from an account's share of market volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareRank {
    Top1Pct,
    Top5Pct,
    Top10Pct,
    ActiveTrader,
}

impl ShareRank {
    pub const TOP_1_SHARE_PCT: f64 = 1.0;
    pub const TOP_5_SHARE_PCT: f64 = 0.2;
    pub const TOP_10_SHARE_PCT: f64 = 0.1;

    pub fn classify(share_pct: f64) -> Self {
        if share_pct >= Self::TOP_1_SHARE_PCT {
            Self::Top1Pct
        } else if share_pct >= Self::TOP_5_SHARE_PCT {
            Self::Top5Pct
        } else if share_pct >= Self::TOP_10_SHARE_PCT {
            Self::Top10Pct
        } else {
            Self::ActiveTrader
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Top1Pct => "Top 1%",
            Self::Top5Pct => "Top 5%",
            Self::Top10Pct => "Top 10%",
            Self::ActiveTrader => "Active Trader",
        }
    }
}

impl std::fmt::Display for ShareRank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account volume against market volume for one market.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssetComparison {
    pub market: SmolStr,
    pub account_volume: Decimal,
    pub account_trades: usize,
    pub market_volume: Decimal,
    pub share_pct: f64,
}

/// Account activity measured against the whole namespace's 24h volume.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketComparison {
    pub account_volume: Decimal,
    pub market_volume: Decimal,
    pub share_pct: f64,
    pub rank: ShareRank,
    /// Traded markets, largest account volume first.
    pub assets: Vec<AssetComparison>,
    /// Listed markets the account did not trade.
    pub untraded: Vec<SmolStr>,
}

impl MarketComparison {
    pub fn new(metrics: &MetricsReport, volumes: &MarketVolumes) -> Self {
        let market_volume = volumes.total();
        let share_pct = percentage(metrics.total_volume, market_volume);

        let assets = metrics
            .assets_by_volume()
            .into_iter()
            .map(|(market, asset)| {
                let market_volume = volumes.get(market).unwrap_or_default();
                AssetComparison {
                    market: market.clone(),
                    account_volume: asset.volume,
                    account_trades: asset.trades,
                    market_volume,
                    share_pct: percentage(asset.volume, market_volume),
                }
            })
            .collect();

        let untraded = volumes
            .iter()
            .filter(|(market, _)| !metrics.assets.contains_key(*market))
            .map(|(market, _)| market.clone())
            .collect();

        Self {
            account_volume: metrics.total_volume,
            market_volume,
            share_pct,
            rank: ShareRank::classify(share_pct),
            assets,
            untraded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        aggregate::AggregatedHistory,
        metrics::MetricsEngine,
        test_utils::{fill, utc},
    };
    use rust_decimal_macros::dec;

    fn volumes() -> MarketVolumes {
        [
            (SmolStr::new("xyz:TSLA"), dec!(400000)),
            (SmolStr::new("xyz:NVDA"), dec!(100000)),
            (SmolStr::new("xyz:GOLD"), dec!(500000)),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_market_comparison() {
        let history = AggregatedHistory::from_windows(
            "xyz:",
            vec![vec![
                fill(utc(2025, 5, 1), "xyz:TSLA", dec!(400), dec!(5)),
                fill(utc(2025, 5, 1), "xyz:NVDA", dec!(100), dec!(-10)),
                fill(utc(2025, 5, 1), "xyz:NEW", dec!(10), dec!(1)),
            ]],
        );
        let metrics = MetricsEngine::default().compute(&history);

        let comparison = MarketComparison::new(&metrics, &volumes());

        assert_eq!(comparison.market_volume, dec!(1000000));
        assert_eq!(comparison.account_volume, dec!(3010));
        assert!((comparison.share_pct - 0.301).abs() < 1e-9);
        assert_eq!(comparison.rank, ShareRank::Top5Pct);
        assert_eq!(comparison.untraded, vec![SmolStr::new("xyz:GOLD")]);

        assert_eq!(comparison.assets[0].market, "xyz:TSLA");
        assert!((comparison.assets[0].share_pct - 0.5).abs() < 1e-9);
        assert_eq!(comparison.assets[1].market, "xyz:NVDA");
        assert!((comparison.assets[1].share_pct - 1.0).abs() < 1e-9);

        // Market without a reported volume has zero share
        assert_eq!(comparison.assets[2].market, "xyz:NEW");
        assert_eq!(comparison.assets[2].share_pct, 0.0);
    }

    #[test]
    fn test_share_rank_classify() {
        struct TestCase {
            input: f64,
            expected: ShareRank,
        }

        let tests = vec![
            TestCase {
                // TC0
                input: 1.5,
                expected: ShareRank::Top1Pct,
            },
            TestCase {
                // TC1
                input: 0.2,
                expected: ShareRank::Top5Pct,
            },
            TestCase {
                // TC2
                input: 0.15,
                expected: ShareRank::Top10Pct,
            },
            TestCase {
                // TC3
                input: 0.0,
                expected: ShareRank::ActiveTrader,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = ShareRank::classify(test.input);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_market_volumes_total() {
        assert_eq!(volumes().total(), dec!(1000000));
        assert_eq!(MarketVolumes::default().total(), Decimal::ZERO);
    }
}

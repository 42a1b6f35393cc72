//! Heuristic activity classifications.
//!
//! None of these cut-offs come from a published rewards program; they are
//! rough estimates kept as overridable values.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Ordinal activity tier, 1 (highest) through 5 (lowest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityTier {
    Whale,
    PowerUser,
    ActiveTrader,
    RegularTrader,
    SmallTrader,
}

impl EligibilityTier {
    /// Every tier, most favourable first.
    pub const ALL: [Self; 5] = [
        Self::Whale,
        Self::PowerUser,
        Self::ActiveTrader,
        Self::RegularTrader,
        Self::SmallTrader,
    ];

    pub fn ordinal(&self) -> u8 {
        match self {
            Self::Whale => 1,
            Self::PowerUser => 2,
            Self::ActiveTrader => 3,
            Self::RegularTrader => 4,
            Self::SmallTrader => 5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Whale => "Whale",
            Self::PowerUser => "Power User",
            Self::ActiveTrader => "Active Trader",
            Self::RegularTrader => "Regular Trader",
            Self::SmallTrader => "Small Trader",
        }
    }

    pub fn likelihood(&self) -> &'static str {
        match self {
            Self::Whale => "Very High Likelihood",
            Self::PowerUser => "High Likelihood",
            Self::ActiveTrader => "Good Likelihood",
            Self::RegularTrader => "Moderate Likelihood",
            Self::SmallTrader => "Low Likelihood",
        }
    }
}

impl std::fmt::Display for EligibilityTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TIER {} - {}", self.ordinal(), self.as_str())
    }
}

/// Minimum total volume AND minimum active days required for a tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TierThreshold {
    pub min_volume: Decimal,
    pub min_days_active: usize,
}

impl TierThreshold {
    pub fn new(min_volume: Decimal, min_days_active: usize) -> Self {
        Self {
            min_volume,
            min_days_active,
        }
    }

    pub fn is_met(&self, volume: Decimal, days_active: usize) -> bool {
        volume >= self.min_volume && days_active >= self.min_days_active
    }
}

/// Thresholds of tiers 1 through 5, in that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TierTable {
    pub tiers: [TierThreshold; 5],
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            tiers: [
                TierThreshold::new(Decimal::from(10_000_000), 60),
                TierThreshold::new(Decimal::from(1_000_000), 30),
                TierThreshold::new(Decimal::from(100_000), 14),
                TierThreshold::new(Decimal::from(10_000), 7),
                TierThreshold::new(Decimal::ZERO, 0),
            ],
        }
    }
}

impl TierTable {
    /// First tier, most favourable first, whose thresholds are both met.
    ///
    /// Falls back to [`EligibilityTier::SmallTrader`] when none is.
    pub fn classify(&self, volume: Decimal, days_active: usize) -> EligibilityTier {
        EligibilityTier::ALL
            .into_iter()
            .zip(self.tiers.iter())
            .find(|(_, threshold)| threshold.is_met(volume, days_active))
            .map_or(EligibilityTier::SmallTrader, |(tier, _)| tier)
    }

    pub fn threshold(&self, tier: EligibilityTier) -> &TierThreshold {
        &self.tiers[usize::from(tier.ordinal() - 1)]
    }
}

/// Qualitative reading of the active-day consistency percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsistencyRating {
    Excellent,
    Good,
    Moderate,
    Low,
}

impl ConsistencyRating {
    pub const EXCELLENT_PCT: f64 = 50.0;
    pub const GOOD_PCT: f64 = 25.0;
    pub const MODERATE_PCT: f64 = 10.0;

    pub fn classify(consistency_pct: f64) -> Self {
        if consistency_pct >= Self::EXCELLENT_PCT {
            Self::Excellent
        } else if consistency_pct >= Self::GOOD_PCT {
            Self::Good
        } else if consistency_pct >= Self::MODERATE_PCT {
            Self::Moderate
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Excellent => "EXCELLENT - Very active trader",
            Self::Good => "GOOD - Regular trader",
            Self::Moderate => "MODERATE - Occasional trader",
            Self::Low => "LOW - Sporadic trading",
        }
    }
}

impl std::fmt::Display for ConsistencyRating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_tier_table_classify() {
        struct TestCase {
            volume: Decimal,
            days_active: usize,
            expected: EligibilityTier,
        }

        let tests = vec![
            TestCase {
                // TC0: both tier 1 thresholds met
                volume: dec!(10000000),
                days_active: 60,
                expected: EligibilityTier::Whale,
            },
            TestCase {
                // TC1: tier 1 volume without tier 1 days falls to tier 2
                volume: dec!(50000000),
                days_active: 45,
                expected: EligibilityTier::PowerUser,
            },
            TestCase {
                // TC2: tier 3
                volume: dec!(250000),
                days_active: 14,
                expected: EligibilityTier::ActiveTrader,
            },
            TestCase {
                // TC3: tier 4 boundary
                volume: dec!(10000),
                days_active: 7,
                expected: EligibilityTier::RegularTrader,
            },
            TestCase {
                // TC4: just under tier 4 volume
                volume: dec!(9999.99),
                days_active: 100,
                expected: EligibilityTier::SmallTrader,
            },
            TestCase {
                // TC5: no activity
                volume: Decimal::ZERO,
                days_active: 0,
                expected: EligibilityTier::SmallTrader,
            },
        ];

        let table = TierTable::default();
        for (index, test) in tests.into_iter().enumerate() {
            let actual = table.classify(test.volume, test.days_active);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_tier_table_overridden() {
        let mut table = TierTable::default();
        table.tiers[3] = TierThreshold::new(dec!(500), 1);

        assert_eq!(table.classify(dec!(600), 1), EligibilityTier::RegularTrader);
        assert_eq!(table.threshold(EligibilityTier::RegularTrader).min_volume, dec!(500));
    }

    #[test]
    fn test_tier_table_deserialise() {
        let input = r#"
            {
                "tiers": [
                    {"min_volume": "5000000", "min_days_active": 90},
                    {"min_volume": "500000", "min_days_active": 45},
                    {"min_volume": "50000", "min_days_active": 20},
                    {"min_volume": "5000", "min_days_active": 5},
                    {"min_volume": "0", "min_days_active": 0}
                ]
            }
        "#;

        let table = serde_json::from_str::<TierTable>(input).unwrap();
        assert_eq!(table.tiers[0], TierThreshold::new(dec!(5000000), 90));
        assert_eq!(table.classify(dec!(6000), 5), EligibilityTier::RegularTrader);
    }

    #[test]
    fn test_tier_ordinals_and_display() {
        let ordinals = EligibilityTier::ALL.map(|tier| tier.ordinal());
        assert_eq!(ordinals, [1, 2, 3, 4, 5]);
        assert_eq!(
            EligibilityTier::ActiveTrader.to_string(),
            "TIER 3 - Active Trader"
        );
    }

    #[test]
    fn test_consistency_rating_classify() {
        assert_eq!(ConsistencyRating::classify(100.0), ConsistencyRating::Excellent);
        assert_eq!(ConsistencyRating::classify(50.0), ConsistencyRating::Excellent);
        assert_eq!(ConsistencyRating::classify(30.0), ConsistencyRating::Good);
        assert_eq!(ConsistencyRating::classify(13.3), ConsistencyRating::Moderate);
        assert_eq!(ConsistencyRating::classify(0.0), ConsistencyRating::Low);
    }
}

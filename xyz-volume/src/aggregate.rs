use crate::fill::{Fill, FillId};
use fnv::FnvHashSet;
use serde::Serialize;
use smol_str::SmolStr;
use tracing::debug;

/// Default market namespace tracked.
pub const DEFAULT_MARKET_PREFIX: &str = "xyz:";

/// Deduplicated fill history of one account, ascending by execution time.
///
/// Holds no two fills with the same [`FillId`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AggregatedHistory {
    fills: Vec<Fill>,
}

impl AggregatedHistory {
    pub fn fills(&self) -> &[Fill] {
        &self.fills
    }

    pub fn len(&self) -> usize {
        self.fills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }

    pub fn first(&self) -> Option<&Fill> {
        self.fills.first()
    }

    pub fn last(&self) -> Option<&Fill> {
        self.fills.last()
    }

    pub fn into_fills(self) -> Vec<Fill> {
        self.fills
    }
}

/// Merges per-window fill lists into an [`AggregatedHistory`].
///
/// Only fills whose market starts with the namespace prefix are kept. Pushing
/// the same window twice, eg/ after a retry, does not double count.
#[derive(Debug, Clone)]
pub struct FillAggregator {
    prefix: SmolStr,
    seen: FnvHashSet<FillId>,
    fills: Vec<Fill>,
    duplicates: usize,
    filtered: usize,
}

impl FillAggregator {
    pub fn new(prefix: impl Into<SmolStr>) -> Self {
        Self {
            prefix: prefix.into(),
            seen: FnvHashSet::default(),
            fills: Vec::new(),
            duplicates: 0,
            filtered: 0,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Merge the fills of one window.
    pub fn push<Iter>(&mut self, fills: Iter)
    where
        Iter: IntoIterator<Item = Fill>,
    {
        for fill in fills {
            if !fill.in_namespace(&self.prefix) {
                self.filtered += 1;
                continue;
            }

            if self.seen.insert(fill.id()) {
                self.fills.push(fill);
            } else {
                self.duplicates += 1;
            }
        }
    }

    /// Number of distinct fills kept so far.
    pub fn len(&self) -> usize {
        self.fills.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fills.is_empty()
    }

    /// Sort the merged fills chronologically.
    ///
    /// Ties on time are ordered by market, price and size so the result does
    /// not depend on the order windows arrived in.
    pub fn finish(self) -> AggregatedHistory {
        let Self {
            mut fills,
            duplicates,
            filtered,
            prefix,
            ..
        } = self;

        fills.sort_unstable_by(|a, b| {
            a.time
                .cmp(&b.time)
                .then_with(|| a.market.cmp(&b.market))
                .then_with(|| a.price.cmp(&b.price))
                .then_with(|| a.size.cmp(&b.size))
        });

        debug!(
            %prefix,
            kept = fills.len(),
            duplicates,
            filtered,
            "aggregated fill history"
        );

        AggregatedHistory { fills }
    }
}

impl AggregatedHistory {
    /// Aggregate `windows` in one pass, see [`FillAggregator`].
    pub fn from_windows<Windows, Fills>(prefix: &str, windows: Windows) -> Self
    where
        Windows: IntoIterator<Item = Fills>,
        Fills: IntoIterator<Item = Fill>,
    {
        let mut aggregator = FillAggregator::new(prefix);
        for fills in windows {
            aggregator.push(fills);
        }
        aggregator.finish()
    }
}

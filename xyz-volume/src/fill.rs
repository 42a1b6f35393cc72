use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// Epoch values below this are interpreted as seconds, otherwise milliseconds.
///
/// `10^11` seconds lies in the year 5138 while `10^11` milliseconds lies in 1973.
pub const EPOCH_SECONDS_CUTOFF: i64 = 100_000_000_000;

/// Normalised executed trade for one account.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Fill {
    /// Execution time.
    pub time: DateTime<Utc>,
    /// Namespaced market symbol, eg/ "xyz:TSLA".
    pub market: SmolStr,
    /// Execution price.
    pub price: Decimal,
    /// Signed execution size: positive for buys, negative for sells.
    pub size: Decimal,
    /// Fee paid, negative for rebates.
    pub fee: Decimal,
    /// Realized profit and loss, when the upstream reports it.
    pub closed_pnl: Option<Decimal>,
}

impl Fill {
    /// Notional value `price * |size|`.
    pub fn notional(&self) -> Decimal {
        self.price * self.size.abs()
    }

    /// UTC calendar date of the execution.
    pub fn date(&self) -> NaiveDate {
        self.time.date_naive()
    }

    pub fn id(&self) -> FillId {
        FillId {
            time_ms: self.time.timestamp_millis(),
            market: self.market.clone(),
            price: self.price,
            size: self.size,
        }
    }

    pub fn in_namespace(&self, prefix: &str) -> bool {
        self.market.starts_with(prefix)
    }
}

/// Identity used to recognise the same [`Fill`] fetched more than once.
///
/// [`Decimal`] hashes by value, so `10` and `10.0` are the same size.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FillId {
    pub time_ms: i64,
    pub market: SmolStr,
    pub price: Decimal,
    pub size: Decimal,
}

/// Convert an epoch timestamp of second or millisecond precision into a [`DateTime<Utc>`].
pub fn datetime_utc_from_epoch(value: i64) -> Option<DateTime<Utc>> {
    if value.abs() < EPOCH_SECONDS_CUTOFF {
        DateTime::from_timestamp(value, 0)
    } else {
        DateTime::from_timestamp_millis(value)
    }
}

/// Deserialize an epoch timestamp of second or millisecond precision as a [`DateTime<Utc>`].
pub fn de_epoch_as_datetime_utc<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: serde::de::Deserializer<'de>,
{
    let value = i64::deserialize(deserializer)?;
    datetime_utc_from_epoch(value)
        .ok_or_else(|| serde::de::Error::custom(format!("epoch timestamp out of range: {value}")))
}

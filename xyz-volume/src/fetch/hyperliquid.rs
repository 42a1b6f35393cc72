use super::FillSource;
use crate::{
    account::Account,
    error::FetchError,
    fill::{Fill, de_epoch_as_datetime_utc},
    market::MarketVolumes,
    window::Window,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use smol_str::SmolStr;
use std::time::Duration;
use tracing::debug;
use url::Url;

/// Public Hyperliquid info endpoint.
pub const DEFAULT_INFO_URL: &str = "https://api.hyperliquid.xyz/info";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// [`FillSource`] backed by the Hyperliquid `POST /info` endpoint.
#[derive(Debug, Clone)]
pub struct HyperliquidClient {
    http: reqwest::Client,
    info_url: Url,
    timeout: Duration,
}

impl HyperliquidClient {
    pub fn new(info_url: Url, timeout: Duration) -> Self {
        Self {
            http: reqwest::Client::new(),
            info_url,
            timeout,
        }
    }

    async fn post<Request, Response>(&self, request: &Request) -> Result<Response, FetchError>
    where
        Request: Serialize + Sync,
        Response: DeserializeOwned,
    {
        let response = self
            .http
            .post(self.info_url.clone())
            .timeout(self.timeout)
            .json(request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(FetchError::from)
    }
}

#[async_trait]
impl FillSource for HyperliquidClient {
    async fn fills_in_window(
        &self,
        account: &Account,
        window: &Window,
    ) -> Result<Vec<Fill>, FetchError> {
        let request = InfoRequest::UserFillsByTime {
            user: account.as_str(),
            start_time: window.start_ms(),
            // Upstream end bound is inclusive
            end_time: window.end_ms() - 1,
        };

        let fills = self.post::<_, Vec<HyperliquidFill>>(&request).await?;
        debug!(%window, fills = fills.len(), "received userFillsByTime response");

        Ok(fills.into_iter().map(Fill::from).collect())
    }

    async fn market_volumes(&self, dex: &str) -> Result<MarketVolumes, FetchError> {
        let request = InfoRequest::MetaAndAssetCtxs { dex };
        let (meta, contexts) = self
            .post::<_, (HyperliquidMeta, Vec<HyperliquidAssetCtx>)>(&request)
            .await?;

        Ok(market_volumes_from_meta(meta, contexts))
    }
}

/// Request bodies of the info endpoint used by this crate.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum InfoRequest<'a> {
    #[serde(rename_all = "camelCase")]
    UserFillsByTime {
        user: &'a str,
        start_time: i64,
        end_time: i64,
    },
    MetaAndAssetCtxs {
        dex: &'a str,
    },
}

/// Hyperliquid fill side: `B` bid (buy), `A` ask (sell).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum HyperliquidSide {
    #[serde(rename = "B")]
    Bid,
    #[serde(rename = "A")]
    Ask,
}

/// ### Raw Payload Examples
/// See docs: <https://hyperliquid.gitbook.io/hyperliquid-docs/for-developers/api/info-endpoint>
///```json
/// {
///     "coin": "xyz:TSLA",
///     "px": "431.25",
///     "sz": "2.5",
///     "side": "B",
///     "time": 1733011200000,
///     "startPosition": "0.0",
///     "dir": "Open Long",
///     "closedPnl": "0.0",
///     "hash": "0x0000000000000000000000000000000000000000000000000000000000000000",
///     "oid": 1234567,
///     "crossed": true,
///     "fee": "0.431",
///     "tid": 987654321,
///     "feeToken": "USDC"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HyperliquidFill {
    pub coin: SmolStr,
    #[serde(with = "rust_decimal::serde::str")]
    pub px: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub sz: Decimal,
    pub side: HyperliquidSide,
    #[serde(deserialize_with = "de_epoch_as_datetime_utc")]
    pub time: DateTime<Utc>,
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub fee: Option<Decimal>,
    #[serde(default, rename = "closedPnl", with = "rust_decimal::serde::str_option")]
    pub closed_pnl: Option<Decimal>,
}

impl From<HyperliquidFill> for Fill {
    fn from(fill: HyperliquidFill) -> Self {
        let magnitude = fill.sz.abs();
        let size = match fill.side {
            HyperliquidSide::Bid => magnitude,
            HyperliquidSide::Ask => -magnitude,
        };

        Self {
            time: fill.time,
            market: fill.coin,
            price: fill.px,
            size,
            fee: fill.fee.unwrap_or_default(),
            closed_pnl: fill.closed_pnl,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HyperliquidMeta {
    #[serde(default)]
    pub universe: Vec<HyperliquidAsset>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HyperliquidAsset {
    pub name: SmolStr,
    #[serde(default)]
    pub is_delisted: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HyperliquidAssetCtx {
    #[serde(default, with = "rust_decimal::serde::str_option")]
    pub day_ntl_vlm: Option<Decimal>,
}

/// Pair `universe` entries with their positional asset contexts, skipping delisted markets.
pub fn market_volumes_from_meta(
    meta: HyperliquidMeta,
    contexts: Vec<HyperliquidAssetCtx>,
) -> MarketVolumes {
    meta.universe
        .into_iter()
        .zip(contexts)
        .filter(|(asset, _)| !asset.is_delisted)
        .map(|(asset, ctx)| (asset.name, ctx.day_ntl_vlm.unwrap_or_default()))
        .collect()
}

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::str::FromStr;

use super::traits::MarketDataProvider;
use crate::config::GatewayConfig;
use crate::errors::{CoreError, RemoteError};
use crate::models::coin::{CoinCandidate, CoinInfo};

const API_KEY_HEADER: &str = "x-cg-demo-api-key";

/// CoinGecko v3 market data provider.
///
/// - **Free tier**: works without a key; a demo key raises rate limits.
/// - **Endpoints**: `/search`, `/coins/{id}`, `/simple/price`
///
/// CoinGecko ids are lowercase slugs like "bitcoin" or "usd-coin".
pub struct CoinGeckoProvider {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoProvider {
    pub fn new(config: &GatewayConfig) -> Result<Self, CoreError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| CoreError::Config(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self::with_client(client, config))
    }

    /// Use a caller-supplied client (shared connection pool, proxies, ...).
    pub fn with_client(client: Client, config: &GatewayConfig) -> Self {
        Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> RequestBuilder {
        let request = self.client.get(format!("{}{path}", self.base_url));
        match &self.api_key {
            Some(key) => request.header(API_KEY_HEADER, key),
            None => request,
        }
    }
}

// ── CoinGecko API response types ────────────────────────────────────

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    coins: Vec<SearchEntry>,
}

#[derive(Deserialize)]
struct SearchEntry {
    id: String,
    symbol: String,
    name: String,
    #[serde(default)]
    thumb: Option<String>,
    #[serde(default)]
    market_cap_rank: Option<u32>,
}

#[derive(Deserialize)]
struct CoinResponse {
    id: String,
    #[serde(default)]
    symbol: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    image: Option<ImageLinks>,
    #[serde(default)]
    market_data: Option<MarketData>,
}

#[derive(Deserialize)]
struct ImageLinks {
    #[serde(default)]
    small: Option<String>,
}

#[derive(Deserialize)]
struct MarketData {
    #[serde(default)]
    current_price: HashMap<String, Value>,
}

/// `/simple/price` reply: `{"bitcoin": {"usd": 67000.5}, ...}`
type SimplePriceResponse = HashMap<String, HashMap<String, Value>>;

/// Convert a JSON price into a `Decimal` through its textual form, so that
/// `0.1` stays `0.1` instead of picking up binary float noise.
/// Negative, non-numeric and out-of-range values yield `None`.
pub fn parse_price(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.trim().to_string(),
        _ => return None,
    };
    let price = Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()?;
    (price >= Decimal::ZERO).then(|| price.normalize())
}

#[async_trait]
impl MarketDataProvider for CoinGeckoProvider {
    fn name(&self) -> &str {
        "CoinGecko"
    }

    async fn search(&self, query: &str) -> Result<Vec<CoinCandidate>, CoreError> {
        let resp: SearchResponse = self
            .get("/search")
            .query(&[("query", query)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp
            .coins
            .into_iter()
            .map(|c| CoinCandidate {
                id: c.id,
                symbol: c.symbol.to_uppercase(),
                name: c.name,
                thumb: c.thumb.filter(|t| !t.is_empty()),
                market_cap_rank: c.market_cap_rank,
            })
            .collect())
    }

    async fn coin_info(&self, id: &str) -> Result<Option<CoinInfo>, CoreError> {
        let resp = self
            .get(&format!("/coins/{id}"))
            .query(&[
                ("localization", "false"),
                ("tickers", "false"),
                ("community_data", "false"),
                ("developer_data", "false"),
            ])
            .send()
            .await?;

        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let coin: CoinResponse = resp.error_for_status()?.json().await?;

        if coin.symbol.is_empty() && coin.name.is_empty() {
            return Err(CoreError::Remote(RemoteError::malformed(format!(
                "CoinGecko returned no symbol or name for '{id}'"
            ))));
        }

        let current_price = coin
            .market_data
            .as_ref()
            .and_then(|m| m.current_price.get("usd"))
            .and_then(parse_price);

        Ok(Some(CoinInfo {
            id: coin.id,
            symbol: coin.symbol.to_uppercase(),
            name: coin.name,
            image_url: coin.image.and_then(|i| i.small),
            current_price,
        }))
    }

    async fn simple_prices(&self, ids: &[String]) -> Result<HashMap<String, Decimal>, CoreError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let joined = ids.join(",");
        let resp: SimplePriceResponse = self
            .get("/simple/price")
            .query(&[("ids", joined.as_str()), ("vs_currencies", "usd")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(resp
            .into_iter()
            .filter_map(|(id, quotes)| {
                let price = quotes.get("usd").and_then(parse_price)?;
                Some((id, price))
            })
            .collect())
    }
}
